use crate::dates::normalize_import_date;
use crate::import::parse::RawSaleRow;
use crate::records::parse_money;

/// A row that passed validation, with its date already in ISO form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidSale {
    pub(crate) row: usize,
    pub(crate) date: String,
    pub(crate) location: String,
    pub(crate) revenue: f64,
    pub(crate) gross_sales: f64,
    pub(crate) count: f64,
}

/// Returns the cleaned row, or the reason it cannot be imported.
pub(crate) fn validate_row(raw: &RawSaleRow) -> Result<ValidSale, String> {
    let Some(date_text) = present(raw.date.as_deref()) else {
        return Err("date is missing".to_string());
    };
    let Some(date) = normalize_import_date(date_text) else {
        return Err(format!("date `{date_text}` is not a recognised calendar date"));
    };
    let Some(location) = present(raw.location.as_deref()) else {
        return Err("location is missing".to_string());
    };

    let revenue = required_number("revenue", raw.revenue.as_deref())?;
    let count = required_number("count", raw.count.as_deref())?;
    if count < 0.0 {
        return Err(format!("count must not be negative; got {count}"));
    }
    let gross_sales = match present(raw.gross_sales.as_deref()) {
        Some(text) => number("gross_sales", text)?,
        None => revenue,
    };

    Ok(ValidSale {
        row: raw.row,
        date,
        location: location.to_string(),
        revenue,
        gross_sales,
        count,
    })
}

fn required_number(field: &str, value: Option<&str>) -> Result<f64, String> {
    match present(value) {
        Some(text) => number(field, text),
        None => Err(format!("{field} is missing")),
    }
}

fn number(field: &str, text: &str) -> Result<f64, String> {
    parse_money(text).ok_or_else(|| format!("{field} `{text}` is not a finite number"))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::validate_row;
    use crate::import::parse::RawSaleRow;

    fn raw(date: &str, location: &str, revenue: &str, count: &str) -> RawSaleRow {
        RawSaleRow {
            row: 1,
            date: Some(date.to_string()),
            location: Some(location.to_string()),
            revenue: Some(revenue.to_string()),
            gross_sales: None,
            count: Some(count.to_string()),
        }
    }

    #[test]
    fn valid_rows_get_iso_dates_and_default_gross_sales() {
        let validated = validate_row(&raw("03/01/2024", " Main St ", "$120.50", "14"));
        assert!(validated.is_ok());
        if let Ok(sale) = validated {
            assert_eq!(sale.date, "2024-03-01");
            assert_eq!(sale.location, "Main St");
            assert_eq!(sale.revenue, 120.5);
            assert_eq!(sale.gross_sales, 120.5);
            assert_eq!(sale.count, 14.0);
        }
    }

    #[test]
    fn bad_numbers_and_missing_fields_are_reasons_not_panics() {
        assert!(validate_row(&raw("2024-03-01", "Main St", "abc", "14")).is_err());
        assert!(validate_row(&raw("2024-03-01", "Main St", "NaN", "14")).is_err());
        assert!(validate_row(&raw("2024-03-01", "Main St", "10", "-1")).is_err());
        assert!(validate_row(&raw("2024-03-01", "", "10", "1")).is_err());
        assert!(validate_row(&raw("someday", "Main St", "10", "1")).is_err());
        assert!(validate_row(&raw("2024-03-01", "Main St", "", "1")).is_err());
    }
}
