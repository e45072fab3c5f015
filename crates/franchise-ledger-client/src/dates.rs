use chrono::NaiveDate;

const IMPORT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Strict `YYYY-MM-DD` with a real calendar date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if !looks_like_iso_date(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Accepts the date spellings seen in sales exports and returns ISO form.
pub fn normalize_import_date(value: &str) -> Option<String> {
    let trimmed = value.trim();
    // Spreadsheet exports sometimes carry a midnight timestamp.
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);

    IMPORT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(|date| format_iso_date(&date))
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{normalize_import_date, parse_iso_date};

    #[test]
    fn iso_parse_rejects_loose_spellings_and_impossible_days() {
        assert!(parse_iso_date("2024-01-15").is_some());
        assert!(parse_iso_date("2024-1-15").is_none());
        assert!(parse_iso_date("15/01/2024").is_none());
        assert!(parse_iso_date("2024-02-30").is_none());
        assert!(parse_iso_date(" 2024-01-15").is_none());
    }

    #[test]
    fn import_dates_normalize_to_iso() {
        assert_eq!(normalize_import_date("2024-03-01"), Some("2024-03-01".to_string()));
        assert_eq!(normalize_import_date("03/01/2024"), Some("2024-03-01".to_string()));
        assert_eq!(normalize_import_date("2024/03/01"), Some("2024-03-01".to_string()));
        assert_eq!(normalize_import_date("01.03.2024"), Some("2024-03-01".to_string()));
        assert_eq!(
            normalize_import_date("2024-03-01T00:00:00"),
            Some("2024-03-01".to_string())
        );
        assert_eq!(normalize_import_date("yesterday"), None);
        assert_eq!(normalize_import_date(""), None);
    }
}
