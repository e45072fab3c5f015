use std::io;

use serde_json::Value;

use super::format::{self, Column, get_array, get_f64, get_str, get_u64, money, yes_no};

pub fn render_allocations(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_invoice(data)?;
    let allocations = get_array(data, "allocations");
    if allocations.is_empty() {
        return Ok(format!("No allocations recorded for {sales_invoice_no}."));
    }

    let mut lines = vec![format!("Allocations for {sales_invoice_no}:"), String::new()];
    let rows = allocations
        .iter()
        .map(|row| {
            vec![
                get_str(row, "supplier_invoice_no").to_string(),
                money(get_f64(row, "allocated_amount")),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table(
        &[Column::left("Supplier invoice"), Column::right("Allocated")],
        &rows,
    ));
    lines.push(String::new());
    lines.extend(format::key_value_rows(
        &[
            ("Supplier invoices:", get_array(data, "by_supplier_invoice").len().to_string()),
            ("Total allocated:", money(get_f64(data, "total_allocated"))),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_match(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_invoice(data)?;
    let diagnosis = get_str(data, "diagnosis");
    let mut lines = vec![
        format!("Supplier invoices for {sales_invoice_no}:"),
        format!("  Diagnosis: {}", describe_diagnosis(diagnosis)),
    ];

    let matched = get_array(data, "matched");
    if !matched.is_empty() {
        lines.push(String::new());
        let rows = matched
            .iter()
            .map(|invoice| {
                vec![
                    get_str(invoice, "invoice_no").to_string(),
                    get_str(invoice, "supplier").to_string(),
                    money(get_f64(invoice, "amount")),
                    yes_no(invoice.get("paid").and_then(Value::as_bool).unwrap_or(false)),
                    get_str(invoice, "matched_by").to_string(),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table(
            &[
                Column::left("Invoice"),
                Column::left("Supplier"),
                Column::right("Amount"),
                Column::left("Paid"),
                Column::left("Matched by"),
            ],
            &rows,
        ));
    }

    lines.extend(render_missing(data));
    Ok(lines.join("\n"))
}

pub fn render_summary(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_invoice(data)?;
    let match_path = data
        .get("match_path")
        .and_then(Value::as_str)
        .unwrap_or("none");

    let mut lines = vec![
        format!("Reconciliation for {sales_invoice_no}"),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Match path:", match_path.to_string()),
            ("Diagnosis:", describe_diagnosis(get_str(data, "diagnosis")).to_string()),
            ("Allocated:", money(get_f64(data, "total_allocated"))),
            ("Invoiced:", money(get_f64(data, "total_invoiced"))),
            (
                "Paid:",
                format!(
                    "{} ({} invoices)",
                    money(get_f64(data, "total_paid")),
                    get_u64(data, "paid_count")
                ),
            ),
            (
                "Unpaid:",
                format!(
                    "{} ({} invoices)",
                    money(get_f64(data, "total_unpaid")),
                    get_u64(data, "unpaid_count")
                ),
            ),
        ],
        2,
    ));

    let lines_data = get_array(data, "lines");
    if !lines_data.is_empty() {
        lines.push(String::new());
        let rows = lines_data
            .iter()
            .map(|line| {
                let suppliers = get_array(line, "suppliers")
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<&str>>()
                    .join(", ");
                let invoice_no = match get_str(line, "supplier_invoice_no") {
                    "" => "(blank)",
                    value => value,
                };
                vec![
                    invoice_no.to_string(),
                    suppliers,
                    optional_money(line.get("allocated")),
                    money(get_f64(line, "invoice_amount")),
                    yes_no(line.get("paid").and_then(Value::as_bool).unwrap_or(false)),
                    optional_money(line.get("delta")),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table(
            &[
                Column::left("Invoice"),
                Column::left("Supplier"),
                Column::right("Allocated"),
                Column::right("Amount"),
                Column::left("Paid"),
                Column::right("Delta"),
            ],
            &rows,
        ));
    }

    lines.push(String::new());
    if data.get("discrepancy").and_then(Value::as_bool).unwrap_or(false) {
        lines.push(format!(
            "Discrepancy: allocated and invoiced totals differ by {}.",
            money(get_f64(data, "discrepancy_amount").abs())
        ));
    } else {
        lines.push("No discrepancy between allocated and invoiced totals.".to_string());
    }

    for over in get_array(data, "over_allocated") {
        lines.push(format!(
            "Over-allocated: {} is allocated {} across all orders against an amount of {}.",
            get_str(over, "supplier_invoice_no"),
            money(get_f64(over, "allocated_all_orders")),
            money(get_f64(over, "invoice_amount"))
        ));
    }
    lines.extend(render_missing(data));
    Ok(lines.join("\n"))
}

fn render_missing(data: &Value) -> Vec<String> {
    let missing = get_array(data, "missing_invoice_numbers")
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<&str>>();
    let blank = get_u64(data, "blank_invoice_allocations");
    if missing.is_empty() && blank == 0 {
        return Vec::new();
    }
    let mut lines = vec![String::new()];
    if !missing.is_empty() {
        lines.push(format!("Allocated but not recorded: {}", missing.join(", ")));
    }
    if blank > 0 {
        lines.push(format!("Allocation rows without a supplier invoice number: {blank}"));
    }
    lines
}

fn describe_diagnosis(diagnosis: &str) -> &str {
    match diagnosis {
        "allocated" => "matched through allocations",
        "allocated_invoice_missing" => "allocations reference invoices that are not recorded",
        "direct_link" => "no allocations, matched by sales invoice on the supplier invoice",
        "no_allocations" => "no allocations and no linked supplier invoices",
        other => other,
    }
}

fn optional_money(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_f64)
        .map(money)
        .unwrap_or_else(|| "-".to_string())
}

fn require_invoice(data: &Value) -> io::Result<&str> {
    data.get("sales_invoice_no")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("recon output requires sales_invoice_no"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_allocations, render_summary};

    #[test]
    fn summary_reports_discrepancy_and_totals() {
        let data = json!({
            "sales_invoice_no": "INV-1",
            "match_path": "allocation",
            "diagnosis": "allocated",
            "total_allocated": 450.0,
            "total_invoiced": 500.0,
            "total_paid": 300.0,
            "total_unpaid": 200.0,
            "paid_count": 1,
            "unpaid_count": 1,
            "discrepancy": true,
            "discrepancy_amount": 50.0,
            "lines": [
                {"supplier_invoice_no": "SI-1", "suppliers": ["Fresh Foods"], "invoice_found": true,
                 "allocated": 300.0, "invoice_amount": 300.0, "paid": true, "delta": 0.0}
            ],
            "missing_invoice_numbers": [],
            "over_allocated": []
        });
        let rendered = render_summary(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Reconciliation for INV-1"));
            assert!(text.contains("Match path:  allocation"));
            assert!(text.contains("300.00 (1 invoices)"));
            assert!(text.contains("differ by 50.00"));
            assert!(text.contains("Fresh Foods"));
        }
    }

    #[test]
    fn blank_supplier_invoice_allocations_are_called_out() {
        let data = json!({
            "sales_invoice_no": "INV-2",
            "match_path": "allocation",
            "diagnosis": "allocated_invoice_missing",
            "total_allocated": 399.0,
            "total_invoiced": 300.0,
            "discrepancy": true,
            "discrepancy_amount": 99.0,
            "lines": [
                {"supplier_invoice_no": "", "suppliers": [], "invoice_found": false,
                 "allocated": 99.0, "invoice_amount": 0.0, "paid": false, "delta": 99.0}
            ],
            "missing_invoice_numbers": [],
            "blank_invoice_allocations": 1,
            "over_allocated": []
        });
        let rendered = render_summary(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("(blank)"));
            assert!(text.contains("Allocation rows without a supplier invoice number: 1"));
            assert!(!text.contains("Allocated but not recorded"));
        }
    }

    #[test]
    fn empty_allocations_render_a_single_line() {
        let rendered = render_allocations(&json!({
            "sales_invoice_no": "INV-9",
            "allocations": [],
            "by_supplier_invoice": [],
            "total_allocated": 0.0
        }));
        assert!(matches!(rendered, Ok(text) if text == "No allocations recorded for INV-9."));
    }

    #[test]
    fn missing_invoice_number_is_an_error() {
        assert!(render_summary(&json!({})).is_err());
    }
}
