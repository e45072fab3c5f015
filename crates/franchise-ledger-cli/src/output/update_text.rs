use std::io;

use serde_json::Value;

use super::format::{self, Column, get_array, get_f64, get_str, money, yes_no};

pub fn render_order_created(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_str(data, "sales_invoice_no", "order create")?;
    let mut lines = vec![format!("Order {sales_invoice_no} created."), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Order ID:", or_dash(get_str(data, "order_id"))),
            ("Brand:", or_dash(get_str(data, "brand"))),
            ("Order date:", or_dash(get_str(data, "order_date"))),
            ("Stage:", get_str(data, "stage").to_string()),
            ("Total:", money(get_f64(data, "order_total"))),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_stage_update(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_str(data, "sales_invoice_no", "order stage")?;
    Ok(format!(
        "Order {sales_invoice_no} moved from `{}` to `{}`.",
        get_str(data, "previous_stage"),
        get_str(data, "stage")
    ))
}

pub fn render_partner_paid(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_str(data, "sales_invoice_no", "order paid")?;
    let mut lines = vec![format!("Order {sales_invoice_no} marked as partner paid.")];
    let mut entries = Vec::new();
    for (label, key) in [
        ("Paid date:", "paid_date"),
        ("Method:", "payment_method"),
        ("Reference:", "payment_ref"),
    ] {
        let value = get_str(data, key);
        if !value.is_empty() {
            entries.push((label, value.to_string()));
        }
    }
    if !entries.is_empty() {
        lines.push(String::new());
        lines.extend(format::key_value_rows(&entries, 2));
    }
    Ok(lines.join("\n"))
}

pub fn render_invoices_recorded(data: &Value) -> io::Result<String> {
    let sales_invoice_no = require_str(data, "sales_invoice_no", "invoice record")?;
    let invoices = get_array(data, "invoices");
    let allocations = get_array(data, "allocations");
    let mut lines = vec![
        format!(
            "Recorded {} supplier invoice(s) and {} allocation(s) for {sales_invoice_no}.",
            invoices.len(),
            allocations.len()
        ),
        String::new(),
    ];

    let rows = invoices
        .iter()
        .map(|invoice| {
            let invoice_no = get_str(invoice, "invoice_no");
            let allocated = allocations
                .iter()
                .filter(|allocation| get_str(allocation, "supplier_invoice_no") == invoice_no)
                .map(|allocation| get_f64(allocation, "allocated_amount"))
                .sum::<f64>();
            vec![
                invoice_no.to_string(),
                get_str(invoice, "supplier").to_string(),
                money(get_f64(invoice, "amount")),
                money(allocated),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table(
        &[
            Column::left("Invoice"),
            Column::left("Supplier"),
            Column::right("Amount"),
            Column::right("Allocated"),
        ],
        &rows,
    ));
    Ok(lines.join("\n"))
}

pub fn render_invoice_update(data: &Value) -> io::Result<String> {
    let invoice_no = require_str(data, "invoice_no", "invoice update")?;
    let fields = get_array(data, "fields_written")
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<&str>>();
    let invoice = data.get("invoice").unwrap_or(&Value::Null);

    let mut lines = vec![
        format!(
            "Supplier invoice {invoice_no} ({}) updated: {}.",
            get_str(data, "supplier"),
            fields.join(", ")
        ),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Amount:", money(get_f64(invoice, "amount"))),
            ("Sales invoice:", or_dash(get_str(invoice, "sales_invoice_no"))),
            ("Paid:", yes_no(invoice.get("paid").and_then(Value::as_bool).unwrap_or(false))),
            ("Paid date:", or_dash(get_str(invoice, "paid_date"))),
            ("Reference:", or_dash(get_str(invoice, "payment_reference"))),
            ("File:", or_dash(get_str(invoice, "file_url"))),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_mapping_added(data: &Value) -> io::Result<String> {
    let mapping = data
        .get("mapping")
        .ok_or_else(|| io::Error::other("mapping add output requires mapping"))?;
    let active = mapping.get("active").and_then(Value::as_bool).unwrap_or(true);
    let mut line = format!(
        "Mapped `{}` to {}",
        get_str(mapping, "location"),
        get_str(mapping, "franchise_code")
    );
    if !active {
        line.push_str(" (inactive)");
    }
    line.push('.');
    Ok([
        line,
        "Run `franchise-ledger sales backfill` to fill codes on earlier sales rows.".to_string(),
    ]
    .join("\n"))
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn require_str<'a>(data: &'a Value, key: &str, command: &str) -> io::Result<&'a str> {
    data.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other(format!("{command} output requires {key}")))
}
