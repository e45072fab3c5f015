//! Typed records for each sheet. Raw rows are converted here once; the rest
//! of the crate never looks at column maps.

use serde::Serialize;
use tracing::warn;

use crate::ClientResult;
use crate::schema::{
    ALLOCATIONS, KITCHEN_MAPPING, KITCHEN_SALES, LoadedSheet, ORDERS, SUPPLIER_INVOICES,
    SheetSchema, col, load_sheet,
};
use crate::store::SheetStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    #[serde(skip)]
    pub row_index: usize,
    pub sales_invoice_no: String,
    pub order_id: Option<String>,
    pub brand: Option<String>,
    pub order_date: Option<String>,
    pub stage: String,
    pub order_total: f64,
    pub partner_paid: bool,
    pub partner_paid_date: Option<String>,
    pub partner_payment_method: Option<String>,
    pub partner_payment_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierInvoice {
    #[serde(skip)]
    pub row_index: usize,
    pub invoice_no: String,
    pub supplier: String,
    pub amount: f64,
    pub sales_invoice_no: Option<String>,
    pub paid: bool,
    pub paid_date: Option<String>,
    pub payment_reference: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    #[serde(skip)]
    pub row_index: usize,
    pub sales_invoice_no: String,
    pub supplier_invoice_no: String,
    pub allocated_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenSaleRecord {
    #[serde(skip)]
    pub row_index: usize,
    pub date: String,
    pub location: String,
    pub revenue: f64,
    pub gross_sales: f64,
    pub count: f64,
    pub franchise_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenMapping {
    pub location: String,
    pub franchise_code: String,
    pub franchise_name: Option<String>,
    pub active: bool,
    pub notes: Option<String>,
}

pub(crate) struct Table<T> {
    pub(crate) schema: SheetSchema,
    pub(crate) records: Vec<T>,
}

pub(crate) fn read_orders(store: &dyn SheetStore, sheet: &str) -> ClientResult<Table<Order>> {
    let loaded = load_sheet(store, sheet, &ORDERS)?;
    Ok(convert(loaded, |schema, row_index, row| Order {
        row_index,
        sales_invoice_no: schema.cell(row, col::SALES_INVOICE_NO).to_string(),
        order_id: optional_text(schema.cell(row, col::ORDER_ID)),
        brand: optional_text(schema.cell(row, col::BRAND)),
        order_date: optional_text(schema.cell(row, col::ORDER_DATE)),
        stage: schema.cell(row, col::STAGE).to_string(),
        order_total: money_cell(schema, row, col::ORDER_TOTAL),
        partner_paid: parse_flag(schema.cell(row, col::PARTNER_PAID)),
        partner_paid_date: optional_text(schema.cell(row, col::PARTNER_PAID_DATE)),
        partner_payment_method: optional_text(schema.cell(row, col::PARTNER_PAYMENT_METHOD)),
        partner_payment_ref: optional_text(schema.cell(row, col::PARTNER_PAYMENT_REF)),
    }))
}

pub(crate) fn read_supplier_invoices(
    store: &dyn SheetStore,
    sheet: &str,
) -> ClientResult<Table<SupplierInvoice>> {
    let loaded = load_sheet(store, sheet, &SUPPLIER_INVOICES)?;
    Ok(convert(loaded, |schema, row_index, row| SupplierInvoice {
        row_index,
        invoice_no: schema.cell(row, col::INVOICE_NO).to_string(),
        supplier: schema.cell(row, col::SUPPLIER).to_string(),
        amount: money_cell(schema, row, col::AMOUNT),
        sales_invoice_no: optional_text(schema.cell(row, col::SALES_INVOICE_NO)),
        paid: parse_flag(schema.cell(row, col::PAID)),
        paid_date: optional_text(schema.cell(row, col::PAID_DATE)),
        payment_reference: optional_text(schema.cell(row, col::PAYMENT_REFERENCE)),
        file_url: optional_text(schema.cell(row, col::FILE_URL)),
    }))
}

pub(crate) fn read_allocations(
    store: &dyn SheetStore,
    sheet: &str,
) -> ClientResult<Table<Allocation>> {
    let loaded = load_sheet(store, sheet, &ALLOCATIONS)?;
    Ok(convert(loaded, |schema, row_index, row| Allocation {
        row_index,
        sales_invoice_no: schema.cell(row, col::SALES_INVOICE_NO).to_string(),
        supplier_invoice_no: schema.cell(row, col::SUPPLIER_INVOICE_NO).to_string(),
        allocated_amount: money_cell(schema, row, col::ALLOCATED_AMOUNT),
    }))
}

pub(crate) fn read_kitchen_sales(
    store: &dyn SheetStore,
    sheet: &str,
) -> ClientResult<Table<KitchenSaleRecord>> {
    let loaded = load_sheet(store, sheet, &KITCHEN_SALES)?;
    Ok(convert(loaded, |schema, row_index, row| KitchenSaleRecord {
        row_index,
        date: schema.cell(row, col::DATE).to_string(),
        location: schema.cell(row, col::LOCATION).to_string(),
        revenue: money_cell(schema, row, col::REVENUE),
        gross_sales: money_cell(schema, row, col::GROSS_SALES),
        count: money_cell(schema, row, col::COUNT),
        franchise_code: optional_text(schema.cell(row, col::FRANCHISE_CODE)),
    }))
}

pub(crate) fn read_kitchen_mappings(
    store: &dyn SheetStore,
    sheet: &str,
) -> ClientResult<Table<KitchenMapping>> {
    let loaded = load_sheet(store, sheet, &KITCHEN_MAPPING)?;
    Ok(convert(loaded, |schema, _row_index, row| KitchenMapping {
        location: schema.cell(row, col::LOCATION).to_string(),
        franchise_code: schema.cell(row, col::FRANCHISE_CODE).to_string(),
        franchise_name: optional_text(schema.cell(row, col::FRANCHISE_NAME)),
        active: parse_active(schema.cell(row, col::ACTIVE)),
        notes: optional_text(schema.cell(row, col::NOTES)),
    }))
}

fn convert<T>(
    loaded: LoadedSheet,
    build: impl Fn(&SheetSchema, usize, &[String]) -> T,
) -> Table<T> {
    let records = loaded
        .rows
        .iter()
        .map(|(row_index, row)| build(&loaded.schema, *row_index, row))
        .collect();
    Table {
        schema: loaded.schema,
        records,
    }
}

fn money_cell(schema: &SheetSchema, row: &[String], column: &str) -> f64 {
    let raw = schema.cell(row, column);
    match parse_money(raw) {
        Some(value) => value,
        None => {
            warn!(sheet = schema.sheet(), column, value = raw, "unreadable amount treated as 0");
            0.0
        }
    }
}

/// Lenient amount parse for spreadsheet cells: `$1,234.50` reads as 1234.5,
/// a blank cell as 0. Returns `None` for text that is not a finite number.
pub(crate) fn parse_money(raw: &str) -> Option<f64> {
    let cleaned = raw
        .chars()
        .filter(|character| !matches!(character, '$' | '€' | '£' | ',' | ' ' | '\u{a0}'))
        .collect::<String>();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    let negative = cleaned.starts_with('(') && cleaned.ends_with(')');
    let digits = cleaned.trim_start_matches('(').trim_end_matches(')');
    let value = digits.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(if negative { -value } else { value })
}

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "x" | "paid"
    )
}

fn parse_active(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "false" | "no" | "n" | "0" | "inactive"
    )
}

pub(crate) fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub(crate) fn format_flag(value: bool) -> String {
    let text = if value { "TRUE" } else { "FALSE" };
    text.to_string()
}

pub(crate) fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.2}")
    }
}
