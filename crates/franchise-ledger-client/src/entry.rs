//! Order and supplier-invoice entry: appends new rows.

use serde::Serialize;
use tracing::info;
use ulid::Ulid;

use crate::ledger::Ledger;
use crate::payments::{ORDER_STAGES, canonical_stage, supplied, validated_date};
use crate::recon::normalize::normalize_invoice_number;
use crate::records::{
    Allocation, Order, SupplierInvoice, format_amount, format_flag, read_orders,
    read_supplier_invoices,
};
use crate::schema::{ALLOCATIONS, col, load_sheet};
use crate::store::RowAppend;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOrder {
    pub sales_invoice_no: String,
    pub order_id: Option<String>,
    pub brand: Option<String>,
    pub order_date: Option<String>,
    pub stage: Option<String>,
    pub order_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupplierInvoiceEntry {
    pub invoice_no: String,
    pub supplier: String,
    pub amount: f64,
    pub allocated_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedInvoices {
    pub sales_invoice_no: String,
    pub invoices: Vec<SupplierInvoice>,
    pub allocations: Vec<Allocation>,
}

pub fn create_order(ledger: &Ledger<'_>, order: &NewOrder) -> ClientResult<Order> {
    let Some(sales_invoice_no) = supplied(Some(order.sales_invoice_no.as_str())) else {
        return Err(ClientError::invalid_argument_for_command(
            "Sales invoice number must not be empty.",
            Some("order create"),
        ));
    };
    let stage = match supplied(order.stage.as_deref()) {
        Some(raw) => match canonical_stage(raw) {
            Some(stage) => stage,
            None => return Err(ClientError::invalid_stage(raw, &ORDER_STAGES)),
        },
        None => ORDER_STAGES[0],
    };
    let order_date = validated_date("order_date", order.order_date.as_deref())?;
    if let Some(total) = order.order_total
        && (!total.is_finite() || total < 0.0)
    {
        return Err(ClientError::invalid_amount("order_total", &total.to_string()));
    }

    let sheet = &ledger.sheets().orders;
    let existing = read_orders(ledger.store(), sheet)?;
    let key = normalize_invoice_number(sales_invoice_no);
    if existing
        .records
        .iter()
        .any(|current| normalize_invoice_number(&current.sales_invoice_no) == key)
    {
        return Err(ClientError::order_already_exists(sales_invoice_no));
    }

    let order_id = supplied(order.order_id.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("ord_{}", Ulid::new()));
    let brand = supplied(order.brand.as_deref()).map(str::to_string);

    let mut values = vec![
        (col::SALES_INVOICE_NO, sales_invoice_no.to_string()),
        (col::ORDER_ID, order_id.clone()),
        (col::STAGE, stage.to_string()),
        (col::PARTNER_PAID, format_flag(false)),
    ];
    if let Some(value) = &brand {
        values.push((col::BRAND, value.clone()));
    }
    if let Some(value) = &order_date {
        values.push((col::ORDER_DATE, value.clone()));
    }
    if let Some(total) = order.order_total {
        values.push((col::ORDER_TOTAL, format_amount(total)));
    }

    let row = existing.schema.build_row(&values);
    let row_index = ledger.store().append_row(sheet, &row)?;
    info!(sales_invoice_no, order_id = %order_id, row_index, "order created");

    Ok(Order {
        row_index,
        sales_invoice_no: sales_invoice_no.to_string(),
        order_id: Some(order_id),
        brand,
        order_date,
        stage: stage.to_string(),
        order_total: order.order_total.unwrap_or(0.0),
        partner_paid: false,
        partner_paid_date: None,
        partner_payment_method: None,
        partner_payment_ref: None,
    })
}

/// Records the supplier invoices that fulfil one order. Each entry becomes a
/// SupplierInvoices row linked to the order; entries with an allocated amount
/// also get an Allocations row. Every entry is checked first, then all rows
/// are appended in one batch. An allocated amount above the invoice amount is
/// accepted and surfaces as over-allocation in the summary.
pub fn record_supplier_invoices(
    ledger: &Ledger<'_>,
    sales_invoice_no: &str,
    entries: &[SupplierInvoiceEntry],
) -> ClientResult<RecordedInvoices> {
    let Some(sales_invoice_no) = supplied(Some(sales_invoice_no)) else {
        return Err(ClientError::invalid_argument_for_command(
            "Sales invoice number must not be empty.",
            Some("invoice record"),
        ));
    };
    if entries.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "At least one supplier invoice entry is required.",
            Some("invoice record"),
        ));
    }

    let invoices_sheet = &ledger.sheets().supplier_invoices;
    let allocations_sheet = &ledger.sheets().allocations;
    let existing = read_supplier_invoices(ledger.store(), invoices_sheet)?;
    let allocation_schema = load_sheet(ledger.store(), allocations_sheet, &ALLOCATIONS)?.schema;

    let mut seen = Vec::<(String, String)>::new();
    for entry in entries {
        validate_entry(entry)?;
        let key = (
            normalize_invoice_number(&entry.invoice_no),
            entry.supplier.trim().to_lowercase(),
        );
        let already_on_file = existing.records.iter().any(|invoice| {
            normalize_invoice_number(&invoice.invoice_no) == key.0
                && invoice.supplier.trim().to_lowercase() == key.1
        });
        if already_on_file || seen.contains(&key) {
            return Err(ClientError::supplier_invoice_already_exists(
                entry.invoice_no.trim(),
                entry.supplier.trim(),
            ));
        }
        seen.push(key);
    }

    let mut rows = Vec::new();
    for entry in entries {
        let invoice_no = entry.invoice_no.trim().to_string();
        rows.push(RowAppend::new(
            invoices_sheet,
            existing.schema.build_row(&[
                (col::INVOICE_NO, invoice_no.clone()),
                (col::SUPPLIER, entry.supplier.trim().to_string()),
                (col::AMOUNT, format_amount(entry.amount)),
                (col::SALES_INVOICE_NO, sales_invoice_no.to_string()),
                (col::PAID, format_flag(false)),
            ]),
        ));
        if let Some(allocated) = entry.allocated_amount {
            rows.push(RowAppend::new(
                allocations_sheet,
                allocation_schema.build_row(&[
                    (col::SALES_INVOICE_NO, sales_invoice_no.to_string()),
                    (col::SUPPLIER_INVOICE_NO, invoice_no),
                    (col::ALLOCATED_AMOUNT, format_amount(allocated)),
                ]),
            ));
        }
    }
    let mut row_indexes = ledger.store().append_rows(&rows)?.into_iter();

    let mut invoices = Vec::with_capacity(entries.len());
    let mut allocations = Vec::new();
    for entry in entries {
        let invoice_no = entry.invoice_no.trim().to_string();
        invoices.push(SupplierInvoice {
            row_index: row_indexes.next().unwrap_or(0),
            invoice_no: invoice_no.clone(),
            supplier: entry.supplier.trim().to_string(),
            amount: entry.amount,
            sales_invoice_no: Some(sales_invoice_no.to_string()),
            paid: false,
            paid_date: None,
            payment_reference: None,
            file_url: None,
        });
        if let Some(allocated) = entry.allocated_amount {
            allocations.push(Allocation {
                row_index: row_indexes.next().unwrap_or(0),
                sales_invoice_no: sales_invoice_no.to_string(),
                supplier_invoice_no: invoice_no,
                allocated_amount: allocated,
            });
        }
    }

    info!(
        sales_invoice_no,
        invoices = invoices.len(),
        allocations = allocations.len(),
        "supplier invoices recorded"
    );
    Ok(RecordedInvoices {
        sales_invoice_no: sales_invoice_no.to_string(),
        invoices,
        allocations,
    })
}

fn validate_entry(entry: &SupplierInvoiceEntry) -> ClientResult<()> {
    if entry.invoice_no.trim().is_empty() || normalize_invoice_number(&entry.invoice_no).is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Supplier invoice number must not be empty.",
            Some("invoice record"),
        ));
    }
    if entry.supplier.trim().is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Supplier name must not be empty.",
            Some("invoice record"),
        ));
    }
    if !entry.amount.is_finite() || entry.amount < 0.0 {
        return Err(ClientError::invalid_amount("amount", &entry.amount.to_string()));
    }
    if let Some(allocated) = entry.allocated_amount
        && (!allocated.is_finite() || allocated < 0.0)
    {
        return Err(ClientError::invalid_amount(
            "allocated_amount",
            &allocated.to_string(),
        ));
    }
    Ok(())
}
