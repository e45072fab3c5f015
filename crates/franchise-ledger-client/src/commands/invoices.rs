use std::path::Path;

use crate::commands::common::with_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::entry::{SupplierInvoiceEntry, record_supplier_invoices};
use crate::payments::{
    SupplierInvoicePatch, mark_supplier_invoice_paid, set_supplier_invoice_file_url,
    update_supplier_invoice,
};
use crate::records::parse_money;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct InvoiceRecordOptions<'a> {
    pub sales_invoice_no: String,
    pub entries: Vec<SupplierInvoiceEntry>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct InvoiceUpdateOptions<'a> {
    pub invoice_no: String,
    pub supplier: Option<String>,
    pub patch: SupplierInvoicePatch,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct InvoicePaidOptions<'a> {
    pub invoice_no: String,
    pub supplier: Option<String>,
    pub paid_date: Option<String>,
    pub payment_reference: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct InvoiceFileOptions<'a> {
    pub invoice_no: String,
    pub supplier: Option<String>,
    pub file_url: String,
    pub home_override: Option<&'a Path>,
}

pub fn record(options: InvoiceRecordOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let recorded = with_ledger(options.home_override, |ledger| {
        record_supplier_invoices(ledger, &options.sales_invoice_no, &options.entries)
    })?;
    success("invoice record", recorded)
}

pub fn update(options: InvoiceUpdateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let updated = with_ledger(options.home_override, |ledger| {
        update_supplier_invoice(
            ledger,
            &options.invoice_no,
            options.supplier.as_deref(),
            &options.patch,
        )
    })?;
    success("invoice update", updated)
}

pub fn paid(options: InvoicePaidOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let updated = with_ledger(options.home_override, |ledger| {
        mark_supplier_invoice_paid(
            ledger,
            &options.invoice_no,
            options.supplier.as_deref(),
            options.paid_date.as_deref(),
            options.payment_reference.as_deref(),
        )
    })?;
    success("invoice paid", updated)
}

pub fn file(options: InvoiceFileOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let updated = with_ledger(options.home_override, |ledger| {
        set_supplier_invoice_file_url(
            ledger,
            &options.invoice_no,
            options.supplier.as_deref(),
            &options.file_url,
        )
    })?;
    success("invoice file", updated)
}

/// Parses `NO:SUPPLIER:AMOUNT[:ALLOCATED]`.
pub fn parse_entry(text: &str) -> ClientResult<SupplierInvoiceEntry> {
    let parts = text.split(':').map(str::trim).collect::<Vec<&str>>();
    if !(3..=4).contains(&parts.len()) || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            &format!("Entry `{text}` must look like NO:SUPPLIER:AMOUNT or NO:SUPPLIER:AMOUNT:ALLOCATED."),
            Some("invoice record"),
        ));
    }

    let amount = entry_amount("amount", parts[2])?;
    let allocated_amount = match parts.get(3) {
        Some(text) if !text.is_empty() => Some(entry_amount("allocated_amount", text)?),
        _ => None,
    };
    Ok(SupplierInvoiceEntry {
        invoice_no: parts[0].to_string(),
        supplier: parts[1].to_string(),
        amount,
        allocated_amount,
    })
}

fn entry_amount(field: &str, text: &str) -> ClientResult<f64> {
    if text.is_empty() {
        return Err(ClientError::invalid_amount(field, text));
    }
    parse_money(text).ok_or_else(|| ClientError::invalid_amount(field, text))
}
