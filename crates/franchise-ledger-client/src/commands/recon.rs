use std::path::Path;

use crate::ClientResult;
use crate::commands::common::with_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::AllocationsData;
use crate::recon::{
    aggregate_allocations, match_supplier_invoices, resolve_allocations, summarize_reconciliation,
};

#[derive(Debug, Default)]
pub struct ReconOptions<'a> {
    pub sales_invoice_no: String,
    pub home_override: Option<&'a Path>,
}

pub fn allocations(options: ReconOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let allocations = with_ledger(options.home_override, |ledger| {
        resolve_allocations(ledger, &options.sales_invoice_no)
    })?;
    let by_supplier_invoice = aggregate_allocations(&allocations);
    let total_allocated = allocations
        .iter()
        .map(|allocation| allocation.allocated_amount)
        .sum();
    success(
        "recon allocations",
        AllocationsData {
            sales_invoice_no: options.sales_invoice_no,
            allocations,
            by_supplier_invoice,
            total_allocated,
        },
    )
}

pub fn match_invoices(options: ReconOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let outcome = with_ledger(options.home_override, |ledger| {
        match_supplier_invoices(ledger, &options.sales_invoice_no)
    })?;
    success("recon match", outcome)
}

pub fn summary(options: ReconOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let summary = with_ledger(options.home_override, |ledger| {
        summarize_reconciliation(ledger, &options.sales_invoice_no)
    })?;
    success("recon summary", summary)
}
