use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::ClientResult;
use crate::ledger::Ledger;
use crate::recon::normalize::normalize_invoice_number;
use crate::records::{Allocation, read_allocations};

/// Allocations for one sales invoice, summed per supplier invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationAggregate {
    /// Normalized supplier invoice number. Empty for allocation rows that
    /// name no supplier invoice; those still count toward the total.
    pub key: String,
    /// Spelling from the first allocation row seen for this key.
    pub supplier_invoice_no: String,
    pub allocated_total: f64,
    pub allocation_count: usize,
}

/// Every allocation row whose sales invoice matches `sales_invoice_no`.
/// An order without allocations yields an empty list, not an error.
pub fn resolve_allocations(ledger: &Ledger<'_>, sales_invoice_no: &str) -> ClientResult<Vec<Allocation>> {
    let table = read_allocations(ledger.store(), &ledger.sheets().allocations)?;
    let matched = allocations_for(&table.records, sales_invoice_no);
    debug!(
        sales_invoice_no,
        allocations = matched.len(),
        "resolved allocations"
    );
    Ok(matched)
}

pub(crate) fn allocations_for(all: &[Allocation], sales_invoice_no: &str) -> Vec<Allocation> {
    let key = normalize_invoice_number(sales_invoice_no);
    if key.is_empty() {
        return Vec::new();
    }
    all.iter()
        .filter(|allocation| normalize_invoice_number(&allocation.sales_invoice_no) == key)
        .cloned()
        .collect()
}

pub fn aggregate_allocations(allocations: &[Allocation]) -> Vec<AllocationAggregate> {
    let mut groups: BTreeMap<String, AllocationAggregate> = BTreeMap::new();

    for allocation in allocations {
        let key = normalize_invoice_number(&allocation.supplier_invoice_no);
        let entry = groups
            .entry(key.clone())
            .or_insert_with(|| AllocationAggregate {
                key,
                supplier_invoice_no: allocation.supplier_invoice_no.trim().to_string(),
                allocated_total: 0.0,
                allocation_count: 0,
            });
        entry.allocated_total += allocation.allocated_amount;
        entry.allocation_count += 1;
    }

    groups.into_values().collect()
}
