use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::ClientResult;
use crate::ledger::Ledger;
use crate::recon::allocations::{aggregate_allocations, allocations_for};
use crate::recon::matcher::{MatchDiagnosis, MatchOutcome, MatchPath, match_invoices};
use crate::recon::normalize::normalize_invoice_number;
use crate::records::{Allocation, read_allocations, read_supplier_invoices};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub sales_invoice_no: String,
    pub match_path: Option<MatchPath>,
    pub diagnosis: MatchDiagnosis,
    pub total_allocated: f64,
    pub total_invoiced: f64,
    pub total_paid: f64,
    pub total_unpaid: f64,
    pub allocation_count: usize,
    pub linked_count: usize,
    pub paid_count: usize,
    pub unpaid_count: usize,
    /// Allocated total differs from the matched invoice total by more than
    /// the configured epsilon.
    pub discrepancy: bool,
    pub discrepancy_amount: f64,
    pub lines: Vec<InvoiceLine>,
    pub missing_invoice_numbers: Vec<String>,
    pub blank_invoice_allocations: usize,
    pub over_allocated: Vec<OverAllocation>,
}

/// One supplier invoice number as seen from this sales invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub supplier_invoice_no: String,
    pub suppliers: Vec<String>,
    pub invoice_found: bool,
    pub allocated: Option<f64>,
    pub invoice_amount: f64,
    pub paid: bool,
    pub delta: Option<f64>,
}

/// A supplier invoice whose allocations across every order exceed its amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverAllocation {
    pub supplier_invoice_no: String,
    pub invoice_amount: f64,
    pub allocated_all_orders: f64,
    pub excess: f64,
}

pub fn summarize_reconciliation(
    ledger: &Ledger<'_>,
    sales_invoice_no: &str,
) -> ClientResult<ReconciliationSummary> {
    let allocations = read_allocations(ledger.store(), &ledger.sheets().allocations)?;
    let invoices = read_supplier_invoices(ledger.store(), &ledger.sheets().supplier_invoices)?;
    let scoped = allocations_for(&allocations.records, sales_invoice_no);
    let outcome = match_invoices(sales_invoice_no, scoped, &invoices.records);
    let summary = summarize(&outcome, &allocations.records, ledger.discrepancy_epsilon());

    if summary.discrepancy {
        warn!(
            sales_invoice_no,
            total_allocated = summary.total_allocated,
            total_invoiced = summary.total_invoiced,
            "allocated total does not match supplier invoices"
        );
    }
    Ok(summary)
}

/// Builds the read model for one sales invoice. Performs no writes and never
/// fails; mismatches come back as data.
pub fn summarize(
    outcome: &MatchOutcome,
    all_allocations: &[Allocation],
    epsilon: f64,
) -> ReconciliationSummary {
    let aggregates = aggregate_allocations(&outcome.allocations);
    let total_allocated = outcome
        .allocations
        .iter()
        .map(|allocation| allocation.allocated_amount)
        .sum::<f64>();

    let mut total_invoiced = 0.0;
    let mut total_paid = 0.0;
    let mut total_unpaid = 0.0;
    let mut paid_count = 0;
    let mut unpaid_count = 0;
    let mut by_key: BTreeMap<String, LineAccumulator> = BTreeMap::new();

    for entry in &outcome.matched {
        let invoice = &entry.invoice;
        total_invoiced += invoice.amount;
        if invoice.paid {
            total_paid += invoice.amount;
            paid_count += 1;
        } else {
            total_unpaid += invoice.amount;
            unpaid_count += 1;
        }

        let line = by_key
            .entry(normalize_invoice_number(&invoice.invoice_no))
            .or_insert_with(|| LineAccumulator::new(&invoice.invoice_no));
        line.amount += invoice.amount;
        line.all_paid &= invoice.paid;
        if !line.suppliers.contains(&invoice.supplier) {
            line.suppliers.push(invoice.supplier.clone());
        }
    }

    let allocation_path = outcome.path() == Some(MatchPath::Allocation);
    let mut lines = Vec::new();
    for aggregate in &aggregates {
        let found = by_key.remove(&aggregate.key);
        let (invoice_amount, paid, suppliers, invoice_found) = match found {
            Some(line) => (line.amount, line.all_paid, line.suppliers, true),
            None => (0.0, false, Vec::new(), false),
        };
        lines.push(InvoiceLine {
            supplier_invoice_no: aggregate.supplier_invoice_no.clone(),
            suppliers,
            invoice_found,
            allocated: Some(round_cents(aggregate.allocated_total)),
            invoice_amount: round_cents(invoice_amount),
            paid,
            delta: Some(round_cents(aggregate.allocated_total - invoice_amount)),
        });
    }
    for line in by_key.into_values() {
        lines.push(InvoiceLine {
            supplier_invoice_no: line.display_no,
            suppliers: line.suppliers,
            invoice_found: true,
            allocated: None,
            invoice_amount: round_cents(line.amount),
            paid: line.all_paid,
            delta: None,
        });
    }

    let discrepancy_amount = if allocation_path {
        total_allocated - total_invoiced
    } else {
        0.0
    };

    ReconciliationSummary {
        sales_invoice_no: outcome.sales_invoice_no.clone(),
        match_path: outcome.path(),
        diagnosis: outcome.diagnosis,
        total_allocated: round_cents(total_allocated),
        total_invoiced: round_cents(total_invoiced),
        total_paid: round_cents(total_paid),
        total_unpaid: round_cents(total_unpaid),
        allocation_count: outcome.allocations.len(),
        linked_count: outcome.matched.len(),
        paid_count,
        unpaid_count,
        discrepancy: discrepancy_amount.abs() > epsilon,
        discrepancy_amount: round_cents(discrepancy_amount),
        lines,
        missing_invoice_numbers: outcome.missing_invoice_numbers.clone(),
        blank_invoice_allocations: outcome.blank_invoice_allocations,
        over_allocated: over_allocated(outcome, all_allocations, epsilon),
    }
}

/// Checks each matched supplier invoice against allocations from every order,
/// not just the one being summarized.
fn over_allocated(
    outcome: &MatchOutcome,
    all_allocations: &[Allocation],
    epsilon: f64,
) -> Vec<OverAllocation> {
    let mut invoice_amounts: BTreeMap<String, (String, f64)> = BTreeMap::new();
    for entry in &outcome.matched {
        let key = normalize_invoice_number(&entry.invoice.invoice_no);
        let slot = invoice_amounts
            .entry(key)
            .or_insert_with(|| (entry.invoice.invoice_no.clone(), 0.0));
        slot.1 += entry.invoice.amount;
    }

    let mut allocated: BTreeMap<String, f64> = BTreeMap::new();
    for allocation in all_allocations {
        let key = normalize_invoice_number(&allocation.supplier_invoice_no);
        if invoice_amounts.contains_key(&key) {
            *allocated.entry(key).or_insert(0.0) += allocation.allocated_amount;
        }
    }

    invoice_amounts
        .into_iter()
        .filter_map(|(key, (display_no, invoice_amount))| {
            let allocated_all_orders = allocated.get(&key).copied().unwrap_or(0.0);
            let excess = allocated_all_orders - invoice_amount;
            if excess <= epsilon {
                return None;
            }
            Some(OverAllocation {
                supplier_invoice_no: display_no,
                invoice_amount: round_cents(invoice_amount),
                allocated_all_orders: round_cents(allocated_all_orders),
                excess: round_cents(excess),
            })
        })
        .collect()
}

struct LineAccumulator {
    display_no: String,
    suppliers: Vec<String>,
    amount: f64,
    all_paid: bool,
}

impl LineAccumulator {
    fn new(display_no: &str) -> Self {
        Self {
            display_no: display_no.to_string(),
            suppliers: Vec::new(),
            amount: 0.0,
            all_paid: true,
        }
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
