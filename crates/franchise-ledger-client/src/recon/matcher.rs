use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::ClientResult;
use crate::ledger::Ledger;
use crate::recon::allocations::allocations_for;
use crate::recon::normalize::normalize_invoice_number;
use crate::records::{Allocation, SupplierInvoice, read_allocations, read_supplier_invoices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPath {
    /// Linked through a row in the allocation table.
    Allocation,
    /// Linked by the sales invoice number written on the supplier invoice.
    DirectLink,
}

/// Why a sales invoice matched the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDiagnosis {
    /// Allocations exist and every allocated supplier invoice was found.
    Allocated,
    /// Allocations exist but at least one allocated invoice has no row.
    AllocatedInvoiceMissing,
    /// No allocations; supplier invoices carry the sales invoice directly.
    DirectLink,
    /// No allocations and no direct links.
    NoAllocations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedInvoice {
    #[serde(flatten)]
    pub invoice: SupplierInvoice,
    pub matched_by: MatchPath,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub sales_invoice_no: String,
    pub diagnosis: MatchDiagnosis,
    pub allocations: Vec<Allocation>,
    pub matched: Vec<MatchedInvoice>,
    /// Allocated supplier invoice numbers with no supplier invoice row.
    pub missing_invoice_numbers: Vec<String>,
    /// Allocation rows whose supplier invoice number is blank.
    pub blank_invoice_allocations: usize,
}

impl MatchOutcome {
    pub fn path(&self) -> Option<MatchPath> {
        match self.diagnosis {
            MatchDiagnosis::Allocated | MatchDiagnosis::AllocatedInvoiceMissing => {
                Some(MatchPath::Allocation)
            }
            MatchDiagnosis::DirectLink => Some(MatchPath::DirectLink),
            MatchDiagnosis::NoAllocations => None,
        }
    }
}

pub fn match_supplier_invoices(
    ledger: &Ledger<'_>,
    sales_invoice_no: &str,
) -> ClientResult<MatchOutcome> {
    let allocations = read_allocations(ledger.store(), &ledger.sheets().allocations)?;
    let invoices = read_supplier_invoices(ledger.store(), &ledger.sheets().supplier_invoices)?;
    let scoped = allocations_for(&allocations.records, sales_invoice_no);
    Ok(match_invoices(sales_invoice_no, scoped, &invoices.records))
}

/// Joins allocations to supplier invoices by normalized invoice number.
///
/// The direct-link fallback runs only when `allocations` is empty. When
/// allocations exist but name invoices that are not on file, the result is
/// `AllocatedInvoiceMissing`, never a fallback.
pub fn match_invoices(
    sales_invoice_no: &str,
    allocations: Vec<Allocation>,
    invoices: &[SupplierInvoice],
) -> MatchOutcome {
    if allocations.is_empty() {
        let key = normalize_invoice_number(sales_invoice_no);
        let matched = invoices
            .iter()
            .filter(|invoice| {
                !key.is_empty()
                    && invoice
                        .sales_invoice_no
                        .as_deref()
                        .map(|linked| normalize_invoice_number(linked) == key)
                        .unwrap_or(false)
            })
            .map(|invoice| MatchedInvoice {
                invoice: invoice.clone(),
                matched_by: MatchPath::DirectLink,
            })
            .collect::<Vec<MatchedInvoice>>();

        let diagnosis = if matched.is_empty() {
            MatchDiagnosis::NoAllocations
        } else {
            MatchDiagnosis::DirectLink
        };
        debug!(sales_invoice_no, matched = matched.len(), ?diagnosis, "matched without allocations");

        return MatchOutcome {
            sales_invoice_no: sales_invoice_no.to_string(),
            diagnosis,
            allocations,
            matched,
            missing_invoice_numbers: Vec::new(),
            blank_invoice_allocations: 0,
        };
    }

    let allocated_keys = allocations
        .iter()
        .map(|allocation| normalize_invoice_number(&allocation.supplier_invoice_no))
        .filter(|key| !key.is_empty())
        .collect::<BTreeSet<String>>();

    let matched = invoices
        .iter()
        .filter(|invoice| allocated_keys.contains(&normalize_invoice_number(&invoice.invoice_no)))
        .map(|invoice| MatchedInvoice {
            invoice: invoice.clone(),
            matched_by: MatchPath::Allocation,
        })
        .collect::<Vec<MatchedInvoice>>();

    let found_keys = matched
        .iter()
        .map(|entry| normalize_invoice_number(&entry.invoice.invoice_no))
        .collect::<BTreeSet<String>>();

    let mut missing_invoice_numbers = Vec::new();
    let mut blank_invoice_allocations = 0;
    let mut reported = BTreeSet::new();
    for allocation in &allocations {
        let key = normalize_invoice_number(&allocation.supplier_invoice_no);
        if key.is_empty() {
            blank_invoice_allocations += 1;
            continue;
        }
        if found_keys.contains(&key) || !reported.insert(key) {
            continue;
        }
        missing_invoice_numbers.push(allocation.supplier_invoice_no.clone());
    }

    let diagnosis = if missing_invoice_numbers.is_empty() && blank_invoice_allocations == 0 {
        MatchDiagnosis::Allocated
    } else {
        warn!(
            sales_invoice_no,
            missing = ?missing_invoice_numbers,
            blank = blank_invoice_allocations,
            "allocated supplier invoices are not on file"
        );
        MatchDiagnosis::AllocatedInvoiceMissing
    };

    MatchOutcome {
        sales_invoice_no: sales_invoice_no.to_string(),
        diagnosis,
        allocations,
        matched,
        missing_invoice_numbers,
        blank_invoice_allocations,
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchDiagnosis, MatchPath, match_invoices};
    use crate::records::{Allocation, SupplierInvoice};

    fn allocation(sales: &str, supplier: &str, amount: f64) -> Allocation {
        Allocation {
            row_index: 0,
            sales_invoice_no: sales.to_string(),
            supplier_invoice_no: supplier.to_string(),
            allocated_amount: amount,
        }
    }

    fn invoice(no: &str, amount: f64, linked: Option<&str>) -> SupplierInvoice {
        SupplierInvoice {
            row_index: 0,
            invoice_no: no.to_string(),
            supplier: "Fresh Foods".to_string(),
            amount,
            sales_invoice_no: linked.map(str::to_string),
            paid: false,
            paid_date: None,
            payment_reference: None,
            file_url: None,
        }
    }

    #[test]
    fn allocation_path_matches_normalized_invoice_numbers() {
        let invoices = vec![invoice("#SI-1", 300.0, None), invoice("si-2 ", 200.0, None)];
        let outcome = match_invoices(
            "1005",
            vec![allocation("1005", "SI-1", 300.0), allocation("1005", "SI-2", 150.0)],
            &invoices,
        );
        assert_eq!(outcome.diagnosis, MatchDiagnosis::Allocated);
        assert_eq!(outcome.path(), Some(MatchPath::Allocation));
        assert_eq!(outcome.matched.len(), 2);
        assert!(outcome.matched.iter().all(|entry| entry.matched_by == MatchPath::Allocation));
    }

    #[test]
    fn fallback_uses_direct_link_only_without_allocations() {
        let invoices = vec![
            invoice("SI-9", 80.0, Some("#1005")),
            invoice("SI-10", 20.0, Some("1006")),
        ];
        let outcome = match_invoices("1005 ", Vec::new(), &invoices);
        assert_eq!(outcome.diagnosis, MatchDiagnosis::DirectLink);
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.matched[0].invoice.invoice_no, "SI-9");
        assert_eq!(outcome.matched[0].matched_by, MatchPath::DirectLink);
    }

    #[test]
    fn allocations_without_invoices_never_fall_back() {
        let invoices = vec![invoice("SI-9", 80.0, Some("1005"))];
        let outcome = match_invoices("1005", vec![allocation("1005", "SI-404", 50.0)], &invoices);
        assert_eq!(outcome.diagnosis, MatchDiagnosis::AllocatedInvoiceMissing);
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.missing_invoice_numbers, vec!["SI-404".to_string()]);
    }

    #[test]
    fn missing_invoice_numbers_are_reported_once() {
        let outcome = match_invoices(
            "1005",
            vec![allocation("1005", "SI-7", 10.0), allocation("1005", "#si-7", 5.0)],
            &[],
        );
        assert_eq!(outcome.missing_invoice_numbers.len(), 1);
    }

    #[test]
    fn blank_allocated_invoice_number_is_never_treated_as_found() {
        let invoices = vec![invoice("SI-1", 300.0, Some("1005"))];
        let outcome = match_invoices(
            "1005",
            vec![allocation("1005", "SI-1", 300.0), allocation("1005", " # ", 99.0)],
            &invoices,
        );
        assert_eq!(outcome.diagnosis, MatchDiagnosis::AllocatedInvoiceMissing);
        assert_eq!(outcome.path(), Some(MatchPath::Allocation));
        assert_eq!(outcome.matched.len(), 1);
        assert!(outcome.missing_invoice_numbers.is_empty());
        assert_eq!(outcome.blank_invoice_allocations, 1);
    }

    #[test]
    fn nothing_linked_is_a_valid_empty_outcome() {
        let outcome = match_invoices("1005", Vec::new(), &[invoice("SI-1", 1.0, None)]);
        assert_eq!(outcome.diagnosis, MatchDiagnosis::NoAllocations);
        assert_eq!(outcome.path(), None);
        assert!(outcome.matched.is_empty());
    }
}
