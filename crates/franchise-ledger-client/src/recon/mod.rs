//! Read path: sales invoice → allocations → supplier invoices → summary.
//! Every call re-reads the sheets it needs.

pub mod allocations;
pub mod matcher;
pub mod normalize;
pub mod summary;

pub use allocations::{AllocationAggregate, aggregate_allocations, resolve_allocations};
pub use matcher::{MatchDiagnosis, MatchOutcome, MatchPath, MatchedInvoice, match_supplier_invoices};
pub use normalize::normalize_invoice_number;
pub use summary::{InvoiceLine, OverAllocation, ReconciliationSummary, summarize_reconciliation};
