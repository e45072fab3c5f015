use serde::Serialize;

use crate::import::SalesImportResult;
use crate::records::{Allocation, KitchenMapping};
use crate::recon::AllocationAggregate;

#[derive(Debug, Clone, Serialize)]
pub struct AllocationsData {
    pub sales_invoice_no: String,
    pub allocations: Vec<Allocation>,
    pub by_supplier_invoice: Vec<AllocationAggregate>,
    pub total_allocated: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesImportData {
    pub source_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(flatten)]
    pub result: SalesImportResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingAddedData {
    pub mapping: KitchenMapping,
    pub row_index: usize,
}
