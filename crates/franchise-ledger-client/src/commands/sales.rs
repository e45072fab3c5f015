use std::path::Path;

use crate::ClientResult;
use crate::commands::common::with_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::SalesImportData;
use crate::import::input::resolve_source;
use crate::import::parse::parse_source;
use crate::import::{backfill_franchise_codes, import_sales_rows};

#[derive(Debug, Default)]
pub struct SalesImportOptions<'a> {
    /// File path, or `-` for stdin.
    pub path: String,
    pub dry_run: bool,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<String>,
}

#[derive(Debug, Default)]
pub struct SalesBackfillOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn import(options: SalesImportOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let source = resolve_source(&options.path, options.stdin_override)?;
    let rows = parse_source(&source.content)?;
    let result = with_ledger(options.home_override, |ledger| {
        import_sales_rows(ledger, &rows, options.dry_run)
    })?;
    success(
        "sales import",
        SalesImportData {
            source_kind: source.kind.as_str().to_string(),
            source_ref: source.source_ref,
            result,
        },
    )
}

pub fn backfill(options: SalesBackfillOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let result = with_ledger(options.home_override, backfill_franchise_codes)?;
    success("sales backfill", result)
}
