//! Kitchen sales import: parse → validate → map location → dedupe → append.
//!
//! Re-running an import with overlapping rows is safe. A row whose
//! `(date, location)` is already in the KitchenSales sheet, or that repeats an
//! earlier row of the same batch, is skipped rather than appended again.

pub(crate) mod dedupe;
pub(crate) mod input;
pub(crate) mod mapping;
pub(crate) mod parse;
pub(crate) mod persist;
pub(crate) mod validate;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ClientResult;
use crate::import::dedupe::{DedupeReason, dedupe_sales, existing_keys};
use crate::import::mapping::LocationResolver;
use crate::import::persist::{PendingSale, append_sales};
use crate::import::validate::validate_row;
use crate::ledger::Ledger;
use crate::records::{read_kitchen_mappings, read_kitchen_sales};
use crate::schema::col;
use crate::store::CellWrite;

pub use mapping::add_kitchen_mapping;
pub use parse::RawSaleRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidRow,
    DuplicateInBatch,
    DuplicateExisting,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesImportResult {
    pub dry_run: bool,
    pub rows_read: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub unmapped_locations: Vec<String>,
    pub skipped_rows: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillResult {
    pub updated: usize,
    pub still_unmapped: Vec<String>,
}

/// Imports sale rows into the KitchenSales sheet. Rows that fail validation
/// or repeat a known `(date, location)` count as `skipped`; only append
/// failures land in `errors`. With `dry_run` nothing is written and
/// `imported` reports what would have been appended.
pub fn import_sales_rows(
    ledger: &Ledger<'_>,
    rows: &[RawSaleRow],
    dry_run: bool,
) -> ClientResult<SalesImportResult> {
    let sales_sheet = &ledger.sheets().kitchen_sales;
    let existing = read_kitchen_sales(ledger.store(), sales_sheet)?;
    let mappings = read_kitchen_mappings(ledger.store(), &ledger.sheets().kitchen_mapping)?;
    let resolver = LocationResolver::new(mappings.records);

    let mut skipped_rows = Vec::new();
    let mut valid = Vec::with_capacity(rows.len());
    for raw in rows {
        match validate_row(raw) {
            Ok(sale) => valid.push(sale),
            Err(detail) => {
                debug!(row = raw.row, detail = %detail, "sale row rejected");
                skipped_rows.push(SkippedRow {
                    row: raw.row,
                    reason: SkipReason::InvalidRow,
                    date: raw.date.as_deref().map(str::trim).map(str::to_string),
                    location: raw.location.as_deref().map(str::trim).map(str::to_string),
                    detail,
                });
            }
        }
    }

    let deduped = dedupe_sales(valid, &existing_keys(&existing.records));
    for duplicate in deduped.duplicates {
        let (reason, detail) = match duplicate.reason {
            DedupeReason::Existing => (
                SkipReason::DuplicateExisting,
                format!("already recorded at sheet row {}", duplicate.matched),
            ),
            DedupeReason::Batch => (
                SkipReason::DuplicateInBatch,
                format!("repeats input row {}", duplicate.matched),
            ),
        };
        debug!(row = duplicate.sale.row, ?reason, "sale row skipped as duplicate");
        skipped_rows.push(SkippedRow {
            row: duplicate.sale.row,
            reason,
            date: Some(duplicate.sale.date),
            location: Some(duplicate.sale.location),
            detail,
        });
    }
    skipped_rows.sort_by_key(|skipped| skipped.row);

    let mut unmapped = Vec::<String>::new();
    let pending = deduped
        .insertable
        .into_iter()
        .map(|sale| {
            let franchise_code = match resolver.resolve(&sale.location) {
                Some(found) => {
                    debug!(location = %sale.location, code = %found.mapping.franchise_code, kind = ?found.kind, "location mapped");
                    Some(found.mapping.franchise_code.trim().to_string())
                }
                None => {
                    if !unmapped.contains(&sale.location) {
                        unmapped.push(sale.location.clone());
                    }
                    None
                }
            };
            PendingSale {
                sale,
                franchise_code,
            }
        })
        .collect::<Vec<PendingSale>>();

    if !unmapped.is_empty() {
        warn!(locations = ?unmapped, "sales imported without a franchise code");
    }

    let (imported, errors) = if dry_run {
        (pending.len(), Vec::new())
    } else {
        let persisted = append_sales(ledger, &existing.schema, &pending);
        (persisted.appended, persisted.errors)
    };

    let result = SalesImportResult {
        dry_run,
        rows_read: rows.len(),
        imported,
        skipped: skipped_rows.len(),
        errors,
        unmapped_locations: unmapped,
        skipped_rows,
    };
    info!(
        dry_run,
        imported = result.imported,
        skipped = result.skipped,
        errors = result.errors.len(),
        "sales import finished"
    );
    Ok(result)
}

/// Fills blank franchise codes on existing KitchenSales rows from the
/// current mapping table. Each row is its own single-cell write.
pub fn backfill_franchise_codes(ledger: &Ledger<'_>) -> ClientResult<BackfillResult> {
    let sales_sheet = &ledger.sheets().kitchen_sales;
    let sales = read_kitchen_sales(ledger.store(), sales_sheet)?;
    let mappings = read_kitchen_mappings(ledger.store(), &ledger.sheets().kitchen_mapping)?;
    let resolver = LocationResolver::new(mappings.records);

    let blank = sales
        .records
        .iter()
        .filter(|record| record.franchise_code.is_none())
        .collect::<Vec<_>>();
    if blank.is_empty() {
        return Ok(BackfillResult {
            updated: 0,
            still_unmapped: Vec::new(),
        });
    }
    let column = sales.schema.writable(col::FRANCHISE_CODE)?;

    let mut updated = 0;
    let mut still_unmapped = BTreeSet::new();
    for record in blank {
        match resolver.resolve(&record.location) {
            Some(found) => {
                ledger.store().write_cells(
                    sales_sheet,
                    record.row_index,
                    &[CellWrite::new(column, found.mapping.franchise_code.trim())],
                )?;
                updated += 1;
            }
            None => {
                still_unmapped.insert(record.location.clone());
            }
        }
    }

    info!(updated, unmapped = still_unmapped.len(), "franchise codes backfilled");
    Ok(BackfillResult {
        updated,
        still_unmapped: still_unmapped.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::{RawSaleRow, SkipReason, backfill_franchise_codes, import_sales_rows};
    use crate::config::LedgerConfig;
    use crate::ledger::Ledger;
    use crate::schema::{KITCHEN_MAPPING, KITCHEN_SALES};
    use crate::store::MemorySheetStore;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn store_with_mapping() -> MemorySheetStore {
        let store = MemorySheetStore::new();
        store.seed("KitchenSales", vec![KITCHEN_SALES.default_header()]);
        store.seed(
            "KitchenMapping",
            vec![
                KITCHEN_MAPPING.default_header(),
                cells(&["Downtown", "FR-01", "Downtown Kitchen", "TRUE", ""]),
            ],
        );
        store
    }

    fn raw(row: usize, date: &str, location: &str, revenue: &str, count: &str) -> RawSaleRow {
        RawSaleRow {
            row,
            date: Some(date.to_string()),
            location: Some(location.to_string()),
            revenue: Some(revenue.to_string()),
            gross_sales: None,
            count: Some(count.to_string()),
        }
    }

    #[test]
    fn second_import_of_same_rows_skips_everything() {
        let store = store_with_mapping();
        let config = LedgerConfig::default();
        let ledger = Ledger::new(&store, &config);
        let rows = vec![
            raw(1, "2024-03-01", "Downtown", "100", "10"),
            raw(2, "2024-03-02", "Downtown", "110", "11"),
            raw(3, "2024-03-01", "Main St", "120.5", "14"),
        ];

        let first = import_sales_rows(&ledger, &rows, false);
        assert!(first.is_ok());
        if let Ok(result) = first {
            assert_eq!((result.imported, result.skipped), (3, 0));
        }

        let second = import_sales_rows(&ledger, &rows, false);
        assert!(second.is_ok());
        if let Ok(result) = second {
            assert_eq!((result.imported, result.skipped), (0, 3));
            assert!(
                result
                    .skipped_rows
                    .iter()
                    .all(|skipped| skipped.reason == SkipReason::DuplicateExisting)
            );
        }
        assert_eq!(store.rows("KitchenSales").len(), 4);
    }

    #[test]
    fn unmapped_location_is_imported_and_reported() {
        let store = store_with_mapping();
        let config = LedgerConfig::default();
        let ledger = Ledger::new(&store, &config);

        let result = import_sales_rows(&ledger, &[raw(1, "2024-03-01", "Main St", "120.5", "14")], false);
        assert!(result.is_ok());
        if let Ok(result) = result {
            assert_eq!(result.imported, 1);
            assert_eq!(result.unmapped_locations, vec!["Main St".to_string()]);
            assert!(result.errors.is_empty());
        }
        let rows = store.rows("KitchenSales");
        assert_eq!(rows[1], cells(&["2024-03-01", "Main St", "120.50", "14", "120.50", ""]));
    }

    #[test]
    fn invalid_and_repeated_rows_are_skipped_with_reasons() {
        let store = store_with_mapping();
        let config = LedgerConfig::default();
        let ledger = Ledger::new(&store, &config);
        let rows = vec![
            raw(1, "2024-03-01", "downtown", "100", "10"),
            raw(2, "2024-03-01", "Downtown ", "100", "10"),
            raw(3, "2024-03-01", "Uptown", "lots", "10"),
        ];

        let result = import_sales_rows(&ledger, &rows, false);
        assert!(result.is_ok());
        if let Ok(result) = result {
            assert_eq!(result.imported, 1);
            assert_eq!(result.skipped, 2);
            assert!(result.errors.is_empty());
            let reasons = result
                .skipped_rows
                .iter()
                .map(|skipped| (skipped.row, skipped.reason))
                .collect::<Vec<_>>();
            assert_eq!(
                reasons,
                vec![(2, SkipReason::DuplicateInBatch), (3, SkipReason::InvalidRow)]
            );
        }
        assert_eq!(store.rows("KitchenSales")[1][5], "FR-01");
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let store = store_with_mapping();
        let config = LedgerConfig::default();
        let ledger = Ledger::new(&store, &config);

        let result = import_sales_rows(&ledger, &[raw(1, "2024-03-01", "Downtown", "100", "10")], true);
        assert!(result.is_ok());
        if let Ok(result) = result {
            assert!(result.dry_run);
            assert_eq!(result.imported, 1);
        }
        assert_eq!(store.write_batches(), 0);
    }

    #[test]
    fn backfill_fills_codes_once_a_mapping_exists() {
        let store = store_with_mapping();
        let config = LedgerConfig::default();
        let ledger = Ledger::new(&store, &config);
        let imported = import_sales_rows(
            &ledger,
            &[
                raw(1, "2024-03-01", "Main St", "120.5", "14"),
                raw(2, "2024-03-01", "Elm Rd", "80", "6"),
            ],
            false,
        );
        assert!(imported.is_ok());

        let mut mapping_rows = store.rows("KitchenMapping");
        mapping_rows.push(cells(&["main st", "FR-09", "", "", ""]));
        store.seed("KitchenMapping", mapping_rows);

        let backfilled = backfill_franchise_codes(&ledger);
        assert!(backfilled.is_ok());
        if let Ok(result) = backfilled {
            assert_eq!(result.updated, 1);
            assert_eq!(result.still_unmapped, vec!["Elm Rd".to_string()]);
        }
        assert_eq!(store.rows("KitchenSales")[1][5], "FR-09");
    }
}
