use std::collections::HashMap;

use crate::dates::normalize_import_date;
use crate::import::mapping::normalize_location;
use crate::import::validate::ValidSale;
use crate::records::KitchenSaleRecord;

/// `(ISO date, normalized location)`.
pub(crate) type DedupeKey = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DedupeReason {
    Batch,
    Existing,
}

#[derive(Debug, Clone)]
pub(crate) struct DuplicateSale {
    pub(crate) sale: ValidSale,
    pub(crate) reason: DedupeReason,
    /// Batch row number or store row index of the record this one repeats.
    pub(crate) matched: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DedupeResult {
    pub(crate) insertable: Vec<ValidSale>,
    pub(crate) duplicates: Vec<DuplicateSale>,
}

pub(crate) fn dedupe_key(date: &str, location: &str) -> DedupeKey {
    (date.to_string(), normalize_location(location))
}

/// Keys of the rows already in the store. Dates stored in another spelling
/// are normalized before comparison.
pub(crate) fn existing_keys(records: &[KitchenSaleRecord]) -> HashMap<DedupeKey, usize> {
    let mut keys = HashMap::new();
    for record in records {
        let date = normalize_import_date(&record.date).unwrap_or_else(|| record.date.trim().to_string());
        keys.entry(dedupe_key(&date, &record.location))
            .or_insert(record.row_index);
    }
    keys
}

/// Splits validated rows into the ones to append and the repeats, checking
/// each against the store first and then against earlier rows of the batch.
pub(crate) fn dedupe_sales(
    sales: Vec<ValidSale>,
    existing: &HashMap<DedupeKey, usize>,
) -> DedupeResult {
    let mut seen_in_batch: HashMap<DedupeKey, usize> = HashMap::new();
    let mut result = DedupeResult::default();

    for sale in sales {
        let key = dedupe_key(&sale.date, &sale.location);
        if let Some(row_index) = existing.get(&key) {
            result.duplicates.push(DuplicateSale {
                sale,
                reason: DedupeReason::Existing,
                matched: *row_index,
            });
            continue;
        }
        if let Some(batch_row) = seen_in_batch.get(&key) {
            result.duplicates.push(DuplicateSale {
                sale,
                reason: DedupeReason::Batch,
                matched: *batch_row,
            });
            continue;
        }

        seen_in_batch.insert(key, sale.row);
        result.insertable.push(sale);
    }
    result
}
