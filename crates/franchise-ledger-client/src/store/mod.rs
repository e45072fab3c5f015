//! Row-oriented tabular store the ledger reads from and writes to.
//!
//! Every sheet keeps its header at row 0. Callers hold a `&dyn SheetStore`
//! that was constructed explicitly and passed in; nothing in the crate
//! reaches for a global handle.

mod memory;
mod sqlite;

pub use memory::MemorySheetStore;
pub use sqlite::SqliteSheetStore;

use crate::ClientResult;
use crate::recon::normalize::normalize_invoice_number;

/// Inclusive range of zero-based column indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub first: usize,
    pub last: Option<usize>,
}

impl ColumnRange {
    pub const ALL: Self = Self {
        first: 0,
        last: None,
    };

    pub fn between(first: usize, last: usize) -> Self {
        Self {
            first,
            last: Some(last),
        }
    }

    pub(crate) fn slice(&self, row: &[String]) -> Vec<String> {
        let end = match self.last {
            Some(last) => (last + 1).min(row.len()),
            None => row.len(),
        };
        if self.first >= end {
            return Vec::new();
        }
        row[self.first..end].to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub column: usize,
    pub value: String,
}

impl CellWrite {
    pub fn new(column: usize, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// One row to append as part of an `append_rows` batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAppend<'a> {
    pub sheet: &'a str,
    pub values: Vec<String>,
}

impl<'a> RowAppend<'a> {
    pub fn new(sheet: &'a str, values: Vec<String>) -> Self {
        Self { sheet, values }
    }
}

pub trait SheetStore {
    /// Returns every row of `sheet`, header included, restricted to `range`.
    /// A sheet that does not exist yet reads as empty.
    fn get_rows(&self, sheet: &str, range: ColumnRange) -> ClientResult<Vec<Vec<String>>>;

    /// Applies all `writes` to one row as a single atomic batch. Columns not
    /// named in `writes` keep their current values.
    fn write_cells(&self, sheet: &str, row_index: usize, writes: &[CellWrite]) -> ClientResult<()>;

    /// Appends `values` after the last row and returns the new row index.
    fn append_row(&self, sheet: &str, values: &[String]) -> ClientResult<usize>;

    /// Appends every row in `rows`, possibly across several sheets, as one
    /// atomic batch. Returns the new row indexes in input order. When any
    /// append fails no row from the batch is kept.
    fn append_rows(&self, rows: &[RowAppend<'_>]) -> ClientResult<Vec<usize>>;

    /// Finds the first data row whose cell in `column` normalizes to
    /// `normalized_value`.
    fn find_row_index(
        &self,
        sheet: &str,
        column: usize,
        normalized_value: &str,
    ) -> ClientResult<Option<usize>> {
        let rows = self.get_rows(sheet, ColumnRange::ALL)?;
        Ok(rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| {
                row.get(column)
                    .map(|cell| normalize_invoice_number(cell) == normalized_value)
                    .unwrap_or(false)
            })
            .map(|(index, _)| index))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnRange, MemorySheetStore, SheetStore};

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn column_range_slices_inclusive_bounds() {
        let row = cells(&["a", "b", "c", "d"]);
        assert_eq!(ColumnRange::between(1, 2).slice(&row), cells(&["b", "c"]));
        assert_eq!(ColumnRange::between(2, 9).slice(&row), cells(&["c", "d"]));
        assert!(ColumnRange::between(5, 6).slice(&row).is_empty());
        assert_eq!(ColumnRange::ALL.slice(&row).len(), 4);
    }

    #[test]
    fn find_row_index_normalizes_cells_and_skips_header() {
        let store = MemorySheetStore::new();
        store.seed("Orders", vec![cells(&["#1005"]), cells(&["1004"]), cells(&[" #1005 "])]);

        let found = store.find_row_index("Orders", 0, "1005");
        assert!(found.is_ok());
        if let Ok(index) = found {
            assert_eq!(index, Some(2));
        }

        let missing = store.find_row_index("Orders", 0, "9999");
        assert!(matches!(missing, Ok(None)));
    }
}
