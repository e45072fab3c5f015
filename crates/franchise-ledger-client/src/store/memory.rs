use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::store::{CellWrite, ColumnRange, RowAppend, SheetStore};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
struct MemoryState {
    sheets: BTreeMap<String, Vec<Vec<String>>>,
    write_batches: usize,
}

/// In-process workbook. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySheetStore {
    state: Mutex<MemoryState>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents of `sheet` without counting as a write batch.
    pub fn seed(&self, sheet: &str, rows: Vec<Vec<String>>) {
        if let Ok(mut state) = self.state.lock() {
            state.sheets.insert(sheet.to_string(), rows);
        }
    }

    /// Snapshot of `sheet`, header included.
    pub fn rows(&self, sheet: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.sheets.get(sheet).cloned())
            .unwrap_or_default()
    }

    /// Number of write or append batches applied so far.
    pub fn write_batches(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.write_batches)
            .unwrap_or(0)
    }

    fn lock(&self) -> ClientResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| ClientError::internal_store("In-memory workbook lock was poisoned."))
    }
}

impl SheetStore for MemorySheetStore {
    fn get_rows(&self, sheet: &str, range: ColumnRange) -> ClientResult<Vec<Vec<String>>> {
        let state = self.lock()?;
        Ok(state
            .sheets
            .get(sheet)
            .map(|rows| rows.iter().map(|row| range.slice(row)).collect())
            .unwrap_or_default())
    }

    fn write_cells(&self, sheet: &str, row_index: usize, writes: &[CellWrite]) -> ClientResult<()> {
        let mut state = self.lock()?;
        let Some(row) = state
            .sheets
            .get_mut(sheet)
            .and_then(|rows| rows.get_mut(row_index))
        else {
            return Err(ClientError::internal_store(&format!(
                "Row {row_index} does not exist in sheet `{sheet}`."
            )));
        };

        for write in writes {
            if row.len() <= write.column {
                row.resize(write.column + 1, String::new());
            }
            row[write.column] = write.value.clone();
        }
        state.write_batches += 1;
        Ok(())
    }

    fn append_row(&self, sheet: &str, values: &[String]) -> ClientResult<usize> {
        let mut state = self.lock()?;
        let rows = state.sheets.entry(sheet.to_string()).or_default();
        rows.push(values.to_vec());
        let index = rows.len() - 1;
        state.write_batches += 1;
        Ok(index)
    }

    fn append_rows(&self, rows: &[RowAppend<'_>]) -> ClientResult<Vec<usize>> {
        let mut state = self.lock()?;
        let mut indexes = Vec::with_capacity(rows.len());
        for row in rows {
            let sheet = state.sheets.entry(row.sheet.to_string()).or_default();
            sheet.push(row.values.clone());
            indexes.push(sheet.len() - 1);
        }
        state.write_batches += 1;
        Ok(indexes)
    }
}
