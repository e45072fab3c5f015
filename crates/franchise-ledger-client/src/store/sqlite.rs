use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};

use crate::state::{map_sqlite_error, open_connection};
use crate::store::{CellWrite, ColumnRange, RowAppend, SheetStore};
use crate::{ClientError, ClientResult};

/// Workbook persisted as one SQLite file of sheet cells.
///
/// Each write batch runs in its own IMMEDIATE transaction, so a logical
/// update lands completely or not at all.
pub struct SqliteSheetStore {
    connection: Connection,
    db_path: PathBuf,
}

impl SqliteSheetStore {
    /// Opens an already-initialized workbook. Run `setup::ensure_initialized`
    /// first to apply migrations.
    pub fn open(db_path: &Path) -> ClientResult<Self> {
        let connection = open_connection(db_path)?;
        Ok(Self {
            connection,
            db_path: db_path.to_path_buf(),
        })
    }

    fn begin(&self) -> ClientResult<Transaction<'_>> {
        Transaction::new_unchecked(&self.connection, TransactionBehavior::Immediate)
            .map_err(|error| map_sqlite_error(&self.db_path, &error))
    }
}

impl SheetStore for SqliteSheetStore {
    fn get_rows(&self, sheet: &str, range: ColumnRange) -> ClientResult<Vec<Vec<String>>> {
        let db_path = &self.db_path;
        let mut row_statement = self
            .connection
            .prepare("SELECT row_index FROM sheet_rows WHERE sheet_name = ?1 ORDER BY row_index")
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        let row_iter = row_statement
            .query_map([sheet], |row| row.get::<_, i64>(0))
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        let mut rows: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for row_index in row_iter {
            let index = row_index.map_err(|error| map_sqlite_error(db_path, &error))?;
            rows.insert(index, Vec::new());
        }

        let mut cell_statement = self
            .connection
            .prepare(
                "SELECT row_index, column_index, value
                 FROM sheet_cells
                 WHERE sheet_name = ?1
                 ORDER BY row_index, column_index",
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        let cell_iter = cell_statement
            .query_map([sheet], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        for cell in cell_iter {
            let (row_index, column_index, value) =
                cell.map_err(|error| map_sqlite_error(db_path, &error))?;
            let Some(row) = rows.get_mut(&row_index) else {
                continue;
            };
            let column = usize::try_from(column_index).unwrap_or(0);
            if row.len() <= column {
                row.resize(column + 1, String::new());
            }
            row[column] = value;
        }

        Ok(rows.into_values().map(|row| range.slice(&row)).collect())
    }

    fn write_cells(&self, sheet: &str, row_index: usize, writes: &[CellWrite]) -> ClientResult<()> {
        let db_path = &self.db_path;
        let row_key = row_index as i64;
        let transaction = self.begin()?;

        let exists = transaction
            .query_row(
                "SELECT 1 FROM sheet_rows WHERE sheet_name = ?1 AND row_index = ?2",
                params![sheet, row_key],
                |_row| Ok(true),
            )
            .optional()
            .map_err(|error| map_sqlite_error(db_path, &error))?
            .unwrap_or(false);
        if !exists {
            return Err(ClientError::internal_store(&format!(
                "Row {row_index} does not exist in sheet `{sheet}`."
            )));
        }

        for write in writes {
            upsert_cell(&transaction, db_path, sheet, row_key, write.column, &write.value)?;
        }

        transaction
            .commit()
            .map_err(|error| map_sqlite_error(db_path, &error))
    }

    fn append_row(&self, sheet: &str, values: &[String]) -> ClientResult<usize> {
        let transaction = self.begin()?;
        let index = insert_row(&transaction, &self.db_path, sheet, values)?;
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
        Ok(index)
    }

    fn append_rows(&self, rows: &[RowAppend<'_>]) -> ClientResult<Vec<usize>> {
        let transaction = self.begin()?;
        let mut indexes = Vec::with_capacity(rows.len());
        for row in rows {
            indexes.push(insert_row(&transaction, &self.db_path, row.sheet, &row.values)?);
        }
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(&self.db_path, &error))?;
        Ok(indexes)
    }
}

/// Inserts `values` after the last row of `sheet` inside `transaction`.
fn insert_row(
    transaction: &Transaction<'_>,
    db_path: &Path,
    sheet: &str,
    values: &[String],
) -> ClientResult<usize> {
    let next_index = transaction
        .query_row(
            "SELECT COALESCE(MAX(row_index) + 1, 0) FROM sheet_rows WHERE sheet_name = ?1",
            [sheet],
            |row| row.get::<_, i64>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    transaction
        .execute(
            "INSERT INTO sheet_rows (sheet_name, row_index) VALUES (?1, ?2)",
            params![sheet, next_index],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    for (column, value) in values.iter().enumerate() {
        upsert_cell(transaction, db_path, sheet, next_index, column, value)?;
    }

    Ok(usize::try_from(next_index).unwrap_or(0))
}

fn upsert_cell(
    transaction: &Transaction<'_>,
    db_path: &Path,
    sheet: &str,
    row_index: i64,
    column: usize,
    value: &str,
) -> ClientResult<()> {
    transaction
        .execute(
            "INSERT INTO sheet_cells (sheet_name, row_index, column_index, value)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (sheet_name, row_index, column_index)
             DO UPDATE SET value = excluded.value",
            params![sheet, row_index, column as i64, value],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}
