use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::config::{LedgerConfig, SheetNames};
use crate::migrations::{EXPECTED_USER_VERSION, REQUIRED_META_KEYS, REQUIRED_TABLES, run_pending};
use crate::schema::{verify_workbook, workbook_tables};
use crate::state::{
    ensure_ledger_directory, map_sqlite_error, open_connection, resolve_ledger_home,
    workbook_db_path,
};
use crate::store::{ColumnRange, SheetStore, SqliteSheetStore};
use crate::{ClientError, ClientResult};

/// Everything a command needs after the workbook is known to be usable.
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub config: LedgerConfig,
    /// Sheets that were empty and received their default header row.
    pub seeded_sheets: Vec<String>,
}

impl SetupContext {
    pub fn open_store(&self) -> ClientResult<SqliteSheetStore> {
        SqliteSheetStore::open(&self.db_path)
    }
}

pub fn ensure_initialized(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    let home = resolve_ledger_home(home_override)?;
    ensure_ledger_directory(&home)?;
    let config = LedgerConfig::load(&home)?;

    let db_path = workbook_db_path(&home);
    let mut connection = open_connection(&db_path)?;
    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;
    verify_tables(&connection, &db_path)?;
    repair_meta(&connection, &db_path)?;
    verify_meta(&connection, &db_path)?;
    drop(connection);

    let store = SqliteSheetStore::open(&db_path)?;
    let seeded_sheets = seed_default_headers(&store, &config.sheets)?;
    verify_workbook(&store, &config.sheets)?;

    debug!(home = %home.display(), "workbook ready");
    Ok(SetupContext {
        home,
        db_path,
        config,
        seeded_sheets,
    })
}

/// Writes the default header row into every configured sheet that has no
/// rows at all. Sheets with content are left alone, even when their header
/// is wrong; `verify_workbook` reports those.
pub fn seed_default_headers(store: &dyn SheetStore, names: &SheetNames) -> ClientResult<Vec<String>> {
    let mut seeded = Vec::new();
    for (sheet, table) in workbook_tables(names) {
        if !store.get_rows(sheet, ColumnRange::between(0, 0))?.is_empty() {
            continue;
        }
        store.append_row(sheet, &table.default_header())?;
        info!(sheet, "seeded default header row");
        seeded.push(sheet.to_string());
    }
    Ok(seeded)
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    match error {
        rusqlite_migration::Error::RusqliteError { query: _, err } => {
            let mapped = map_sqlite_error(db_path, err);
            if mapped.code == "store_unavailable" || mapped.code == "store_misconfigured" {
                mapped
            } else {
                ClientError::store_misconfigured(db_path, &error.to_string())
            }
        }
        _ => ClientError::store_misconfigured(db_path, &error.to_string()),
    }
}

fn verify_tables(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (table_name, required_columns) in REQUIRED_TABLES {
        let columns = table_columns(connection, table_name, db_path)?;
        if columns.is_empty() {
            return Err(ClientError::store_misconfigured(
                db_path,
                &format!("required table `{table_name}` is missing"),
            ));
        }
        for required_column in required_columns {
            if !columns.iter().any(|column| column == required_column) {
                return Err(ClientError::store_misconfigured(
                    db_path,
                    &format!("table `{table_name}` lacks column `{required_column}`"),
                ));
            }
        }
    }
    Ok(())
}

fn repair_meta(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (meta_key, default_value) in REQUIRED_META_KEYS {
        connection
            .execute(
                "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                params![meta_key, default_value],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }
    Ok(())
}

fn verify_meta(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    let user_version = connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if user_version != EXPECTED_USER_VERSION {
        return Err(ClientError::store_misconfigured(
            db_path,
            &format!("workbook schema version {user_version} is not {EXPECTED_USER_VERSION}"),
        ));
    }

    for (meta_key, expected_value) in REQUIRED_META_KEYS {
        let value = connection
            .query_row(
                "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
                [meta_key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        if value.as_deref() != Some(expected_value) {
            return Err(ClientError::store_misconfigured(
                db_path,
                &format!("workbook metadata `{meta_key}` is not `{expected_value}`"),
            ));
        }
    }
    Ok(())
}

fn table_columns(connection: &Connection, table_name: &str, db_path: &Path) -> ClientResult<Vec<String>> {
    let mut statement = connection
        .prepare(&format!("PRAGMA table_info({table_name})"))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{ensure_initialized, seed_default_headers};
    use crate::config::SheetNames;
    use crate::store::{MemorySheetStore, SheetStore};

    #[test]
    fn first_run_seeds_every_sheet_and_second_run_seeds_none() {
        let temp = tempdir();
        assert!(temp.is_ok());
        if let Ok(temp) = temp {
            let home = temp.path().join("ledger");
            let first = ensure_initialized(Some(&home));
            assert!(first.is_ok());
            if let Ok(context) = first {
                assert_eq!(context.seeded_sheets.len(), 5);
                assert!(context.db_path.exists());
            }

            let second = ensure_initialized(Some(&home));
            assert!(second.is_ok());
            if let Ok(context) = second {
                assert!(context.seeded_sheets.is_empty());
            }
        }
    }

    #[test]
    fn invalid_config_stops_setup() {
        let temp = tempdir();
        assert!(temp.is_ok());
        if let Ok(temp) = temp {
            let written = fs::write(temp.path().join("config.toml"), "[sheets]\nbogus = 1\n");
            assert!(written.is_ok());
            let result = ensure_initialized(Some(temp.path()));
            assert!(matches!(result, Err(error) if error.code == "config_invalid"));
        }
    }

    #[test]
    fn seeding_leaves_populated_sheets_alone() {
        let store = MemorySheetStore::new();
        store.seed("Orders", vec![vec!["Custom".to_string()]]);
        let seeded = seed_default_headers(&store, &SheetNames::default());
        assert!(seeded.is_ok());
        if let Ok(sheets) = seeded {
            assert_eq!(sheets.len(), 4);
            assert!(!sheets.contains(&"Orders".to_string()));
        }
        let orders = store.get_rows("Orders", crate::store::ColumnRange::ALL);
        assert!(matches!(orders, Ok(rows) if rows.len() == 1));
    }
}
