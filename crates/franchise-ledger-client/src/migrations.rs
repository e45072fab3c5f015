use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");
const SHEET_CELLS_COLUMN_INDEX_SQL: &str =
    include_str!("migrations/0002_sheet_cells_column_index.sql");

pub const REQUIRED_TABLES: [(&str, &[&str]); 3] = [
    ("internal_meta", &["key", "value"]),
    ("sheet_rows", &["sheet_name", "row_index"]),
    (
        "sheet_cells",
        &["sheet_name", "row_index", "column_index", "value"],
    ),
];

pub const REQUIRED_META_KEYS: [(&str, &str); 1] = [("workbook_format", "v1")];

pub const EXPECTED_USER_VERSION: i64 = 2;

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![
        M::up(BOOTSTRAP_SQL),
        M::up(SHEET_CELLS_COLUMN_INDEX_SQL),
    ]);
    migrations.to_latest(conn)
}
