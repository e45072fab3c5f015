mod support;

use franchise_ledger_client::ErrorCategory;
use franchise_ledger_client::setup::ensure_initialized;
use franchise_ledger_client::store::{CellWrite, ColumnRange, SheetStore};
use support::ledger_testkit::temp_home_in_tmp;

#[test]
fn renamed_required_header_fails_fast_as_configuration_error() {
    let temp = temp_home_in_tmp("franchise-ledger-setup");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let context = ensure_initialized(Some(&home));
        assert!(context.is_ok());
        if let Ok(context) = context {
            let store = context.open_store();
            assert!(store.is_ok());
            if let Ok(store) = store {
                let header = store.get_rows("Orders", ColumnRange::between(0, 10));
                assert!(header.is_ok());
                let stage_column = header
                    .ok()
                    .and_then(|rows| rows.first().and_then(|row| row.iter().position(|name| name == "Stage")));
                assert!(stage_column.is_some());
                if let Some(column) = stage_column {
                    assert!(store.write_cells("Orders", 0, &[CellWrite::new(column, "Status")]).is_ok());
                }
            }
        }

        let reopened = ensure_initialized(Some(&home));
        assert!(reopened.is_err());
        if let Err(error) = reopened {
            assert_eq!(error.code, "sheet_schema_mismatch");
            assert_eq!(error.category(), ErrorCategory::UpstreamConfiguration);
        }
    }
}

#[test]
fn config_file_renames_sheets() {
    let temp = temp_home_in_tmp("franchise-ledger-config");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let written = std::fs::write(
            home.join("config.toml"),
            "[sheets]\norders = \"Franchise Orders\"\n\n[reconciliation]\ndiscrepancy_epsilon = 0.5\n",
        );
        assert!(written.is_ok());

        let context = ensure_initialized(Some(&home));
        assert!(context.is_ok());
        if let Ok(context) = context {
            assert!(context.seeded_sheets.contains(&"Franchise Orders".to_string()));
            assert!(!context.seeded_sheets.contains(&"Orders".to_string()));
            assert_eq!(context.config.reconciliation.discrepancy_epsilon, 0.5);
        }
    }
}
