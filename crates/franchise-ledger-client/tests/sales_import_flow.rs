mod support;

use franchise_ledger_client::commands::mapping::{self, MappingAddOptions};
use franchise_ledger_client::commands::sales::{self, SalesBackfillOptions, SalesImportOptions};
use franchise_ledger_client::records::KitchenMapping;
use support::ledger_testkit::{payload, temp_home_in_tmp, write_fixture};

const SALES_CSV: &str = "Date,Location,Revenue,Gross Sales,Count\n\
2024-03-01,Downtown,100,110,10\n\
2024-03-01,Main St,120.5,,14\n\
03/02/2024,downtown,90,,9\n\
2024-03-02,Elm Rd,not-a-number,,3\n";

fn add_mapping(home: &std::path::Path, location: &str, code: &str) {
    let added = mapping::add(MappingAddOptions {
        mapping: KitchenMapping {
            location: location.to_string(),
            franchise_code: code.to_string(),
            franchise_name: None,
            active: true,
            notes: None,
        },
        home_override: Some(home),
    });
    assert!(added.is_ok());
}

#[test]
fn reimporting_the_same_file_skips_every_valid_row() {
    let temp = temp_home_in_tmp("franchise-ledger-import");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        add_mapping(&home, "Downtown", "FR-01");
        let fixture = write_fixture(dir.path(), "sales.csv", SALES_CSV);
        assert!(fixture.is_ok());
        if let Ok(path) = fixture {
            let run = || {
                payload(sales::import(SalesImportOptions {
                    path: path.display().to_string(),
                    home_override: Some(&home),
                    ..SalesImportOptions::default()
                }))
            };

            let first = run();
            assert_eq!(first["data"]["source_kind"], "file");
            assert_eq!(first["data"]["imported"], 3);
            assert_eq!(first["data"]["skipped"], 1);
            assert_eq!(first["data"]["skipped_rows"][0]["reason"], "invalid_row");
            assert_eq!(first["data"]["unmapped_locations"][0], "Main St");

            let second = run();
            assert_eq!(second["data"]["imported"], 0);
            assert_eq!(second["data"]["skipped"], 4);
        }
    }
}

#[test]
fn stdin_dry_run_writes_nothing() {
    let temp = temp_home_in_tmp("franchise-ledger-dry-run");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let body = r#"[{"Date":"2024-03-01","Location":"Main St","Revenue":120.5,"Count":14}]"#;
        let dry = payload(sales::import(SalesImportOptions {
            path: "-".to_string(),
            dry_run: true,
            home_override: Some(&home),
            stdin_override: Some(body.to_string()),
        }));
        assert_eq!(dry["data"]["dry_run"], true);
        assert_eq!(dry["data"]["imported"], 1);

        let real = payload(sales::import(SalesImportOptions {
            path: "-".to_string(),
            dry_run: false,
            home_override: Some(&home),
            stdin_override: Some(body.to_string()),
        }));
        assert_eq!(real["data"]["imported"], 1);
        assert_eq!(real["data"]["unmapped_locations"][0], "Main St");
    }
}

#[test]
fn backfill_picks_up_mappings_added_after_import() {
    let temp = temp_home_in_tmp("franchise-ledger-backfill");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let imported = sales::import(SalesImportOptions {
            path: "-".to_string(),
            home_override: Some(&home),
            stdin_override: Some("Date,Location,Revenue,Count\n2024-03-01,Main St,120.5,14\n".to_string()),
            ..SalesImportOptions::default()
        });
        assert!(imported.is_ok());

        add_mapping(&home, "main st", "FR-09");
        let backfilled = payload(sales::backfill(SalesBackfillOptions {
            home_override: Some(&home),
        }));
        assert_eq!(backfilled["data"]["updated"], 1);

        let again = payload(sales::backfill(SalesBackfillOptions {
            home_override: Some(&home),
        }));
        assert_eq!(again["data"]["updated"], 0);
    }
}
