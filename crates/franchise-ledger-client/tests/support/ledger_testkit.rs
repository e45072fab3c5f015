#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use franchise_ledger_client::ClientResult;
use franchise_ledger_client::SuccessEnvelope;
use franchise_ledger_client::commands::invoices::{self, InvoiceRecordOptions, parse_entry};
use franchise_ledger_client::commands::orders::{self, OrderCreateOptions};
use franchise_ledger_client::entry::NewOrder;
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub fn temp_home_in_tmp(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir_in("/tmp")?;
    let home = dir.path().join("ledger-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn payload(result: ClientResult<SuccessEnvelope>) -> Value {
    assert!(result.is_ok(), "{:?}", result.as_ref().err());
    if let Ok(success) = result {
        let value = serde_json::to_value(success);
        assert!(value.is_ok());
        if let Ok(value) = value {
            return value;
        }
    }
    Value::Null
}

pub fn create_order(home: &Path, sales_invoice_no: &str) {
    let created = orders::create(OrderCreateOptions {
        order: NewOrder {
            sales_invoice_no: sales_invoice_no.to_string(),
            brand: Some("Harbour Bakes".to_string()),
            ..NewOrder::default()
        },
        home_override: Some(home),
    });
    assert!(created.is_ok());
}

/// Records invoices from `NO:SUPPLIER:AMOUNT[:ALLOCATED]` entries.
pub fn record_invoices(home: &Path, sales_invoice_no: &str, entries: &[&str]) {
    let mut parsed = Vec::new();
    for text in entries {
        let entry = parse_entry(text);
        assert!(entry.is_ok());
        if let Ok(entry) = entry {
            parsed.push(entry);
        }
    }
    let recorded = invoices::record(InvoiceRecordOptions {
        sales_invoice_no: sales_invoice_no.to_string(),
        entries: parsed,
        home_override: Some(home),
    });
    assert!(recorded.is_ok());
}

pub fn write_fixture(base: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
    let path = base.join(name);
    fs::write(&path, body)?;
    Ok(path)
}
