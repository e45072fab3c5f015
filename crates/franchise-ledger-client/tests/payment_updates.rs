mod support;

use franchise_ledger_client::commands::invoices::{self, InvoiceFileOptions, InvoiceUpdateOptions};
use franchise_ledger_client::commands::orders::{self, OrderPaidOptions, OrderStageOptions};
use franchise_ledger_client::payments::{PartnerPayment, SupplierInvoicePatch};
use franchise_ledger_client::setup::ensure_initialized;
use franchise_ledger_client::store::{ColumnRange, SheetStore};
use support::ledger_testkit::{create_order, payload, record_invoices, temp_home_in_tmp};

fn mark_paid(home: &std::path::Path, payment: PartnerPayment) -> serde_json::Value {
    payload(orders::paid(OrderPaidOptions {
        sales_invoice_no: "1005".to_string(),
        payment,
        home_override: Some(home),
    }))
}

#[test]
fn omitted_payment_fields_survive_a_second_call() {
    let temp = temp_home_in_tmp("franchise-ledger-paid");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        create_order(&home, "#1005");

        let first = mark_paid(
            &home,
            PartnerPayment {
                paid_date: Some("2024-01-15".to_string()),
                payment_method: Some("CASH".to_string()),
                ..PartnerPayment::default()
            },
        );
        assert_eq!(first["data"]["partner_paid"], true);

        let second = mark_paid(
            &home,
            PartnerPayment {
                payment_method: Some("bank_transfer".to_string()),
                ..PartnerPayment::default()
            },
        );
        let written = second["data"]["fields_written"].as_array().cloned().unwrap_or_default();
        assert_eq!(written.len(), 2);

        let third = mark_paid(&home, PartnerPayment::default());
        assert_eq!(third["data"]["fields_written"].as_array().map(Vec::len), Some(1));

        let store = ensure_initialized(Some(&home)).and_then(|context| context.open_store());
        assert!(store.is_ok());
        if let Ok(store) = store {
            let rows = store.get_rows("Orders", ColumnRange::ALL);
            assert!(rows.is_ok());
            if let Ok(rows) = rows {
                let header = &rows[0];
                let column = |name: &str| header.iter().position(|value| value == name);
                let order = &rows[1];
                assert_eq!(column("Partner Paid Date").map(|index| order[index].as_str()), Some("2024-01-15"));
                assert_eq!(
                    column("Partner Payment Method").map(|index| order[index].as_str()),
                    Some("BANK_TRANSFER")
                );
                assert_eq!(column("Partner Paid").map(|index| order[index].as_str()), Some("TRUE"));
            }
        }
    }
}

#[test]
fn rejected_payment_method_leaves_order_unpaid() {
    let temp = temp_home_in_tmp("franchise-ledger-btc");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        create_order(&home, "1005");

        let result = orders::paid(OrderPaidOptions {
            sales_invoice_no: "1005".to_string(),
            payment: PartnerPayment {
                payment_method: Some("BTC".to_string()),
                ..PartnerPayment::default()
            },
            home_override: Some(&home),
        });
        assert!(matches!(&result, Err(error) if error.code == "invalid_payment_method"));

        let store = ensure_initialized(Some(&home)).and_then(|context| context.open_store());
        assert!(store.is_ok());
        if let Ok(store) = store {
            let rows = store.get_rows("Orders", ColumnRange::ALL);
            assert!(rows.is_ok());
            if let Ok(rows) = rows {
                let header = &rows[0];
                let column = |name: &str| header.iter().position(|value| value == name);
                let order = &rows[1];
                assert_eq!(column("Partner Paid").map(|index| order[index].as_str()), Some("FALSE"));
                let method = column("Partner Payment Method").and_then(|index| order.get(index));
                assert!(method.is_none_or(|value| value.is_empty()));
            }
        }

        let stage = payload(orders::stage(OrderStageOptions {
            sales_invoice_no: "#1005".to_string(),
            stage: "In Transit".to_string(),
            home_override: Some(&home),
        }));
        assert_eq!(stage["data"]["previous_stage"], "New");
        assert_eq!(stage["data"]["stage"], "In Transit");

        let second = mark_paid(&home, PartnerPayment::default());
        assert_eq!(second["data"]["partner_paid"], true);
    }
}

#[test]
fn invoice_updates_write_only_supplied_fields() {
    let temp = temp_home_in_tmp("franchise-ledger-invoice");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        create_order(&home, "1005");
        record_invoices(&home, "1005", &["SI-1:Fresh Foods:300:300"]);

        let updated = payload(invoices::update(InvoiceUpdateOptions {
            invoice_no: "#SI-1".to_string(),
            patch: SupplierInvoicePatch {
                paid: Some(true),
                payment_reference: Some("TX-88".to_string()),
                ..SupplierInvoicePatch::default()
            },
            home_override: Some(&home),
            ..InvoiceUpdateOptions::default()
        }));
        let invoice = &updated["data"]["invoice"];
        assert_eq!(invoice["paid"], true);
        assert_eq!(invoice["payment_reference"], "TX-88");
        assert_eq!(invoice["amount"], 300.0);
        assert_eq!(invoice["sales_invoice_no"], "1005");

        let linked = payload(invoices::file(InvoiceFileOptions {
            invoice_no: "si-1".to_string(),
            file_url: "https://files.example.com/si-1.pdf".to_string(),
            home_override: Some(&home),
            ..InvoiceFileOptions::default()
        }));
        assert_eq!(linked["data"]["invoice"]["paid"], true);
        assert_eq!(linked["data"]["invoice"]["file_url"], "https://files.example.com/si-1.pdf");

        let missing = invoices::update(InvoiceUpdateOptions {
            invoice_no: "SI-404".to_string(),
            patch: SupplierInvoicePatch {
                paid: Some(true),
                ..SupplierInvoicePatch::default()
            },
            home_override: Some(&home),
            ..InvoiceUpdateOptions::default()
        });
        assert!(matches!(missing, Err(error) if error.code == "supplier_invoice_not_found"));
    }
}
