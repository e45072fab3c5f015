use franchise_ledger_client::commands::invoices::{
    InvoiceFileOptions, InvoicePaidOptions, InvoiceRecordOptions, InvoiceUpdateOptions,
    parse_entry,
};
use franchise_ledger_client::commands::mapping::MappingAddOptions;
use franchise_ledger_client::commands::orders::{
    OrderCreateOptions, OrderPaidOptions, OrderStageOptions,
};
use franchise_ledger_client::commands::recon::ReconOptions;
use franchise_ledger_client::commands::sales::{SalesBackfillOptions, SalesImportOptions};
use franchise_ledger_client::commands::{invoices, mapping, orders, recon, sales};
use franchise_ledger_client::entry::NewOrder;
use franchise_ledger_client::payments::{PartnerPayment, SupplierInvoicePatch};
use franchise_ledger_client::records::KitchenMapping;
use franchise_ledger_client::{ClientResult, SuccessEnvelope};

use crate::cli::{
    Cli, Commands, InvoiceCommand, IsoDate, MappingCommand, OrderCommand, ReconCommand,
    SalesCommand,
};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Recon { command } => dispatch_recon(command),
        Commands::Order { command } => dispatch_order(command),
        Commands::Invoice { command } => dispatch_invoice(command),
        Commands::Sales { command } => match command {
            SalesCommand::Import { dry_run, path, .. } => sales::import(SalesImportOptions {
                path: path.clone(),
                dry_run: *dry_run,
                ..SalesImportOptions::default()
            }),
            SalesCommand::Backfill { .. } => sales::backfill(SalesBackfillOptions::default()),
        },
        Commands::Mapping { command } => match command {
            MappingCommand::Add {
                location,
                franchise_code,
                name,
                inactive,
                notes,
                ..
            } => mapping::add(MappingAddOptions {
                mapping: KitchenMapping {
                    location: location.clone(),
                    franchise_code: franchise_code.clone(),
                    franchise_name: name.clone(),
                    active: !inactive,
                    notes: notes.clone(),
                },
                home_override: None,
            }),
        },
    }
}

fn dispatch_recon(command: &ReconCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        ReconCommand::Allocations {
            sales_invoice_no, ..
        } => recon::allocations(recon_options(sales_invoice_no)),
        ReconCommand::Match {
            sales_invoice_no, ..
        } => recon::match_invoices(recon_options(sales_invoice_no)),
        ReconCommand::Summary {
            sales_invoice_no, ..
        } => recon::summary(recon_options(sales_invoice_no)),
    }
}

fn recon_options(sales_invoice_no: &str) -> ReconOptions<'static> {
    ReconOptions {
        sales_invoice_no: sales_invoice_no.to_string(),
        home_override: None,
    }
}

fn dispatch_order(command: &OrderCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        OrderCommand::Create {
            sales_invoice_no,
            order_id,
            brand,
            date,
            stage,
            total,
            ..
        } => orders::create(OrderCreateOptions {
            order: NewOrder {
                sales_invoice_no: sales_invoice_no.clone(),
                order_id: order_id.clone(),
                brand: brand.clone(),
                order_date: date_text(date.as_ref()),
                stage: stage.clone(),
                order_total: *total,
            },
            home_override: None,
        }),
        OrderCommand::Stage {
            sales_invoice_no,
            stage,
            ..
        } => orders::stage(OrderStageOptions {
            sales_invoice_no: sales_invoice_no.clone(),
            stage: stage.clone(),
            home_override: None,
        }),
        OrderCommand::Paid {
            sales_invoice_no,
            date,
            method,
            reference,
            ..
        } => orders::paid(OrderPaidOptions {
            sales_invoice_no: sales_invoice_no.clone(),
            payment: PartnerPayment {
                paid_date: date_text(date.as_ref()),
                payment_method: method.clone(),
                payment_ref: reference.clone(),
            },
            home_override: None,
        }),
    }
}

fn dispatch_invoice(command: &InvoiceCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        InvoiceCommand::Record {
            sales_invoice_no,
            entries,
            ..
        } => {
            let entries = entries
                .iter()
                .map(|entry| parse_entry(entry))
                .collect::<ClientResult<Vec<_>>>()?;
            invoices::record(InvoiceRecordOptions {
                sales_invoice_no: sales_invoice_no.clone(),
                entries,
                home_override: None,
            })
        }
        InvoiceCommand::Update {
            invoice_no,
            supplier,
            paid,
            date,
            reference,
            sales_invoice_no,
            amount,
            ..
        } => invoices::update(InvoiceUpdateOptions {
            invoice_no: invoice_no.clone(),
            supplier: supplier.clone(),
            patch: SupplierInvoicePatch {
                paid: *paid,
                paid_date: date_text(date.as_ref()),
                payment_reference: reference.clone(),
                sales_invoice_no: sales_invoice_no.clone(),
                amount: *amount,
            },
            home_override: None,
        }),
        InvoiceCommand::Paid {
            invoice_no,
            supplier,
            date,
            reference,
            ..
        } => invoices::paid(InvoicePaidOptions {
            invoice_no: invoice_no.clone(),
            supplier: supplier.clone(),
            paid_date: date_text(date.as_ref()),
            payment_reference: reference.clone(),
            home_override: None,
        }),
        InvoiceCommand::File {
            invoice_no,
            url,
            supplier,
            ..
        } => invoices::file(InvoiceFileOptions {
            invoice_no: invoice_no.clone(),
            supplier: supplier.clone(),
            file_url: url.clone(),
            home_override: None,
        }),
    }
}

fn date_text(date: Option<&IsoDate>) -> Option<String> {
    date.map(|value| value.as_str().to_string())
}
