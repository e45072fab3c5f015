use chrono::NaiveDate;
use clap::{Parser, Subcommand, builder::BoolishValueParser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0usize, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|index| bytes[*index].is_ascii_digit());
    if !shaped {
        return Err("date must use YYYY-MM-DD format".to_string());
    }
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }
    Ok(IsoDate(value.to_string()))
}

/// Extended help shown after `franchise-ledger sales import --help`.
pub const SALES_IMPORT_AFTER_HELP: &str = "\
How sales import works:
  Each row is one day of sales for one kitchen location.
  Rows are validated, deduplicated by (date, location), mapped to a
  franchise code through the KitchenMapping sheet, then appended.

  Accepted formats:
    CSV  - one header row: date,location,revenue,grossSales,count
    JSON - one top-level array of objects with the same fields

  <path> is a local file path. Use `-` to read stdin.
  Example: cat sales.csv | franchise-ledger sales import --dry-run -

Field rules:
  date (required):       YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY or DD.MM.YYYY
  location (required):   kitchen location text
  revenue (required):    number, currency symbols and commas are allowed
  grossSales (optional): number, defaults to revenue
  count (required):      number of orders, zero or more

What to do next:
  1. Run `franchise-ledger sales import --dry-run <path>` and review skipped rows.
  2. Run `franchise-ledger sales import <path>` once the dry run looks right.
  3. Add missing locations with `franchise-ledger mapping add`, then run
     `franchise-ledger sales backfill`.
";

#[derive(Debug, Parser)]
#[command(
    name = "franchise-ledger",
    version,
    about = "franchise order and supplier invoice reconciliation",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile a sales invoice against its supplier invoices
    #[command(arg_required_else_help = true)]
    Recon {
        #[command(subcommand)]
        command: ReconCommand,
    },
    /// Create orders and update their stage or partner payment
    #[command(arg_required_else_help = true)]
    Order {
        #[command(subcommand)]
        command: OrderCommand,
    },
    /// Record supplier invoices and update their payment state
    #[command(arg_required_else_help = true)]
    Invoice {
        #[command(subcommand)]
        command: InvoiceCommand,
    },
    /// Import kitchen sales rows
    #[command(arg_required_else_help = true)]
    Sales {
        #[command(subcommand)]
        command: SalesCommand,
    },
    /// Manage kitchen location to franchise code mappings
    #[command(arg_required_else_help = true)]
    Mapping {
        #[command(subcommand)]
        command: MappingCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReconCommand {
    /// List allocation rows for a sales invoice
    Allocations {
        sales_invoice_no: String,
        #[arg(long)]
        json: bool,
    },
    /// Find the supplier invoices behind a sales invoice
    Match {
        sales_invoice_no: String,
        #[arg(long)]
        json: bool,
    },
    /// Totals, payment state and discrepancy for a sales invoice
    Summary {
        sales_invoice_no: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Create an order row
    Create {
        sales_invoice_no: String,
        #[arg(long = "order-id")]
        order_id: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        /// Order date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<IsoDate>,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        total: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Move an order to another stage
    Stage {
        sales_invoice_no: String,
        stage: String,
        #[arg(long)]
        json: bool,
    },
    /// Mark the partner payment for an order as received
    Paid {
        sales_invoice_no: String,
        /// Payment date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<IsoDate>,
        #[arg(long)]
        method: Option<String>,
        #[arg(long = "ref")]
        reference: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum InvoiceCommand {
    /// Record supplier invoices for a sales invoice
    Record {
        sales_invoice_no: String,
        /// NO:SUPPLIER:AMOUNT or NO:SUPPLIER:AMOUNT:ALLOCATED, repeatable
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Update selected fields of a supplier invoice
    Update {
        invoice_no: String,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long, value_parser = BoolishValueParser::new())]
        paid: Option<bool>,
        /// Paid date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<IsoDate>,
        #[arg(long = "ref")]
        reference: Option<String>,
        #[arg(long = "sales-invoice")]
        sales_invoice_no: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Mark a supplier invoice as paid
    Paid {
        invoice_no: String,
        #[arg(long)]
        supplier: Option<String>,
        /// Paid date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<IsoDate>,
        #[arg(long = "ref")]
        reference: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Attach a document URL to a supplier invoice
    File {
        invoice_no: String,
        url: String,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SalesCommand {
    /// Import kitchen sales from CSV or JSON
    #[command(after_long_help = SALES_IMPORT_AFTER_HELP)]
    Import {
        /// Validate, dedupe and map without writing rows
        #[arg(long = "dry-run")]
        dry_run: bool,
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Fill franchise codes on sales rows that were imported unmapped
    Backfill {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum MappingCommand {
    /// Map a kitchen location to a franchise code
    Add {
        location: String,
        franchise_code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        inactive: bool,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
