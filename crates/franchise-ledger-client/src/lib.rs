pub mod commands;
pub mod config;
pub mod contracts;
mod dates;
pub mod entry;
pub mod error;
pub mod import;
pub mod ledger;
pub mod migrations;
pub mod payments;
pub mod recon;
pub mod records;
pub mod schema;
pub mod setup;
pub mod state;
pub mod store;

pub use config::LedgerConfig;
pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult, ErrorCategory};
pub use ledger::Ledger;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
