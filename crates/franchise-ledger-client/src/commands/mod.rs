pub(crate) mod common;
pub mod invoices;
pub mod mapping;
pub mod orders;
pub mod recon;
pub mod sales;
