mod error_text;
mod format;
mod json;
mod mode;
mod recon_text;
mod sales_text;
mod update_text;

use std::io;

use franchise_ledger_client::{ClientError, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    let data = &success.data;
    match success.command.as_str() {
        "recon allocations" => recon_text::render_allocations(data),
        "recon match" => recon_text::render_match(data),
        "recon summary" => recon_text::render_summary(data),
        "order create" => update_text::render_order_created(data),
        "order stage" => update_text::render_stage_update(data),
        "order paid" => update_text::render_partner_paid(data),
        "invoice record" => update_text::render_invoices_recorded(data),
        "invoice update" | "invoice paid" | "invoice file" => {
            update_text::render_invoice_update(data)
        }
        "mapping add" => update_text::render_mapping_added(data),
        "sales import" => sales_text::render_import(data),
        "sales backfill" => sales_text::render_backfill(data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
