mod cli;
mod dispatch;
mod logging;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use franchise_ledger_client::{ClientError, ErrorCategory};
use stdout_io::write_stdout_line;

const TOP_LEVEL_HELP: &str = "franchise-ledger - franchise order and supplier invoice reconciliation

USAGE: franchise-ledger <command>

Reconcile a sales invoice:
  franchise-ledger recon allocations <sales-invoice>      List allocation rows
  franchise-ledger recon match <sales-invoice>            Find the supplier invoices behind it
  franchise-ledger recon summary <sales-invoice>          Totals, payment state and discrepancy

Orders and supplier invoices:
  franchise-ledger order create <sales-invoice>           Create an order
  franchise-ledger order stage <sales-invoice> <stage>    Move an order to another stage
  franchise-ledger order paid <sales-invoice>             Mark the partner payment as received
  franchise-ledger invoice record <sales-invoice> --entry NO:SUPPLIER:AMOUNT[:ALLOCATED]
  franchise-ledger invoice paid <invoice-no>              Mark a supplier invoice as paid
  franchise-ledger invoice update <invoice-no>            Update selected invoice fields
  franchise-ledger invoice file <invoice-no> <url>        Attach a document URL

Kitchen sales:
  1. franchise-ledger sales import --help                 Read the import format
  2. franchise-ledger sales import --dry-run <path>       Validate and dedupe without writing
  3. franchise-ledger sales import <path>                 Import rows
  franchise-ledger mapping add <location> <code>          Map a kitchen location to a franchise
  franchise-ledger sales backfill                         Fill codes on unmapped sales rows

Add --json to any command for machine-readable output.
Set FRANCHISE_LEDGER_HOME to choose the workbook directory and
FRANCHISE_LEDGER_LOG (for example `info` or `debug`) to see diagnostics on stderr.
";

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 || is_top_level_help_request(&raw_args) {
        if write_stdout_line(TOP_LEVEL_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    let mode = output::mode_for_command(&cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = %error.code, "command failed");
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    if matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) {
        if write_stdout_line(&err.to_string()).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let clean_message = strip_clap_boilerplate(&err.to_string());
    let parse_error =
        ClientError::invalid_argument_for_command(&clean_message, command_path_from_args(raw_args).as_deref());
    if output::print_failure(&parse_error, infer_requested_output_mode(raw_args)).is_err() {
        return Err(ExitCode::from(2));
    }
    Err(ExitCode::from(1))
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing usage block so the recovery steps are the only guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_start_matches("error: ").trim_end().to_string()
}

/// The `<group> <action>` pair from raw args, when it names a real command.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let words = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect::<Vec<&str>>();

    let hint = match words.as_slice() {
        ["recon", action @ ("allocations" | "match" | "summary"), ..] => format!("recon {action}"),
        ["order", action @ ("create" | "stage" | "paid"), ..] => format!("order {action}"),
        ["invoice", action @ ("record" | "update" | "paid" | "file"), ..] => {
            format!("invoice {action}")
        }
        ["sales", action @ ("import" | "backfill"), ..] => format!("sales {action}"),
        ["mapping", "add", ..] => "mapping add".to_string(),
        [group @ ("recon" | "order" | "invoice" | "sales" | "mapping"), ..] => group.to_string(),
        _ => return None,
    };
    Some(hint)
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    match error.category() {
        ErrorCategory::Validation | ErrorCategory::NotFound => ExitCode::from(1),
        ErrorCategory::UpstreamTransient
        | ErrorCategory::UpstreamConfiguration
        | ErrorCategory::Internal => ExitCode::from(2),
    }
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, strip_clap_boilerplate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_path_ignores_flags_and_positionals() {
        assert_eq!(
            command_path_from_args(&args(&["franchise-ledger", "invoice", "paid", "SI-1", "--json"])),
            Some("invoice paid".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["franchise-ledger", "order", "bogus"])),
            Some("order".to_string())
        );
        assert_eq!(command_path_from_args(&args(&["franchise-ledger", "ship"])), None);
    }

    #[test]
    fn clap_usage_block_is_removed() {
        let message = "error: unexpected argument '--foo' found\n\nUsage: franchise-ledger recon summary <SALES_INVOICE_NO>\n";
        assert_eq!(
            strip_clap_boilerplate(message),
            "unexpected argument '--foo' found"
        );
    }
}
