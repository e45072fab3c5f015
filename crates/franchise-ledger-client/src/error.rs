use std::path::Path;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const IMPORT_HELP_COMMAND: &str = "franchise-ledger sales import --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

/// Coarse classification used by callers to pick a status or exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    UpstreamTransient,
    UpstreamConfiguration,
    Internal,
}

impl ErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::UpstreamTransient => "upstream_transient",
            Self::UpstreamConfiguration => "upstream_configuration",
            Self::Internal => "internal",
        }
    }

    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::UpstreamTransient)
    }
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code.as_str() {
            "order_not_found" | "supplier_invoice_not_found" => ErrorCategory::NotFound,
            "store_unavailable" => ErrorCategory::UpstreamTransient,
            "store_misconfigured" | "sheet_schema_mismatch" | "config_invalid" => {
                ErrorCategory::UpstreamConfiguration
            }
            code if code.starts_with("internal_") => ErrorCategory::Internal,
            _ => ErrorCategory::Validation,
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `franchise-ledger {cmd} --help` for usage."),
            None => "Run `franchise-ledger --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn invalid_stage(received: &str, allowed: &[&str]) -> Self {
        Self::new(
            "invalid_stage",
            &format!(
                "Stage `{received}` is not allowed. Allowed stages: {}.",
                allowed.join(", ")
            ),
            vec!["Pick one of the allowed stages and retry.".to_string()],
        )
        .with_data(json!({
            "field": "stage",
            "received": received,
            "allowed_values": allowed,
        }))
    }

    pub fn invalid_payment_method(received: &str, allowed: &[&str]) -> Self {
        Self::new(
            "invalid_payment_method",
            &format!(
                "Payment method `{received}` is not allowed. Allowed methods: {}.",
                allowed.join(", ")
            ),
            vec!["Pick one of the allowed payment methods and retry. Nothing was written.".to_string()],
        )
        .with_data(json!({
            "field": "payment_method",
            "received": received,
            "allowed_values": allowed,
        }))
    }

    pub fn invalid_date(field: &str, received: &str) -> Self {
        Self::new(
            "invalid_date",
            &format!("`{field}` must be a calendar date in YYYY-MM-DD format; got \"{received}\"."),
            vec!["Use an ISO calendar date such as 2024-01-15. Nothing was written.".to_string()],
        )
        .with_data(json!({
            "field": field,
            "received": received,
            "expected": "YYYY-MM-DD",
        }))
    }

    pub fn invalid_amount(field: &str, received: &str) -> Self {
        Self::new(
            "invalid_amount",
            &format!("`{field}` must be a finite, non-negative number; got \"{received}\"."),
            vec!["Provide a plain number such as 120.50. Nothing was written.".to_string()],
        )
        .with_data(json!({
            "field": field,
            "received": received,
        }))
    }

    pub fn ambiguous_invoice(invoice_no: &str, suppliers: Vec<String>) -> Self {
        Self::new(
            "ambiguous_invoice",
            &format!(
                "Invoice number `{invoice_no}` exists for several suppliers; specify which supplier."
            ),
            vec!["Retry with `--supplier <name>` set to one of the listed suppliers.".to_string()],
        )
        .with_data(json!({
            "invoice_no": invoice_no,
            "allowed_values": suppliers,
        }))
    }

    pub fn order_already_exists(sales_invoice_no: &str) -> Self {
        Self::new(
            "order_already_exists",
            &format!("An order with sales invoice `{sales_invoice_no}` already exists."),
            vec!["Use a new sales invoice number or update the existing order.".to_string()],
        )
        .with_data(json!({
            "sales_invoice_no": sales_invoice_no,
        }))
    }

    pub fn supplier_invoice_already_exists(invoice_no: &str, supplier: &str) -> Self {
        Self::new(
            "supplier_invoice_already_exists",
            &format!("Supplier invoice `{invoice_no}` from `{supplier}` is already on file."),
            vec!["Update the existing invoice instead of recording it again.".to_string()],
        )
        .with_data(json!({
            "invoice_no": invoice_no,
            "supplier": supplier,
        }))
    }

    pub fn order_not_found(sales_invoice_no: &str) -> Self {
        Self::new(
            "order_not_found",
            &format!("No order found for sales invoice `{sales_invoice_no}`."),
            vec![
                "Check the sales invoice number; `#`, spacing and case are ignored.".to_string(),
                "Create the order first with `franchise-ledger order create`.".to_string(),
            ],
        )
        .with_data(json!({
            "sales_invoice_no": sales_invoice_no,
        }))
    }

    pub fn supplier_invoice_not_found(invoice_no: &str, supplier: Option<&str>) -> Self {
        let message = match supplier {
            Some(name) => format!("No supplier invoice `{invoice_no}` found for supplier `{name}`."),
            None => format!("No supplier invoice `{invoice_no}` found."),
        };
        Self::new(
            "supplier_invoice_not_found",
            &message,
            vec!["Record the invoice first with `franchise-ledger invoice record`.".to_string()],
        )
        .with_data(json!({
            "invoice_no": invoice_no,
            "supplier": supplier,
        }))
    }

    pub fn sheet_schema_mismatch(
        sheet: &str,
        missing_columns: Vec<String>,
        actual_headers: Vec<String>,
    ) -> Self {
        Self::new(
            "sheet_schema_mismatch",
            &format!(
                "Sheet `{sheet}` is missing required columns: {}.",
                missing_columns.join(", ")
            ),
            vec![
                "Add the missing header cells to row 1 of the sheet.".to_string(),
                "Or point `[sheets]` in config.toml at the correct sheet.".to_string(),
            ],
        )
        .with_data(json!({
            "sheet": sheet,
            "missing_columns": missing_columns,
            "actual_headers": actual_headers,
        }))
    }

    pub fn store_unavailable(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_unavailable",
            &format!("Workbook at `{location}` is temporarily unavailable: {detail}"),
            vec![
                "Retry the command; another process may be holding the workbook.".to_string(),
                format!("Close other processes using `{location}` if the problem persists."),
            ],
        )
    }

    pub fn store_misconfigured(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_misconfigured",
            &format!("Workbook at `{location}` cannot be used: {detail}"),
            vec![format!(
                "Grant access to `{location}` or set `FRANCHISE_LEDGER_HOME` to a writable directory."
            )],
        )
    }

    pub fn config_invalid(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "config_invalid",
            &format!("Config file `{location}` is invalid: {detail}"),
            vec!["Fix or remove the config file; defaults apply when it is absent.".to_string()],
        )
    }

    pub fn invalid_import_source(message: &str) -> Self {
        Self::invalid_argument_with_recovery(
            message,
            vec![
                "Provide CSV with a header row or a JSON array via path or stdin.".to_string(),
                format!("Run `{IMPORT_HELP_COMMAND}` to confirm field requirements."),
            ],
        )
        .with_data(json!({
            "help_command": IMPORT_HELP_COMMAND,
        }))
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn internal_store(message: &str) -> Self {
        Self::new("internal_store_error", message, Vec::new())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
