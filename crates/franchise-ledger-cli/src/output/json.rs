use std::io;

use franchise_ledger_client::contracts::envelope::failure_from_error;
use franchise_ledger_client::{ClientError, SuccessEnvelope};
use serde::Serialize;

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    serialize_json_pretty(success)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&failure_from_error(error))
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use franchise_ledger_client::{ClientError, SuccessEnvelope};
    use serde_json::{Value, json};

    use super::{render_error_json, render_success_json};

    #[test]
    fn success_json_keeps_the_envelope() {
        let payload = SuccessEnvelope {
            ok: true,
            command: "recon summary".to_string(),
            version: "0.1.0".to_string(),
            data: json!({"sales_invoice_no": "INV-1", "discrepancy": false}),
        };
        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(true));
                assert_eq!(value["command"], "recon summary");
                assert_eq!(value["data"]["sales_invoice_no"], "INV-1");
            }
        }
    }

    #[test]
    fn error_json_carries_category_and_retryable() {
        let error = ClientError::order_not_found("INV-404");
        let rendered = render_error_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(false));
                assert_eq!(value["error"]["code"], "order_not_found");
                assert_eq!(value["error"]["category"], "not_found");
                assert_eq!(value["error"]["retryable"], Value::Bool(false));
                assert!(value["error"]["recovery_steps"].is_array());
            }
        }
    }
}
