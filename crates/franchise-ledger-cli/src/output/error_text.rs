use franchise_ledger_client::ClientError;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        format!("Error: {} ({})", error.code, error.category().as_str()),
        format!("  {}", error.message),
        String::new(),
        "What to do next:".to_string(),
    ];

    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use franchise_ledger_client::ClientError;

    use super::render_error;

    #[test]
    fn renders_code_category_and_numbered_steps() {
        let error = ClientError::invalid_argument_with_recovery(
            "bad input",
            vec!["run franchise-ledger --help".to_string()],
        );

        let rendered = render_error(&error);
        assert!(rendered.starts_with("Error: invalid_argument (validation)"));
        assert!(rendered.contains("  bad input"));
        assert!(rendered.contains("What to do next:"));
        assert!(rendered.contains("  1. run franchise-ledger --help"));
    }
}
