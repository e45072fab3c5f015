use crate::cli::{
    Commands, InvoiceCommand, MappingCommand, OrderCommand, ReconCommand, SalesCommand,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    if json_requested(command) {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

fn json_requested(command: &Commands) -> bool {
    match command {
        Commands::Recon { command } => match command {
            ReconCommand::Allocations { json, .. }
            | ReconCommand::Match { json, .. }
            | ReconCommand::Summary { json, .. } => *json,
        },
        Commands::Order { command } => match command {
            OrderCommand::Create { json, .. }
            | OrderCommand::Stage { json, .. }
            | OrderCommand::Paid { json, .. } => *json,
        },
        Commands::Invoice { command } => match command {
            InvoiceCommand::Record { json, .. }
            | InvoiceCommand::Update { json, .. }
            | InvoiceCommand::Paid { json, .. }
            | InvoiceCommand::File { json, .. } => *json,
        },
        Commands::Sales { command } => match command {
            SalesCommand::Import { json, .. } | SalesCommand::Backfill { json } => *json,
        },
        Commands::Mapping { command } => match command {
            MappingCommand::Add { json, .. } => *json,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputMode, mode_for_command};
    use crate::cli::parse_from;

    #[test]
    fn json_flag_selects_json_for_every_group() {
        let cases: [&[&str]; 5] = [
            &["franchise-ledger", "recon", "summary", "INV-1", "--json"],
            &["franchise-ledger", "order", "stage", "INV-1", "Paid", "--json"],
            &["franchise-ledger", "invoice", "file", "SI-1", "https://files/si-1.pdf", "--json"],
            &["franchise-ledger", "sales", "backfill", "--json"],
            &["franchise-ledger", "mapping", "add", "Main St", "FR-09", "--json"],
        ];
        for args in cases {
            let parsed = parse_from(args);
            assert!(parsed.is_ok());
            if let Ok(cli) = parsed {
                assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
            }
        }
    }

    #[test]
    fn commands_without_json_flag_use_text() {
        let parsed = parse_from(["franchise-ledger", "sales", "import", "rows.csv"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Text);
        }
    }
}
