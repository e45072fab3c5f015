use std::io;

use serde_json::Value;

use super::format::{self, Column, get_array, get_str, get_u64};

const SKIPPED_PREVIEW_LIMIT: usize = 20;

pub fn render_import(data: &Value) -> io::Result<String> {
    let dry_run = data
        .get("dry_run")
        .and_then(Value::as_bool)
        .ok_or_else(|| io::Error::other("sales import output requires dry_run"))?;

    let mut lines = vec![
        if dry_run {
            "Dry run completed. No rows were written.".to_string()
        } else {
            "Sales import completed.".to_string()
        },
        String::new(),
    ];
    let source = match data.get("source_ref").and_then(Value::as_str) {
        Some(path) => path.to_string(),
        None => get_str(data, "source_kind").to_string(),
    };
    lines.extend(format::key_value_rows(
        &[
            ("Source:", source),
            ("Rows read:", get_u64(data, "rows_read").to_string()),
            (
                if dry_run { "Would import:" } else { "Imported:" },
                get_u64(data, "imported").to_string(),
            ),
            ("Skipped:", get_u64(data, "skipped").to_string()),
        ],
        2,
    ));

    let skipped = get_array(data, "skipped_rows");
    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped rows:".to_string());
        let rows = skipped
            .iter()
            .take(SKIPPED_PREVIEW_LIMIT)
            .map(|row| {
                vec![
                    get_u64(row, "row").to_string(),
                    get_str(row, "reason").to_string(),
                    get_str(row, "date").to_string(),
                    get_str(row, "location").to_string(),
                    get_str(row, "detail").to_string(),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table(
            &[
                Column::right("Row"),
                Column::left("Reason"),
                Column::left("Date"),
                Column::left("Location"),
                Column::left("Detail"),
            ],
            &rows,
        ));
        if skipped.len() > SKIPPED_PREVIEW_LIMIT {
            lines.push(format!(
                "  ... and {} more (use --json for the full list)",
                skipped.len() - SKIPPED_PREVIEW_LIMIT
            ));
        }
    }

    let unmapped = strings(data, "unmapped_locations");
    if !unmapped.is_empty() {
        lines.push(String::new());
        lines.push(format!("Unmapped locations: {}", unmapped.join(", ")));
        lines.push(
            "  Add them with `franchise-ledger mapping add <location> <code>`, then run `franchise-ledger sales backfill`."
                .to_string(),
        );
    }

    let errors = strings(data, "errors");
    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Rows that failed to write:".to_string());
        for error in errors {
            lines.push(format!("  {error}"));
        }
    }
    Ok(lines.join("\n"))
}

pub fn render_backfill(data: &Value) -> io::Result<String> {
    let updated = data
        .get("updated")
        .and_then(Value::as_u64)
        .ok_or_else(|| io::Error::other("sales backfill output requires updated"))?;
    let mut lines = vec![format!("Filled franchise codes on {updated} sales row(s).")];
    let still_unmapped = strings(data, "still_unmapped");
    if !still_unmapped.is_empty() {
        lines.push(format!("Still unmapped: {}", still_unmapped.join(", ")));
    }
    Ok(lines.join("\n"))
}

fn strings<'a>(data: &'a Value, key: &str) -> Vec<&'a str> {
    get_array(data, key)
        .iter()
        .filter_map(Value::as_str)
        .collect()
}
