use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{ClientError, ClientResult};

/// One sales row as it arrived, before any validation. `row` is 1-based over
/// data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSaleRow {
    pub row: usize,
    pub date: Option<String>,
    pub location: Option<String>,
    pub revenue: Option<String>,
    pub gross_sales: Option<String>,
    pub count: Option<String>,
}

const DATE: &str = "date";
const LOCATION: &str = "location";
const REVENUE: &str = "revenue";
const GROSS_SALES: &str = "grosssales";
const COUNT: &str = "count";

const REQUIRED_FIELDS: [&str; 4] = [DATE, LOCATION, REVENUE, COUNT];

/// Accepts CSV with a header row or a JSON array of objects. Field names
/// match loosely: `Gross Sales`, `grossSales` and `gross_sales` are the same.
pub(crate) fn parse_source(content: &str) -> ClientResult<Vec<RawSaleRow>> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_import_source("Import source is empty."));
    }

    if trimmed.starts_with('[') {
        return parse_json_array(trimmed);
    }
    if trimmed.starts_with('{') {
        return Err(ClientError::invalid_import_source(
            "JSON input must be a top-level array of sale objects.",
        ));
    }
    parse_csv(trimmed)
}

fn parse_json_array(content: &str) -> ClientResult<Vec<RawSaleRow>> {
    let parsed = serde_json::from_str::<Value>(content).map_err(|error| {
        ClientError::invalid_import_source(&format!("Invalid JSON input: {error}"))
    })?;
    let Some(items) = parsed.as_array() else {
        return Err(ClientError::invalid_import_source(
            "JSON input must be a top-level array of sale objects.",
        ));
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            return Err(ClientError::invalid_import_source(
                "JSON array entries must all be objects with sale fields.",
            ));
        };
        let fields = keyed_object(object);
        rows.push(RawSaleRow {
            row: index + 1,
            date: read_json_field(&fields, DATE),
            location: read_json_field(&fields, LOCATION),
            revenue: read_json_field(&fields, REVENUE),
            gross_sales: read_json_field(&fields, GROSS_SALES),
            count: read_json_field(&fields, COUNT),
        });
    }
    Ok(rows)
}

fn parse_csv(content: &str) -> ClientResult<Vec<RawSaleRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| ClientError::invalid_import_source("CSV header row is missing or unreadable."))?
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>();

    let mut index_by_key = HashMap::new();
    for (index, name) in headers.iter().enumerate() {
        index_by_key.entry(field_key(name)).or_insert(index);
    }
    let missing = REQUIRED_FIELDS
        .iter()
        .filter(|field| !index_by_key.contains_key(**field))
        .copied()
        .collect::<Vec<&str>>();
    if !missing.is_empty() {
        return Err(ClientError::invalid_import_source(&format!(
            "CSV header is missing required fields: {}. Found: {}.",
            missing.join(", "),
            headers.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for (row_index, result_row) in reader.records().enumerate() {
        let record = result_row.map_err(|_| {
            ClientError::invalid_import_source("CSV rows are malformed or not UTF-8.")
        })?;
        if record.iter().all(|value| value.is_empty()) {
            continue;
        }

        rows.push(RawSaleRow {
            row: row_index + 1,
            date: value_for(&record, &index_by_key, DATE),
            location: value_for(&record, &index_by_key, LOCATION),
            revenue: value_for(&record, &index_by_key, REVENUE),
            gross_sales: value_for(&record, &index_by_key, GROSS_SALES),
            count: value_for(&record, &index_by_key, COUNT),
        });
    }
    Ok(rows)
}

fn value_for(
    record: &csv::StringRecord,
    index_by_key: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    let index = index_by_key.get(field)?;
    let value = record.get(*index)?;
    Some(value.to_string())
}

fn keyed_object(object: &Map<String, Value>) -> HashMap<String, &Value> {
    let mut fields = HashMap::new();
    for (name, value) in object {
        fields.entry(field_key(name)).or_insert(value);
    }
    fields
}

fn read_json_field(fields: &HashMap<String, &Value>, field: &str) -> Option<String> {
    let current = fields.get(field)?;
    if current.is_null() {
        return None;
    }
    if let Some(text) = current.as_str() {
        return Some(text.to_string());
    }
    if let Some(number) = current.as_f64() {
        return Some(number.to_string());
    }
    Some(current.to_string())
}

fn field_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|character| character.to_ascii_lowercase())
        .collect()
}
