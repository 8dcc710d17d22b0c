pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The `result` object of an output envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// A pre-rendered grid (`table` key: header row then data rows).
pub(crate) fn prerendered_grid(result: &Value) -> Option<Vec<Vec<String>>> {
    let rows = result.get("table")?.as_array()?;
    rows.iter()
        .map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(format_value).collect::<Vec<_>>())
        })
        .collect()
}

/// Lift nested objects one level (e.g. `returns.after_tax` -> `after_tax`),
/// keeping `name` as the first column.
pub(crate) fn flatten_row(item: &Value) -> Vec<(String, Value)> {
    let mut cols = Vec::new();
    if let Value::Object(map) = item {
        if let Some(name) = map.get("name") {
            cols.push(("name".to_string(), name.clone()));
        }
        for (key, val) in map {
            match val {
                _ if key == "name" => {}
                Value::Object(inner) => {
                    cols.extend(inner.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                _ => cols.push((key.clone(), val.clone())),
            }
        }
    }
    cols
}

/// Headers for a list of flattened rows: union of columns in first-seen order.
pub(crate) fn flattened_headers(rows: &[Vec<(String, Value)>]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

pub(crate) fn lookup<'a>(row: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    row.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Array-of-objects fields of an object, e.g. `rows` or `assets`.
pub(crate) fn object_arrays(map: &Map<String, Value>) -> Vec<(&str, &Vec<Value>)> {
    map.iter()
        .filter_map(|(k, v)| match v {
            Value::Array(arr) if arr.first().map_or(false, Value::is_object) => {
                Some((k.as_str(), arr))
            }
            _ => None,
        })
        .collect()
}
