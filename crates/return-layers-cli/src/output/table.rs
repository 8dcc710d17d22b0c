use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{
    flatten_row, flattened_headers, format_value, lookup, object_arrays, prerendered_grid,
    result_of,
};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    if let Some(grid) = prerendered_grid(result) {
        print_grid(&grid);
    } else if let Value::Object(map) = result {
        print_object(map);
    } else {
        println!("{}", format_value(result));
    }

    if let Value::Object(envelope) = value {
        print_envelope_notes(envelope);
    }
}

/// Scalars as a Field/Value table, then one table per array of objects.
fn print_object(map: &Map<String, Value>) {
    let arrays = object_arrays(map);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    for (key, val) in map {
        if arrays.iter().any(|(k, _)| *k == key.as_str()) || key == "table" {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
        scalars += 1;
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, rows) in arrays {
        println!("\n{key}:");
        print_rows(rows);
    }
}

fn print_rows(rows: &[Value]) {
    let flat: Vec<Vec<(String, Value)>> = rows.iter().map(flatten_row).collect();
    let headers = flattened_headers(&flat);

    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(String::as_str));
    for row in &flat {
        builder.push_record(
            headers
                .iter()
                .map(|h| lookup(row, h).map(format_value).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_grid(grid: &[Vec<String>]) {
    if grid.is_empty() {
        println!("(empty)");
        return;
    }
    let mut builder = Builder::default();
    for row in grid {
        builder.push_record(row.iter().map(String::as_str));
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
