use serde_json::Value;

use super::{flatten_row, format_value, lookup, prerendered_grid, result_of};

/// Per-row fields tried in order when printing one value per asset.
const ROW_PRIORITY_KEYS: [&str; 3] = ["after_tax_real", "leveraged_gross", "error"];

/// Print just the key answer: one line per asset, or the first field.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Some(grid) = prerendered_grid(result) {
        // Skip the header row
        for row in grid.iter().skip(1) {
            println!("{}", row.join("\t"));
        }
        return;
    }

    if let Some(Value::Array(rows)) = result.get("rows") {
        for row in rows {
            let flat = flatten_row(row);
            let name = lookup(&flat, "name").map(format_value).unwrap_or_default();
            let answer = ROW_PRIORITY_KEYS
                .iter()
                .find_map(|k| lookup(&flat, k).filter(|v| !v.is_null()))
                .map(format_value)
                .unwrap_or_default();
            println!("{name}: {answer}");
        }
        return;
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result));
}
