use serde_json::Value;
use std::io;

use super::{
    flatten_row, flattened_headers, format_value, lookup, object_arrays, prerendered_grid,
    result_of,
};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    if let Some(grid) = prerendered_grid(result) {
        for row in &grid {
            let _ = wtr.write_record(row);
        }
    } else if let Value::Object(map) = result {
        match object_arrays(map).first() {
            // The first list of records is the payload (rows, assets)
            Some((_, rows)) => write_rows(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_value(val)]);
                }
            }
        }
    } else {
        let _ = wtr.write_record([&format_value(result)]);
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let flat: Vec<Vec<(String, Value)>> = rows.iter().map(flatten_row).collect();
    let headers = flattened_headers(&flat);
    let _ = wtr.write_record(&headers);

    for row in &flat {
        let record: Vec<String> = headers
            .iter()
            .map(|h| lookup(row, h).map(format_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}
