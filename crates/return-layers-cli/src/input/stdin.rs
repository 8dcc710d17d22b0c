use serde_json::Value;
use std::io::{self, Read};
use tracing::debug;

/// Read piped JSON from stdin. `None` when stdin is a terminal or empty.
///
/// A full output envelope (`{"result": .., "assumptions": ..}`) piped from
/// `compute` or `chart` is unwrapped to its `assumptions`, which hold the
/// input that produced it. Other envelopes are left whole.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse JSON from stdin: {e}"))?;
    debug!(bytes = trimmed.len(), "read input from stdin");
    Ok(Some(unwrap_envelope(value)))
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.contains_key("result")
                && map.get("assumptions").is_some_and(|a| a.get("assets").is_some()) =>
        {
            map.remove("assumptions").unwrap_or(Value::Null)
        }
        other => other,
    }
}
