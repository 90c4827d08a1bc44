//! JSON-lines event ingestion
//!
//! One event per line: `{"type": "Order", "timestamp": 1000, "key": "x"}`.
//! Timestamps are integer milliseconds or RFC 3339 strings; `#` and `//`
//! lines are comments. Line numbers travel with every error.

use chrono::DateTime;
use std::path::Path;
use trendgraph_core::Value;

use crate::error::EventFileError;
use crate::event::{Event, SharedEvent};

/// Load and parse a whole event file.
pub fn load_events(path: &Path) -> Result<Vec<SharedEvent>, EventFileError> {
    let source = std::fs::read_to_string(path)?;
    parse_events(&source)
}

/// Parse JSON-lines event text. Arrival order is line order.
pub fn parse_events(source: &str) -> Result<Vec<SharedEvent>, EventFileError> {
    let mut events = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') || text.starts_with("//") {
            continue;
        }
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)
            .map_err(|e| EventFileError::Parse {
                line,
                message: e.to_string(),
            })?;

        let event_type = object
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(EventFileError::MissingType { line })?
            .to_string();
        let timestamp = parse_timestamp(object.get("timestamp"), line)?;

        let mut event = Event::new(event_type, timestamp);
        for (key, value) in &object {
            if key == "type" || key == "timestamp" {
                continue;
            }
            event = event.with_field(key.clone(), convert_value(value, line)?);
        }
        events.push(event.into_shared());
    }
    Ok(events)
}

fn parse_timestamp(
    value: Option<&serde_json::Value>,
    line: usize,
) -> Result<i64, EventFileError> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().ok_or(EventFileError::Parse {
            line,
            message: "timestamp is not an integer".into(),
        }),
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.timestamp_millis())
            .map_err(|e| EventFileError::Parse {
                line,
                message: format!("bad timestamp: {e}"),
            }),
        _ => Err(EventFileError::Parse {
            line,
            message: "missing or invalid \"timestamp\"".into(),
        }),
    }
}

fn convert_value(value: &serde_json::Value, line: usize) -> Result<Value, EventFileError> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else {
                Ok(Value::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(EventFileError::Parse {
            line,
            message: "nested values are not supported".into(),
        }),
    }
}
