//! Turns `POST /api/log` bodies into log file lines.
//!
//! Two shapes are accepted: the batch form `{"logs": [...]}` sent by the
//! client batcher, and the older single-record form
//! `{"level", "message", "timestamp"}`. Field values are loosely typed the
//! way browser clients send them: anything falsy counts as absent.

use crate::error::IngestError;
use crate::types::now_iso;
use serde_json::{Map, Value};

const DEFAULT_LEVEL: &str = "log";

/// Formats one persisted line, newline included.
pub fn format_line(level: &str, message: &str, timestamp: &str) -> String {
    format!("[{}] {}: {}\n", timestamp, level.to_uppercase(), message)
}

/// Parses a raw request body and resolves the lines to append.
pub fn lines_from_body(body: &[u8]) -> Result<Vec<String>, IngestError> {
    let payload: Value = serde_json::from_slice(body)?;
    lines_from_payload(&payload)
}

/// Resolves the lines to append for an already-parsed payload.
///
/// Batch entries without a message are skipped; a single-form payload
/// without any message is rejected.
pub fn lines_from_payload(payload: &Value) -> Result<Vec<String>, IngestError> {
    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);

    if let Some(Value::Array(entries)) = fields.get("logs") {
        let lines = entries
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|entry| {
                let message = present(entry.get("message"))?;
                Some(line_for(entry, message))
            })
            .collect();
        return Ok(lines);
    }

    // Legacy clients put the message text in `logs`.
    let message = present(fields.get("message"))
        .or_else(|| present(fields.get("logs")))
        .ok_or(IngestError::MissingMessage)?;

    Ok(vec![line_for(fields, message)])
}

/// Builds the line for one record.
///
/// Both payload forms treat a falsy `level` or `timestamp` (`""`, `0`,
/// `false`, `null`) as missing: `"level": ""` is written as `LOG` and
/// `"timestamp": ""` as the receive time. Batch entries deliberately follow
/// the single-record rule instead of defaulting only absent fields.
fn line_for(fields: &Map<String, Value>, message: &Value) -> String {
    let level = present(fields.get("level")).map_or_else(|| DEFAULT_LEVEL.to_string(), text);
    let timestamp = present(fields.get("timestamp")).map_or_else(now_iso, text);
    format_line(&level, &text(message), &timestamp)
}

/// Returns the value only when it is truthy.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| truthy(v))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
