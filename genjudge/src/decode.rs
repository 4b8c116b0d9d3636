//! Decoding of contract read payloads.
//!
//! Contract views return their data as a JSON-encoded string, but a transport may also hand back a value that has
//! already been decoded. Both are accepted. Whether a [DecodeError] is surfaced or swallowed is decided by the caller.

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::DecodeError,
    normalize,
    types::{DebugInfo, GalleryEntry, JudgeResult},
};

/// A type which can be produced from a raw contract read payload.
pub trait Decode: Sized {
    fn decode(payload: Value) -> Result<Self, DecodeError>;
}

/// Unwraps one level of JSON encoding. Non-string payloads are returned unchanged.
pub fn unwrap_json(payload: Value) -> Result<Value, DecodeError> {
    match payload {
        Value::String(s) => Ok(serde_json::from_str(&s)?),
        other => Ok(other),
    }
}

pub fn decode_object(payload: Value) -> Result<Map<String, Value>, DecodeError> {
    match unwrap_json(payload)? {
        Value::Object(object) => Ok(object),
        other => Err(DecodeError::UnexpectedShape {
            expected: "an object",
            found: kind(&other),
        }),
    }
}

pub fn decode_array(payload: Value) -> Result<Vec<Value>, DecodeError> {
    match unwrap_json(payload)? {
        Value::Array(items) => Ok(items),
        other => Err(DecodeError::UnexpectedShape {
            expected: "an array",
            found: kind(&other),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Decode for JudgeResult {
    fn decode(payload: Value) -> Result<Self, DecodeError> {
        Ok(normalize::judge_result(&decode_object(payload)?))
    }
}

impl Decode for DebugInfo {
    fn decode(payload: Value) -> Result<Self, DecodeError> {
        Ok(normalize::debug_info(&decode_object(payload)?))
    }
}

impl Decode for Vec<GalleryEntry> {
    /// Rows which are not objects are skipped.
    fn decode(payload: Value) -> Result<Self, DecodeError> {
        let rows = decode_array(payload)?;
        let total = rows.len();
        let entries: Vec<GalleryEntry> = rows
            .iter()
            .filter_map(Value::as_object)
            .map(normalize::gallery_entry)
            .collect();
        if entries.len() != total {
            debug!(
                skipped = total - entries.len(),
                "ignored gallery rows which are not objects"
            );
        }
        Ok(entries)
    }
}
