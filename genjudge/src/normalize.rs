//! Conversion of loosely-typed contract payloads into the strict records returned to callers.
//!
//! Every function in this module is total: a missing or oddly-typed field is replaced by its default rather than
//! reported. Deciding whether a payload is usable at all is the job of [crate::decode].

use serde_json::{Map, Value};

use crate::types::{DebugInfo, GalleryEntry, JudgeResult};

/// Renders a scalar as a string. Empty strings, `null`, arrays and objects produce `None`.
pub fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    scalar_string(value).unwrap_or_else(|| default.to_owned())
}

/// Reads an integer. Floats are truncated, numeric strings are parsed and booleans count as 1 or 0. Anything else is
/// 0. The value is not range checked.
pub fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0)
        }
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// Maps a list element-wise to strings. Non-string elements are rendered as JSON. Anything but a list is empty.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => vec![],
    }
}

/// Truthiness: `null`, `false`, `0`, and `""` are false. Lists and objects are true.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

pub fn judge_result(object: &Map<String, Value>) -> JudgeResult {
    JudgeResult {
        mode: string_or(object.get("mode"), "general"),
        title: string_or(object.get("title"), ""),
        url: string_or(object.get("url"), ""),
        total: integer(object.get("total")),
        scores: match object.get("scores") {
            Some(Value::Object(scores)) => scores.clone(),
            _ => Map::new(),
        },
        feedback: string_or(object.get("feedback"), ""),
        improvements: string_list(object.get("improvements")),
        tags: string_list(object.get("tags")),
        saved: truthy(object.get("saved")),
        fallback: truthy(object.get("fallback")),
    }
}

pub fn gallery_entry(row: &Map<String, Value>) -> GalleryEntry {
    GalleryEntry {
        mode: string_or(row.get("mode"), "general"),
        title: string_or(row.get("title"), ""),
        url: string_or(row.get("url"), ""),
        total: integer(row.get("total")),
        author: string_or(row.get("author"), ""),
        feedback: string_or(row.get("feedback"), ""),
        tags: string_list(row.get("tags")),
    }
}

pub fn debug_info(object: &Map<String, Value>) -> DebugInfo {
    DebugInfo {
        eq: string_or(object.get("eq"), ""),
        error: string_or(object.get("error"), ""),
        raw: string_or(object.get("raw"), ""),
    }
}
