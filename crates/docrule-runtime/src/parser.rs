//! Turns raw model text into a [`VerdictRecord`].
//!
//! Models wrap their JSON in prose or code fences more often than not, so
//! the parser takes the widest `{ ... }` span it can find and is lenient
//! about field types inside it. Only a missing or unparseable object is an
//! error.

use docrule_core::{Status, VerdictRecord};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Evidence used when the model gives none.
pub const DEFAULT_EVIDENCE: &str = "No supporting evidence provided.";

/// Reasoning used when the model gives none.
pub const DEFAULT_REASONING: &str = "LLM did not provide reasoning.";

/// Errors from response parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("LLM response lacked JSON payload")]
    MalformedResponse,

    #[error("Invalid JSON in LLM response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Greedy span from the first `{` to the last `}` after it.
pub fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse a model answer into a verdict for `rule`.
///
/// The returned record always carries `rule` as given, whatever the model
/// echoed back.
pub fn extract_verdict(raw: &str, rule: &str) -> Result<VerdictRecord, ParseError> {
    let span = json_span(raw).ok_or(ParseError::MalformedResponse)?;
    let value: JsonValue = serde_json::from_str(span)?;

    let empty = Map::new();
    let fields = value.as_object().unwrap_or(&empty);

    let status = match fields.get("status") {
        Some(JsonValue::String(s)) if s.eq_ignore_ascii_case("pass") => Status::Pass,
        _ => Status::Fail,
    };

    let evidence = text_field(fields.get("evidence")).unwrap_or_else(|| DEFAULT_EVIDENCE.to_string());
    let reasoning =
        text_field(fields.get("reasoning")).unwrap_or_else(|| DEFAULT_REASONING.to_string());
    let confidence = coerce_confidence(fields.get("confidence"));

    Ok(VerdictRecord::new(rule, status, evidence, reasoning, confidence))
}

/// A usable text value, or `None` for absent, null, empty, zero or false.
fn text_field(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Bool(true) => Some("true".to_string()),
        JsonValue::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        other @ (JsonValue::Array(_) | JsonValue::Object(_)) => Some(other.to_string()),
        _ => None,
    }
}

/// Numeric confidence clamped to `0..=100` and rounded; unusable input is 0.
fn coerce_confidence(value: Option<&JsonValue>) -> i64 {
    let number = match value {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(JsonValue::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };

    if number.is_nan() {
        return 0;
    }
    number.clamp(0.0, 100.0).round() as i64
}
