use serde_json::{Map, Value};

use super::string_field;

/// Shown when a redaction record does not say who performed it.
pub const UNKNOWN_ACTOR: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedactionInfo {
    pub actor: String,
    pub reason: Option<String>,
    /// Sender of the removed message, filled in by the classifier.
    pub sender: Option<String>,
}

pub fn resolve_redaction(record: &Map<String, Value>) -> RedactionInfo {
    let actor = string_field(record, "sender").unwrap_or(UNKNOWN_ACTOR).to_owned();
    let reason = record
        .get("content")
        .and_then(Value::as_object)
        .and_then(|content| string_field(content, "body"))
        .map(str::to_owned);
    RedactionInfo {
        actor,
        reason,
        sender: None,
    }
}
