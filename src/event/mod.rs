//! Classification of raw timeline events into render intents.
//!
//! Every event resolves to exactly one [`RenderIntent`]. Unknown event types
//! and malformed payloads degrade to [`RenderIntent::Generic`]; nothing in
//! this module can fail.

mod membership;
mod model;
mod redaction;

use ruma::events::TimelineEventType;
use serde_json::{Map, Value};

use crate::message::{ConnectedEdges, RawEvent, Reaction};

pub use membership::{extract_membership, MembershipChange};
pub use model::{MessageKind, MessageModel, MessageModelError, ReactionGroup, ReplyPreview};
pub use redaction::{resolve_redaction, RedactionInfo, UNKNOWN_ACTOR};

#[derive(Clone, Debug, PartialEq)]
pub enum RenderIntent {
    Redacted(RedactionInfo),
    Message(MessageModel),
    MembershipChange(MembershipChange),
    Generic { type_tag: String, text: String },
}

impl RenderIntent {
    pub fn as_message(&self) -> Option<&MessageModel> {
        match self {
            RenderIntent::Message(model) => Some(model),
            _ => None,
        }
    }
}

/// Grouping metadata the timeline source supplies alongside an event.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventContext<'a> {
    pub reactions: &'a [Reaction],
    pub edges: ConnectedEdges,
}

pub fn classify(event: &RawEvent, context: &EventContext<'_>) -> RenderIntent {
    match TimelineEventType::from(event.type_tag.as_str()) {
        TimelineEventType::RoomMessage => {
            if let Some(record) = &event.redaction_record {
                let mut info = resolve_redaction(record);
                info.sender = event.sender.clone();
                return RenderIntent::Redacted(info);
            }
            match MessageModel::from_event(event, context) {
                Ok(model) => RenderIntent::Message(model),
                Err(e) => {
                    tracing::debug!(
                        "Falling back to generic view for {}: {e}",
                        event.event_id.as_deref().unwrap_or("<no id>")
                    );
                    RenderIntent::Generic {
                        type_tag: event.type_tag.clone(),
                        text: format!("{}\nUnable to display message: {e}", event.type_tag),
                    }
                }
            }
        }
        TimelineEventType::RoomMember => {
            let mut change = extract_membership(&event.payload);
            change.sender = event.sender.clone();
            RenderIntent::MembershipChange(change)
        }
        _ => RenderIntent::Generic {
            type_tag: event.type_tag.clone(),
            text: format!("{}\n{}", event.type_tag, canonical_json(&event.payload)),
        },
    }
}

pub(crate) fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Compact JSON with object keys sorted at every level, so the generic text
/// does not depend on how the payload map was built.
pub fn canonical_json(payload: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_object(payload, &mut out);
    out
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_value(&map[key.as_str()], out);
    }
    out.push('}');
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
