use serde_json::{Map, Value};

use super::EventContext;
use crate::message::{ConnectedEdges, RawEvent, Reaction};

/// Why a `m.room.message` event could not be turned into a [`MessageModel`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MessageModelError {
    #[error("event has no sender")]
    MissingSender,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is not a string")]
    WrongType(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Emote,
    Notice,
    Image,
    File,
    Audio,
    Video,
    Unsupported(String),
}

impl MessageKind {
    fn from_msgtype(msgtype: &str) -> Self {
        match msgtype {
            "m.text" => MessageKind::Text,
            "m.emote" => MessageKind::Emote,
            "m.notice" => MessageKind::Notice,
            "m.image" => MessageKind::Image,
            "m.file" => MessageKind::File,
            "m.audio" => MessageKind::Audio,
            "m.video" => MessageKind::Video,
            other => MessageKind::Unsupported(other.to_owned()),
        }
    }

    /// Placeholder shown instead of the body for kinds without inline text.
    fn placeholder(&self) -> Option<&'static str> {
        match self {
            MessageKind::File => Some("[File]"),
            MessageKind::Audio => Some("[Audio]"),
            MessageKind::Video => Some("[Video]"),
            MessageKind::Unsupported(_) => Some("[Unsupported message type]"),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyPreview {
    pub sender: String,
    pub preview: String,
}

/// All reactions with the same key, senders in first-seen order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionGroup {
    pub key: String,
    pub senders: Vec<String>,
}

impl ReactionGroup {
    pub fn count(&self) -> usize {
        self.senders.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageModel {
    pub event_id: Option<String>,
    pub sender: String,
    /// Markup source for the body, with any reply fallback removed.
    pub body: String,
    pub kind: MessageKind,
    pub timestamp: Option<String>,
    pub reactions: Vec<ReactionGroup>,
    pub edges: ConnectedEdges,
    pub show_sender: bool,
    pub edited: bool,
    pub reply: Option<ReplyPreview>,
}

impl MessageModel {
    pub fn from_event(event: &RawEvent, context: &EventContext<'_>) -> Result<Self, MessageModelError> {
        let sender = event.sender.clone().ok_or(MessageModelError::MissingSender)?;
        let raw_body = required_str(&event.payload, "body")?;
        let kind = MessageKind::from_msgtype(required_str(&event.payload, "msgtype")?);

        let (reply, body) = match kind.placeholder() {
            Some(label) => (None, label.to_owned()),
            None => strip_reply_fallback(raw_body),
        };

        let timestamp = event
            .origin_server_ts
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.format("%H:%M").to_string());

        Ok(Self {
            event_id: event.event_id.clone(),
            sender,
            body,
            kind,
            timestamp,
            reactions: group_reactions(context.reactions),
            edges: context.edges,
            show_sender: !context.edges.contains(ConnectedEdges::TOP),
            edited: event.payload.contains_key("m.new_content"),
            reply,
        })
    }

    pub fn is_emote(&self) -> bool {
        self.kind == MessageKind::Emote
    }
}

fn required_str<'a>(
    payload: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, MessageModelError> {
    match payload.get(key) {
        None | Some(Value::Null) => Err(MessageModelError::MissingField(key)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(MessageModelError::WrongType(key)),
    }
}

fn group_reactions(reactions: &[Reaction]) -> Vec<ReactionGroup> {
    let mut groups: Vec<ReactionGroup> = Vec::new();
    for reaction in reactions {
        match groups.iter_mut().find(|g| g.key == reaction.key) {
            Some(group) => {
                if !group.senders.contains(&reaction.sender) {
                    group.senders.push(reaction.sender.clone());
                }
            }
            None => groups.push(ReactionGroup {
                key: reaction.key.clone(),
                senders: vec![reaction.sender.clone()],
            }),
        }
    }
    groups
}

/// Split a `> <@user:server> quoted text` reply fallback off the body.
fn strip_reply_fallback(body: &str) -> (Option<ReplyPreview>, String) {
    if !body.starts_with("> <@") {
        return (None, body.to_owned());
    }
    let (quote_block, real_body) = match body.find("\n\n") {
        Some(pos) => (&body[..pos], body[pos + 2..].to_owned()),
        None => return (None, body.to_owned()),
    };
    let first_line = quote_block.lines().next().unwrap_or("");
    let after_prefix = first_line.strip_prefix("> ").unwrap_or(first_line);

    let sender = after_prefix
        .strip_prefix('<')
        .and_then(|s| s.find('>').map(|i| s[..i].to_owned()))
        .unwrap_or_else(|| "@unknown".to_owned());

    let quoted_text = after_prefix
        .find('>')
        .map(|i| after_prefix[i + 1..].trim())
        .unwrap_or("");
    let preview: String = quoted_text.chars().take(80).collect();

    (Some(ReplyPreview { sender, preview }), real_body)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(content: Value) -> RawEvent {
        let payload = content.as_object().cloned().unwrap_or_default();
        RawEvent::new("m.room.message", payload)
            .with_sender("@bob:example.org")
            .with_event_id("$1")
    }

    fn build(event: &RawEvent) -> Result<MessageModel, MessageModelError> {
        MessageModel::from_event(event, &EventContext::default())
    }

    #[test]
    fn text_message() {
        let mut event = message(json!({ "msgtype": "m.text", "body": "hello" }));
        event.origin_server_ts = Some(0);
        let model = build(&event).unwrap();
        assert_eq!(model.sender, "@bob:example.org");
        assert_eq!(model.body, "hello");
        assert_eq!(model.kind, MessageKind::Text);
        assert_eq!(model.timestamp.as_deref(), Some("00:00"));
        assert!(model.show_sender);
        assert!(!model.edited);
        assert!(model.reply.is_none());
    }

    #[test]
    fn missing_sender() {
        let mut event = message(json!({ "msgtype": "m.text", "body": "hello" }));
        event.sender = None;
        assert_eq!(build(&event), Err(MessageModelError::MissingSender));
    }

    #[test]
    fn missing_or_wrong_body() {
        let event = message(json!({ "msgtype": "m.text" }));
        assert_eq!(build(&event), Err(MessageModelError::MissingField("body")));

        let event = message(json!({ "msgtype": "m.text", "body": { "nested": true } }));
        assert_eq!(build(&event), Err(MessageModelError::WrongType("body")));
    }

    #[test]
    fn missing_msgtype() {
        let event = message(json!({ "body": "hi" }));
        assert_eq!(build(&event), Err(MessageModelError::MissingField("msgtype")));
    }

    #[test]
    fn media_kinds_use_placeholders() {
        let model = build(&message(json!({ "msgtype": "m.file", "body": "report.pdf" }))).unwrap();
        assert_eq!(model.body, "[File]");

        let model = build(&message(json!({ "msgtype": "org.example.poll", "body": "?" }))).unwrap();
        assert_eq!(model.kind, MessageKind::Unsupported("org.example.poll".into()));
        assert_eq!(model.body, "[Unsupported message type]");

        let model = build(&message(json!({ "msgtype": "m.image", "body": "cat.png" }))).unwrap();
        assert_eq!(model.body, "cat.png");
    }

    #[test]
    fn reply_fallback_is_stripped() {
        let body = "> <@alice:example.org> what time is it?\n\nnoon";
        let model = build(&message(json!({ "msgtype": "m.text", "body": body }))).unwrap();
        assert_eq!(model.body, "noon");
        assert_eq!(
            model.reply,
            Some(ReplyPreview {
                sender: "@alice:example.org".into(),
                preview: "what time is it?".into(),
            })
        );
    }

    #[test]
    fn edits_are_flagged() {
        let event = message(json!({
            "msgtype": "m.text",
            "body": "* fixed",
            "m.new_content": { "msgtype": "m.text", "body": "fixed" }
        }));
        assert!(build(&event).unwrap().edited);
    }

    #[test]
    fn reactions_grouped_and_edges_hide_sender() {
        let reactions = [
            Reaction { event_id: "$r1".into(), sender: "@a:x".into(), key: "👍".into() },
            Reaction { event_id: "$r2".into(), sender: "@b:x".into(), key: "🎉".into() },
            Reaction { event_id: "$r3".into(), sender: "@c:x".into(), key: "👍".into() },
            Reaction { event_id: "$r4".into(), sender: "@a:x".into(), key: "👍".into() },
        ];
        let context = EventContext { reactions: &reactions, edges: ConnectedEdges::TOP };
        let event = message(json!({ "msgtype": "m.text", "body": "hi" }));
        let model = MessageModel::from_event(&event, &context).unwrap();

        assert!(!model.show_sender);
        assert_eq!(model.reactions.len(), 2);
        assert_eq!(model.reactions[0].key, "👍");
        assert_eq!(model.reactions[0].count(), 2);
        assert_eq!(model.reactions[1].key, "🎉");
        assert_eq!(model.reactions[1].count(), 1);
    }
}
