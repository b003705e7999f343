use matrix_sdk::ruma::OwnedRoomId;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A timeline event as delivered by the timeline source, before any
/// interpretation. Everything except the type tag may be missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawEvent {
    pub type_tag: String,
    pub payload: Map<String, Value>,
    /// The redaction event that removed this event's content, if any.
    pub redaction_record: Option<Map<String, Value>>,
    pub event_id: Option<String>,
    pub sender: Option<String>,
    pub origin_server_ts: Option<i64>,
}

impl RawEvent {
    pub fn new(type_tag: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            type_tag: type_tag.into(),
            payload,
            ..Self::default()
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_redaction(mut self, record: Map<String, Value>) -> Self {
        self.redaction_record = Some(record);
        self
    }

    pub fn is_redacted(&self) -> bool {
        self.redaction_record.is_some()
    }

    /// Build from a client-server API event object. Wrong-typed envelope
    /// fields are dropped rather than rejected; only a missing `type` is
    /// an error.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let wire = WireEvent::deserialize(value).map_err(|e| format!("Invalid event: {e}"))?;
        Ok(wire.into())
    }
}

#[derive(Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    unsigned: Value,
    #[serde(default)]
    event_id: Value,
    #[serde(default)]
    sender: Value,
    #[serde(default)]
    origin_server_ts: Value,
}

impl From<WireEvent> for RawEvent {
    fn from(wire: WireEvent) -> Self {
        let payload = match wire.content {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let redaction_record = match wire.unsigned {
            Value::Object(mut unsigned) => match unsigned.remove("redacted_because") {
                Some(Value::Object(record)) => Some(record),
                _ => None,
            },
            _ => None,
        };
        Self {
            type_tag: wire.type_tag,
            payload,
            redaction_record,
            event_id: wire.event_id.as_str().map(str::to_owned),
            sender: wire.sender.as_str().map(str::to_owned),
            origin_server_ts: wire.origin_server_ts.as_i64(),
        }
    }
}

/// One annotation on a message, as aggregated by the timeline source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reaction {
    pub event_id: String,
    pub sender: String,
    pub key: String,
}

/// Whether a message is visually joined to the neighbouring message of the
/// same sender above and/or below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConnectedEdges(u8);

impl ConnectedEdges {
    pub const NONE: Self = Self(0);
    pub const TOP: Self = Self(0b01);
    pub const BOTTOM: Self = Self(0b10);
    pub const BOTH: Self = Self(0b11);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ConnectedEdges {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoomMembership {
    Invited,
    #[default]
    Joined,
    Left,
}

#[derive(Clone, Debug)]
pub struct RoomEntry {
    pub room_id: OwnedRoomId,
    pub name: String,
    pub membership: RoomMembership,
}

impl RoomEntry {
    /// Name shown in confirmation prompts; falls back to the room ID.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.room_id.as_str()
        } else {
            &self.name
        }
    }
}
