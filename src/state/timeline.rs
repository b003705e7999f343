use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use matrix_sdk::ruma::OwnedRoomId;
use ruma::events::TimelineEventType;
use serde_json::Value;
use tokio::sync::watch;

use crate::config::RenderSettings;
use crate::event::{classify, EventContext, RenderIntent};
use crate::markup::{self, StyledRun, TextStyle};
use crate::measure::{MeasuredSize, MeasuredText};
use crate::message::{ConnectedEdges, RawEvent, Reaction};

/// One displayed timeline event.
#[derive(Clone, Debug)]
pub struct TimelineRow {
    /// Stable key for per-row state; the event ID when there is one.
    pub key: String,
    pub intent: RenderIntent,
    /// Styled message body, for message rows only.
    pub body: Option<Arc<StyledRun>>,
}

pub struct TimelineState {
    pub room_id: Option<OwnedRoomId>,
    pub pagination_token: Option<String>,
    /// Everything received for the room, including reactions.
    events: Vec<RawEvent>,
    rows: Vec<TimelineRow>,
    sizes: HashMap<String, MeasuredText>,
    settings: RenderSettings,
    style: TextStyle,
}

impl TimelineState {
    pub fn new(settings: RenderSettings) -> Self {
        let style = settings.text_style();
        Self {
            room_id: None,
            pagination_token: None,
            events: Vec::new(),
            rows: Vec::new(),
            sizes: HashMap::new(),
            settings,
            style,
        }
    }

    pub fn clear(&mut self) {
        self.room_id = None;
        self.pagination_token = None;
        self.events.clear();
        self.rows.clear();
        self.sizes.clear();
    }

    pub fn rows(&self) -> &[TimelineRow] {
        &self.rows
    }

    pub fn set_timeline(&mut self, room_id: OwnedRoomId, events: Vec<RawEvent>, token: Option<String>) {
        self.clear();
        self.room_id = Some(room_id);
        self.events = events;
        self.pagination_token = token;
        self.rebuild();
    }

    /// Older events loaded by back-pagination.
    pub fn prepend_events(&mut self, mut events: Vec<RawEvent>, token: Option<String>) {
        events.append(&mut self.events);
        self.events = events;
        self.pagination_token = token;
        self.rebuild();
    }

    pub fn append_events(&mut self, events: Vec<RawEvent>) {
        self.events.extend(events);
        self.rebuild();
    }

    /// Measure every message body at `max_width` (clamped to the bubble
    /// width). Long bodies are measured in the background when a runtime is
    /// available.
    pub fn measure_rows(&mut self, max_width: f32) {
        let width = max_width.min(self.settings.bubble_width);
        for row in &self.rows {
            let Some(body) = &row.body else { continue };
            let slot = self
                .sizes
                .entry(row.key.clone())
                .or_insert_with(|| MeasuredText::new(self.settings.metrics.clone()));
            if body.char_count() > self.settings.deferred_threshold {
                slot.measure_deferred(Arc::clone(body), width);
            } else {
                slot.measure(body, width);
            }
        }
    }

    /// Last published size of a row's body.
    pub fn row_size(&self, key: &str) -> Option<MeasuredSize> {
        self.sizes.get(key).map(MeasuredText::current)
    }

    pub fn subscribe_size(&self, key: &str) -> Option<watch::Receiver<MeasuredSize>> {
        self.sizes.get(key).map(MeasuredText::subscribe)
    }

    /// Whether a background measurement for the row is still running.
    pub fn is_measuring(&self, key: &str) -> bool {
        self.sizes.get(key).is_some_and(MeasuredText::is_pending)
    }

    fn rebuild(&mut self) {
        dedup_by_event_id(&mut self.events);
        let reactions = collect_reactions(&self.events);
        let shown: Vec<(usize, &RawEvent)> = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| is_displayed(event))
            .collect();
        let edges = connected_edges(shown.iter().map(|(_, event)| *event));

        self.rows = shown
            .iter()
            .zip(edges)
            .map(|(&(index, event), edges)| {
                let no_reactions = Vec::new();
                let event_reactions = event
                    .event_id
                    .as_ref()
                    .and_then(|id| reactions.get(id))
                    .unwrap_or(&no_reactions);
                let context = EventContext {
                    reactions: event_reactions,
                    edges,
                };
                let intent = classify(event, &context);
                let body = intent
                    .as_message()
                    .map(|model| Arc::new(markup::render(&model.body, &self.style)));
                TimelineRow {
                    key: event.event_id.clone().unwrap_or_else(|| format!("#{index}")),
                    intent,
                    body,
                }
            })
            .collect();

        let rows = &self.rows;
        self.sizes.retain(|key, _| rows.iter().any(|row| &row.key == key));
    }
}

/// Keeps the first copy of each event ID, so row keys (and their
/// measurement slots) are unique. Overlapping pages or a re-delivered
/// event would otherwise show twice.
fn dedup_by_event_id(events: &mut Vec<RawEvent>) {
    let mut seen = HashSet::new();
    events.retain(|event| match &event.event_id {
        Some(id) => seen.insert(id.clone()),
        None => true,
    });
}

fn event_type(event: &RawEvent) -> TimelineEventType {
    TimelineEventType::from(event.type_tag.as_str())
}

/// Reactions and redactions are folded into the events they target.
fn is_displayed(event: &RawEvent) -> bool {
    !matches!(
        event_type(event),
        TimelineEventType::Reaction | TimelineEventType::RoomRedaction
    )
}

/// Annotations keyed by the event they react to, in timeline order.
pub fn collect_reactions(events: &[RawEvent]) -> HashMap<String, Vec<Reaction>> {
    let mut map: HashMap<String, Vec<Reaction>> = HashMap::new();
    for event in events {
        if event_type(event) != TimelineEventType::Reaction || event.is_redacted() {
            continue;
        }
        let Some(relation) = event.payload.get("m.relates_to").and_then(Value::as_object) else {
            continue;
        };
        if relation.get("rel_type").and_then(Value::as_str) != Some("m.annotation") {
            continue;
        }
        let (Some(target), Some(key), Some(sender)) = (
            relation.get("event_id").and_then(Value::as_str),
            relation.get("key").and_then(Value::as_str),
            event.sender.as_deref(),
        ) else {
            continue;
        };
        map.entry(target.to_owned()).or_default().push(Reaction {
            event_id: event.event_id.clone().unwrap_or_default(),
            sender: sender.to_owned(),
            key: key.to_owned(),
        });
    }
    map
}

/// Adjacent, unredacted messages from the same sender are joined: the
/// earlier one on its bottom edge, the later one on its top edge.
pub fn connected_edges<'a>(events: impl Iterator<Item = &'a RawEvent>) -> Vec<ConnectedEdges> {
    let groupable: Vec<Option<&str>> = events
        .map(|event| {
            let is_message = event_type(event) == TimelineEventType::RoomMessage && !event.is_redacted();
            if is_message {
                event.sender.as_deref()
            } else {
                None
            }
        })
        .collect();

    let mut edges = vec![ConnectedEdges::NONE; groupable.len()];
    for i in 1..groupable.len() {
        if let (Some(prev), Some(cur)) = (groupable[i - 1], groupable[i]) {
            if prev == cur {
                edges[i - 1].insert(ConnectedEdges::BOTTOM);
                edges[i].insert(ConnectedEdges::TOP);
            }
        }
    }
    edges
}
