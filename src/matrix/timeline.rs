use matrix_sdk::room::MessagesOptions;
use matrix_sdk::Room;

use crate::message::RawEvent;

/// The latest page of a room's timeline, oldest first, with the token for
/// the next backward page.
pub async fn load_room_events(room: &Room) -> Result<(Vec<RawEvent>, Option<String>), String> {
    load_page(room, MessagesOptions::backward()).await
}

/// The page before `token`, as returned by an earlier load.
pub async fn load_earlier_events(
    room: &Room,
    token: &str,
) -> Result<(Vec<RawEvent>, Option<String>), String> {
    let mut options = MessagesOptions::backward();
    options.from = Some(token.to_owned());
    load_page(room, options).await
}

async fn load_page(
    room: &Room,
    options: MessagesOptions,
) -> Result<(Vec<RawEvent>, Option<String>), String> {
    let messages = room
        .messages(options)
        .await
        .map_err(|e| format!("Failed to load messages for {}: {e}", room.room_id()))?;

    let mut events = Vec::with_capacity(messages.chunk.len());
    // Backward pagination returns newest first.
    for event in messages.chunk.iter().rev() {
        let json = match event.raw().deserialize_as::<serde_json::Value>() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Skipping undecodable event in {}: {e}", room.room_id());
                continue;
            }
        };
        match RawEvent::from_json(&json) {
            Ok(raw) => events.push(raw),
            Err(e) => tracing::warn!("Skipping event in {}: {e}", room.room_id()),
        }
    }

    Ok((events, messages.end))
}
