use matrix_sdk::config::SyncSettings;
use matrix_sdk::ruma::api::client::filter::FilterDefinition;
use matrix_sdk::{Client, RoomState};

use crate::message::{RoomEntry, RoomMembership};

/// One lazy-loading sync round, enough to populate the room list.
pub async fn sync_once(client: &Client) -> Result<String, String> {
    let filter = FilterDefinition::with_lazy_loading();
    let settings = SyncSettings::default().filter(filter.into());

    let response = client
        .sync_once(settings)
        .await
        .map_err(|e| format!("Sync failed: {e}"))?;
    Ok(response.next_batch)
}

pub fn collect_rooms(client: &Client) -> Vec<RoomEntry> {
    client
        .rooms()
        .into_iter()
        .map(|room| {
            let membership = match room.state() {
                RoomState::Invited => RoomMembership::Invited,
                RoomState::Joined => RoomMembership::Joined,
                _ => RoomMembership::Left,
            };
            let name = room
                .cached_display_name()
                .map(|n| n.to_string())
                .unwrap_or_default();
            RoomEntry {
                room_id: room.room_id().to_owned(),
                name,
                membership,
            }
        })
        .collect()
}
