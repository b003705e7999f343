pub mod client;
pub mod sync;
pub mod timeline;

use std::fmt;

use matrix_sdk::ruma::RoomId;
use matrix_sdk::Client;

use crate::state::leave::RoomRemover;

/// Logged-in session, used as the room list's removal collaborator.
#[derive(Clone)]
pub struct MatrixClient(pub Client);

impl fmt::Debug for MatrixClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MatrixClient")
            .field(&self.0.user_id().map(|u| u.as_str()))
            .finish()
    }
}

impl RoomRemover for MatrixClient {
    fn request_removal(&self, room_id: &RoomId) {
        let Some(room) = self.0.get_room(room_id) else {
            tracing::warn!("Cannot leave unknown room {room_id}");
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime to leave {room_id} on");
            return;
        };
        handle.spawn(async move {
            match room.leave().await {
                Ok(()) => tracing::info!("Left {}", room.room_id()),
                Err(e) => tracing::warn!("Failed to leave {}: {e}", room.room_id()),
            }
        });
    }
}
