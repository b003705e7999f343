use matrix_sdk::ruma::{OwnedRoomId, RoomId};

use crate::message::RoomEntry;

/// Session-side removal of a room (leave, or reject an invite).
///
/// Fire-and-forget: the implementation owns retries and failure reporting.
pub trait RoomRemover {
    fn request_removal(&self, room_id: &RoomId);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LeaveState {
    #[default]
    Idle,
    PendingConfirmation(usize),
    /// Removal requested; only held while the request is being issued.
    Resolved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    Removed(OwnedRoomId),
    /// The pending index no longer exists in the list.
    Cancelled,
    /// Nothing was pending.
    Nothing,
}

/// Pending "remove this room" choice for one room list section, gated on an
/// explicit confirmation.
#[derive(Clone, Debug, Default)]
pub struct LeaveSelection {
    state: LeaveState,
}

impl LeaveSelection {
    pub fn state(&self) -> LeaveState {
        self.state
    }

    pub fn pending_index(&self) -> Option<usize> {
        match self.state {
            LeaveState::PendingConfirmation(index) => Some(index),
            _ => None,
        }
    }

    /// Whether the confirmation prompt should be shown.
    pub fn is_confirming(&self) -> bool {
        self.pending_index().is_some()
    }

    /// Removal gesture on `index`. A second gesture before resolution
    /// replaces the first.
    pub fn begin(&mut self, index: usize) {
        self.state = LeaveState::PendingConfirmation(index);
    }

    pub fn cancel(&mut self) {
        self.state = LeaveState::Idle;
    }

    pub fn pending_room<'a>(&self, rooms: &'a [RoomEntry]) -> Option<&'a RoomEntry> {
        self.pending_index().and_then(|index| rooms.get(index))
    }

    /// Issue the removal for the pending room, if it still exists.
    pub fn confirm(&mut self, rooms: &[RoomEntry], remover: &dyn RoomRemover) -> LeaveOutcome {
        let LeaveState::PendingConfirmation(index) = self.state else {
            return LeaveOutcome::Nothing;
        };
        let Some(room) = rooms.get(index) else {
            tracing::debug!("Leave target {index} gone (list has {} rooms)", rooms.len());
            self.state = LeaveState::Idle;
            return LeaveOutcome::Cancelled;
        };

        self.state = LeaveState::Resolved;
        remover.request_removal(&room.room_id);
        self.state = LeaveState::Idle;
        LeaveOutcome::Removed(room.room_id.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::message::RoomMembership;

    #[derive(Default)]
    pub(crate) struct RecordingRemover {
        pub(crate) removed: RefCell<Vec<OwnedRoomId>>,
    }

    impl RoomRemover for RecordingRemover {
        fn request_removal(&self, room_id: &RoomId) {
            self.removed.borrow_mut().push(room_id.to_owned());
        }
    }

    pub(crate) fn room(id: &str, membership: RoomMembership) -> RoomEntry {
        RoomEntry {
            room_id: OwnedRoomId::try_from(id).unwrap(),
            name: String::new(),
            membership,
        }
    }

    fn rooms(n: usize) -> Vec<RoomEntry> {
        (0..n)
            .map(|i| room(&format!("!r{i}:example.org"), RoomMembership::Joined))
            .collect()
    }

    #[test]
    fn confirm_removes_pending_room() {
        let list = rooms(3);
        let remover = RecordingRemover::default();
        let mut selection = LeaveSelection::default();

        selection.begin(1);
        assert_eq!(selection.state(), LeaveState::PendingConfirmation(1));
        assert_eq!(selection.pending_room(&list).map(|r| r.room_id.as_str()), Some("!r1:example.org"));

        let outcome = selection.confirm(&list, &remover);
        assert_eq!(outcome, LeaveOutcome::Removed(list[1].room_id.clone()));
        assert_eq!(*remover.removed.borrow(), vec![list[1].room_id.clone()]);
        assert_eq!(selection.state(), LeaveState::Idle);
    }

    #[test]
    fn cancel_has_no_side_effect() {
        let list = rooms(3);
        let remover = RecordingRemover::default();
        let mut selection = LeaveSelection::default();

        selection.begin(0);
        selection.cancel();
        assert_eq!(selection.state(), LeaveState::Idle);
        assert_eq!(selection.confirm(&list, &remover), LeaveOutcome::Nothing);
        assert!(remover.removed.borrow().is_empty());
    }

    #[test]
    fn shrunk_list_turns_confirm_into_cancel() {
        let remover = RecordingRemover::default();
        let mut selection = LeaveSelection::default();

        selection.begin(2);
        let shrunk = rooms(2);
        assert!(selection.pending_room(&shrunk).is_none());
        assert_eq!(selection.confirm(&shrunk, &remover), LeaveOutcome::Cancelled);
        assert!(remover.removed.borrow().is_empty());
        assert_eq!(selection.state(), LeaveState::Idle);
    }

    #[test]
    fn later_gesture_replaces_pending_index() {
        let list = rooms(3);
        let remover = RecordingRemover::default();
        let mut selection = LeaveSelection::default();

        selection.begin(0);
        selection.begin(2);
        assert_eq!(selection.pending_index(), Some(2));
        selection.confirm(&list, &remover);
        assert_eq!(*remover.removed.borrow(), vec![list[2].room_id.clone()]);
    }
}
