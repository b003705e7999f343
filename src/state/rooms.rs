use crate::message::{RoomEntry, RoomMembership};
use crate::state::leave::{LeaveOutcome, LeaveSelection, RoomRemover};

pub const SECTION_INVITES: &str = "invites";
pub const SECTION_CONVERSATIONS: &str = "conversations";

/// A section of the room list.
#[derive(Debug, Clone)]
pub struct RoomSection {
    pub key: &'static str,
    pub label: &'static str,
    /// Title of the removal confirmation prompt.
    pub alert_title: &'static str,
    pub rooms: Vec<RoomEntry>,
}

/// Text of the removal confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeavePrompt {
    pub title: &'static str,
    pub body: String,
}

#[derive(Default)]
pub struct RoomsState {
    pub rooms: Vec<RoomEntry>,
    invites_leave: LeaveSelection,
    conversations_leave: LeaveSelection,
}

impl RoomsState {
    pub fn update_rooms(&mut self, rooms: Vec<RoomEntry>) {
        self.rooms = rooms;
    }

    fn with_membership(&self, membership: RoomMembership) -> Vec<RoomEntry> {
        self.rooms
            .iter()
            .filter(|r| r.membership == membership)
            .cloned()
            .collect()
    }

    pub fn invited_rooms(&self) -> Vec<RoomEntry> {
        self.with_membership(RoomMembership::Invited)
    }

    pub fn joined_rooms(&self) -> Vec<RoomEntry> {
        self.with_membership(RoomMembership::Joined)
    }

    /// Pending invitations (only when there are any), then joined rooms.
    pub fn sections(&self) -> Vec<RoomSection> {
        let mut sections = Vec::new();
        let invites = self.invited_rooms();
        if !invites.is_empty() {
            sections.push(RoomSection {
                key: SECTION_INVITES,
                label: "Pending Invitations",
                alert_title: alert_title(SECTION_INVITES),
                rooms: invites,
            });
        }
        sections.push(RoomSection {
            key: SECTION_CONVERSATIONS,
            label: "Recent Conversations",
            alert_title: alert_title(SECTION_CONVERSATIONS),
            rooms: self.joined_rooms(),
        });
        sections
    }

    fn section_rooms(&self, key: &str) -> Vec<RoomEntry> {
        match key {
            SECTION_INVITES => self.invited_rooms(),
            _ => self.joined_rooms(),
        }
    }

    pub fn leave_selection(&self, key: &str) -> &LeaveSelection {
        match key {
            SECTION_INVITES => &self.invites_leave,
            _ => &self.conversations_leave,
        }
    }

    fn leave_selection_mut(&mut self, key: &str) -> &mut LeaveSelection {
        match key {
            SECTION_INVITES => &mut self.invites_leave,
            _ => &mut self.conversations_leave,
        }
    }

    pub fn begin_leave(&mut self, key: &str, index: usize) {
        self.leave_selection_mut(key).begin(index);
    }

    pub fn cancel_leave(&mut self, key: &str) {
        self.leave_selection_mut(key).cancel();
    }

    pub fn confirm_leave(&mut self, key: &str, remover: &dyn RoomRemover) -> LeaveOutcome {
        let rooms = self.section_rooms(key);
        self.leave_selection_mut(key).confirm(&rooms, remover)
    }

    /// Prompt for the section's pending removal, if one is pending.
    pub fn leave_prompt(&self, key: &str) -> Option<LeavePrompt> {
        let selection = self.leave_selection(key);
        if !selection.is_confirming() {
            return None;
        }
        let rooms = self.section_rooms(key);
        let name = selection
            .pending_room(&rooms)
            .map(|r| r.display_name().to_owned())
            .unwrap_or_default();
        Some(LeavePrompt {
            title: alert_title(key),
            body: format!("Are you sure you want to leave {name}?"),
        })
    }
}

fn alert_title(key: &str) -> &'static str {
    match key {
        SECTION_INVITES => "Reject Invitation?",
        _ => "Leave Room?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::leave::tests::{room, RecordingRemover};

    fn state() -> RoomsState {
        let mut state = RoomsState::default();
        state.update_rooms(vec![
            room("!a:example.org", RoomMembership::Joined),
            room("!b:example.org", RoomMembership::Invited),
            room("!c:example.org", RoomMembership::Joined),
            room("!d:example.org", RoomMembership::Left),
        ]);
        state.rooms[2].name = "Café".into();
        state
    }

    #[test]
    fn partitions_by_membership() {
        let sections = state().sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].key, SECTION_INVITES);
        assert_eq!(sections[0].rooms.len(), 1);
        assert_eq!(sections[1].key, SECTION_CONVERSATIONS);
        let ids: Vec<_> = sections[1].rooms.iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(ids, ["!a:example.org", "!c:example.org"]);
    }

    #[test]
    fn invites_section_hidden_when_empty() {
        let mut state = state();
        state.rooms.retain(|r| r.membership != RoomMembership::Invited);
        let sections = state.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].label, "Recent Conversations");
    }

    #[test]
    fn confirm_uses_section_index() {
        let mut state = state();
        let remover = RecordingRemover::default();

        state.begin_leave(SECTION_CONVERSATIONS, 1);
        assert_eq!(
            state.leave_prompt(SECTION_CONVERSATIONS),
            Some(LeavePrompt {
                title: "Leave Room?",
                body: "Are you sure you want to leave Café?".into(),
            })
        );
        assert_eq!(state.leave_prompt(SECTION_INVITES), None);

        let outcome = state.confirm_leave(SECTION_CONVERSATIONS, &remover);
        assert_eq!(outcome, LeaveOutcome::Removed(state.rooms[2].room_id.clone()));
        assert_eq!(remover.removed.borrow().len(), 1);
        assert_eq!(state.leave_prompt(SECTION_CONVERSATIONS), None);
    }

    #[test]
    fn rooms_update_before_confirm_cancels() {
        let mut state = state();
        let remover = RecordingRemover::default();

        state.begin_leave(SECTION_INVITES, 0);
        assert_eq!(
            state.leave_prompt(SECTION_INVITES).map(|p| p.body),
            Some("Are you sure you want to leave !b:example.org?".into())
        );
        state.rooms.retain(|r| r.membership != RoomMembership::Invited);

        assert_eq!(state.confirm_leave(SECTION_INVITES, &remover), LeaveOutcome::Cancelled);
        assert!(remover.removed.borrow().is_empty());
    }
}
