use serde_json::{Map, Value};

use super::string_field;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub affected_user: Option<String>,
    /// Raw `membership` value (`join`, `leave`, `invite`, ...); empty if absent.
    pub membership_state: String,
    /// Sender of the member event, filled in by the classifier.
    pub sender: Option<String>,
}

pub fn extract_membership(payload: &Map<String, Value>) -> MembershipChange {
    MembershipChange {
        affected_user: string_field(payload, "displayname").map(str::to_owned),
        membership_state: string_field(payload, "membership").unwrap_or_default().to_owned(),
        sender: None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_displayname_and_membership() {
        let payload = json!({ "displayname": "Alice", "membership": "join" });
        let change = extract_membership(payload.as_object().unwrap());
        assert_eq!(change.affected_user.as_deref(), Some("Alice"));
        assert_eq!(change.membership_state, "join");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let change = extract_membership(&Map::new());
        assert_eq!(change, MembershipChange::default());
    }

    #[test]
    fn null_displayname_is_absent() {
        let payload = json!({ "displayname": null, "membership": 3 });
        let change = extract_membership(payload.as_object().unwrap());
        assert_eq!(change.affected_user, None);
        assert_eq!(change.membership_state, "");
    }
}
