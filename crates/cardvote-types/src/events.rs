//! Messages exchanged over a room socket.
//!
//! Client messages are tagged with a snake_case `event_type` field while
//! service messages use a camelCase `eventType` field. Both shapes are
//! what browser clients already speak, so the tags and field names here
//! must not change.

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::room::UserId;

/// Tag of [`ClientEvent::SubmitSelections`].
pub const SUBMIT_SELECTIONS: &str = "submit selections";
/// Tag of [`ClientEvent::UpdateUserName`].
pub const UPDATE_USER_NAME: &str = "update user name";
/// Tag of [`ServerEvent::UsersUpdated`].
pub const USERS_UPDATED: &str = "users updated";
/// Tag of [`ServerEvent::VotingCompleted`].
pub const VOTING_COMPLETED: &str = "voting completed";

/// A message sent by a player to the room service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ClientEvent {
    /// The player's vote.
    #[serde(rename = "submit selections")]
    SubmitSelections {
        /// Card names, one per selection slot.
        selections: Vec<String>,
    },
    /// Change the name shown to the other players.
    #[serde(rename = "update user name")]
    UpdateUserName {
        /// The new display name.
        user_name: String,
    },
}

impl ClientEvent {
    pub fn submit_selections(selections: Vec<String>) -> Self {
        Self::SubmitSelections { selections }
    }

    pub fn update_user_name(user_name: impl Into<String>) -> Self {
        Self::UpdateUserName {
            user_name: user_name.into(),
        }
    }

    /// The wire tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SubmitSelections { .. } => SUBMIT_SELECTIONS,
            Self::UpdateUserName { .. } => UPDATE_USER_NAME,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, TypesError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, TypesError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Per-player status in a `users updated` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    /// Connection path user id. Older services omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Display name.
    pub user_name: String,
    /// Whether the player has submitted selections.
    pub submitted: bool,
}

impl UserStatus {
    pub fn new(user_id: UserId, user_name: impl Into<String>, submitted: bool) -> Self {
        Self {
            user_id: Some(user_id),
            user_name: user_name.into(),
            submitted,
        }
    }
}

/// A message broadcast by the room service to every player in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum ServerEvent {
    /// Membership, names or submission state changed.
    #[serde(rename = "users updated")]
    UsersUpdated {
        /// Players in join order.
        users: Vec<UserStatus>,
    },
    /// Every player has submitted.
    #[serde(rename = "voting completed")]
    VotingCompleted {
        /// Distinct selected cards in order of first appearance.
        cards: Vec<String>,
        /// One human readable line per player.
        logs: Vec<String>,
    },
}

impl ServerEvent {
    pub fn users_updated(users: Vec<UserStatus>) -> Self {
        Self::UsersUpdated { users }
    }

    pub fn voting_completed(cards: Vec<String>, logs: Vec<String>) -> Self {
        Self::VotingCompleted { cards, logs }
    }

    /// The wire tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UsersUpdated { .. } => USERS_UPDATED,
            Self::VotingCompleted { .. } => VOTING_COMPLETED,
        }
    }

    pub fn is_voting_completed(&self) -> bool {
        matches!(self, Self::VotingCompleted { .. })
    }

    pub fn from_json(text: &str) -> Result<Self, TypesError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, TypesError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_wire_shape() {
        let submit = ClientEvent::submit_selections(vec!["Village".into(), "Smithy".into()]);
        assert_eq!(
            serde_json::to_value(&submit).unwrap(),
            json!({"event_type": "submit selections", "selections": ["Village", "Smithy"]})
        );

        let rename = ClientEvent::update_user_name("alice");
        assert_eq!(
            serde_json::to_value(&rename).unwrap(),
            json!({"event_type": "update user name", "user_name": "alice"})
        );
    }

    #[test]
    fn test_client_event_decodes_browser_payload() {
        let event =
            ClientEvent::from_json(r#"{"event_type":"update user name","user_name":"ボブ"}"#)
                .unwrap();
        assert_eq!(event, ClientEvent::update_user_name("ボブ"));
        assert_eq!(event.event_type(), UPDATE_USER_NAME);
    }

    #[test]
    fn test_client_event_rejects_unknown_type() {
        let err = ClientEvent::from_json(r#"{"event_type":"dance","steps":3}"#).unwrap_err();
        assert!(matches!(err, TypesError::InvalidMessage(_)));
        assert!(ClientEvent::from_json("not json").is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let users = ServerEvent::users_updated(vec![UserStatus::new(
            UserId::parse("ab12cd34").unwrap(),
            "alice",
            true,
        )]);
        assert_eq!(
            serde_json::to_value(&users).unwrap(),
            json!({
                "eventType": "users updated",
                "users": [{"userId": "ab12cd34", "userName": "alice", "submitted": true}]
            })
        );

        let done = ServerEvent::voting_completed(vec!["Moat".into()], vec!["log".into()]);
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            json!({"eventType": "voting completed", "cards": ["Moat"], "logs": ["log"]})
        );
        assert!(done.is_voting_completed());
    }

    #[test]
    fn test_user_status_without_user_id() {
        let event = ServerEvent::from_json(
            r#"{"eventType":"users updated","users":[{"userName":"bob","submitted":false}]}"#,
        )
        .unwrap();
        match event {
            ServerEvent::UsersUpdated { users } => {
                assert_eq!(users.len(), 1);
                assert!(users[0].user_id.is_none());
                assert!(!users[0].submitted);
            }
            _ => panic!("Expected users updated event"),
        }
    }
}
