//! Error types for cardvote wire types.

use thiserror::Error;

/// Errors raised while validating room ids, rules and wire messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// The room id is empty, contains a path separator, or has no leading digit
    #[error("Invalid room id '{0}': {1}")]
    InvalidRoomId(String, String),

    /// The user id is empty or contains a path separator
    #[error("Invalid user id '{0}'")]
    InvalidUserId(String),

    /// Room rules outside the supported range
    #[error("Invalid room rules: {0}")]
    InvalidRules(String),

    /// A message could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl TypesError {
    pub fn invalid_room_id(room_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoomId(room_id.into(), reason.into())
    }

    pub fn invalid_rules(msg: impl Into<String>) -> Self {
        Self::InvalidRules(msg.into())
    }
}

impl From<serde_json::Error> for TypesError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMessage(err.to_string())
    }
}
