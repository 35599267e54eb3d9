//! Error types for the room service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use cardvote_types::TypesError;
use serde_json::json;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the room service.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Room id, user id or message failed validation
    #[error(transparent)]
    Types(#[from] TypesError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The room already holds as many players as its rules allow
    #[error("Room {room_id} is full ({capacity} players)")]
    RoomFull { room_id: String, capacity: usize },

    /// The service refuses to open more rooms
    #[error("Room limit of {0} reached")]
    TooManyRooms(usize),

    /// The user is not connected to the room
    #[error("User {user_id} is not connected to room {room_id}")]
    NotConnected { room_id: String, user_id: String },

    /// Selections do not fit the room rules
    #[error("Invalid selections: {0}")]
    InvalidSelections(String),

    /// Invalid request format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn room_full(room_id: impl Into<String>, capacity: usize) -> Self {
        Self::RoomFull {
            room_id: room_id.into(),
            capacity,
        }
    }

    pub fn not_connected(room_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::NotConnected {
            room_id: room_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn invalid_selections(msg: impl Into<String>) -> Self {
        Self::InvalidSelections(msg.into())
    }

    /// Create a new invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert ServerError to HTTP status code
impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Types(_)
            | ServerError::InvalidSelections(_)
            | ServerError::InvalidRequest(_) => 400,
            ServerError::NotConnected { .. } => 404,
            ServerError::RoomFull { .. } => 409,
            ServerError::TooManyRooms(_) => 503,
            ServerError::Io(_) | ServerError::Config(_) | ServerError::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Types(TypesError::InvalidRoomId(..)) => "invalid_room_id",
            ServerError::Types(TypesError::InvalidUserId(_)) => "invalid_user_id",
            ServerError::Types(_) => "invalid_message",
            ServerError::Io(_) => "io_error",
            ServerError::RoomFull { .. } => "room_full",
            ServerError::TooManyRooms(_) => "too_many_rooms",
            ServerError::NotConnected { .. } => "not_connected",
            ServerError::InvalidSelections(_) => "invalid_selections",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": self.error_type(),
            "details": self.to_string(),
            "timestamp": chrono::Utc::now()
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::room_full("4abc", 3).status_code(), 409);
        assert_eq!(ServerError::not_connected("4abc", "u1").status_code(), 404);
        assert_eq!(
            ServerError::from(TypesError::invalid_room_id("x", "no digit")).status_code(),
            400
        );
        assert_eq!(ServerError::TooManyRooms(1).status_code(), 503);
        assert_eq!(ServerError::internal("boom").status_code(), 500);
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ServerError::from(TypesError::invalid_room_id("x", "no digit")).error_type(),
            "invalid_room_id"
        );
        assert_eq!(
            ServerError::invalid_selections("empty").error_type(),
            "invalid_selections"
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ServerError::room_full("4abc", 3).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
