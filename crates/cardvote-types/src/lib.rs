//! Type definitions for the cardvote room protocol
//!
//! This crate is the shared contract between the room service and its
//! clients: the JSON events exchanged over a room socket, the room and
//! user identifiers that address a connection, and the room rules packed
//! into the leading digit of a room id.
//!
//! ## Example
//!
//! ```rust
//! use cardvote_types::{ClientEvent, RoomId, RoomRules};
//!
//! let rules = RoomRules::new(3, 2).unwrap();
//! let room = RoomId::generate(rules);
//! assert_eq!(room.rules().users_count(), 3);
//!
//! let json = ClientEvent::update_user_name("alice").to_json().unwrap();
//! assert!(json.contains("update user name"));
//! ```

pub mod error;
pub mod events;
pub mod room;

pub use error::*;
pub use events::*;
pub use room::*;

use std::collections::BTreeMap;

/// Connected user ids per room, as served by the service root endpoint.
pub type RoomOverview = BTreeMap<String, Vec<String>>;

/// Placeholder selection meaning "leave it to chance".
pub const DEFAULT_SELECTION: &str = "おまかせ";
