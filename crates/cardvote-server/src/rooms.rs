//! Room membership, selection aggregation and event fan-out.
//!
//! All room state sits behind one lock and every broadcast happens while it
//! is held, so each member of a room observes events in the same order.
//! Members receive events through unbounded channels; pushing to a channel
//! never waits on a slow socket.

use cardvote_types::{ClientEvent, RoomId, RoomOverview, RoomRules, ServerEvent, UserId, UserStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};

use crate::error::{Result, ServerError};
use crate::tally;

/// Outbound queue of a single connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Identifies one connection of a user.
///
/// A user id can reconnect while its previous socket is still being torn
/// down; the token keeps that stale socket from evicting the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionToken(u64);

#[derive(Debug)]
struct Member {
    user_id: UserId,
    user_name: String,
    selections: Vec<String>,
    sender: EventSender,
    token: ConnectionToken,
}

impl Member {
    fn submitted(&self) -> bool {
        !self.selections.is_empty()
    }

    fn status(&self) -> UserStatus {
        UserStatus::new(self.user_id.clone(), self.user_name.clone(), self.submitted())
    }
}

#[derive(Debug)]
struct Room {
    rules: RoomRules,
    /// Join order.
    members: Vec<Member>,
}

impl Room {
    fn new(rules: RoomRules) -> Self {
        Self {
            rules,
            members: Vec::new(),
        }
    }

    fn member_mut(&mut self, user_id: &UserId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| &m.user_id == user_id)
    }

    fn contains(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|m| &m.user_id == user_id)
    }

    fn is_full(&self) -> bool {
        self.members.len() >= self.rules.users_count()
    }

    fn submitted_count(&self) -> usize {
        self.members.iter().filter(|m| m.submitted()).count()
    }

    fn status_event(&self) -> ServerEvent {
        ServerEvent::users_updated(self.members.iter().map(Member::status).collect())
    }

    fn results_event(&self) -> ServerEvent {
        tally::tally(
            self.members
                .iter()
                .map(|m| (m.user_name.as_str(), m.selections.as_slice())),
        )
        .into_event()
    }

    fn broadcast(&self, room_id: &RoomId, event: &ServerEvent) {
        for member in &self.members {
            if member.sender.send(event.clone()).is_err() {
                log::warn!(
                    "Connection of user {} in room {} was already closed",
                    member.user_id,
                    room_id
                );
            }
        }
    }
}

/// Tracks every open room and the players connected to it.
#[derive(Debug)]
pub struct RoomManager {
    rooms: Mutex<HashMap<RoomId, Room>>,
    next_token: AtomicU64,
    max_rooms: usize,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    /// Default cap on simultaneously open rooms.
    pub const DEFAULT_MAX_ROOMS: usize = 1024;

    pub fn new() -> Self {
        Self::with_max_rooms(Self::DEFAULT_MAX_ROOMS)
    }

    pub fn with_max_rooms(max_rooms: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            max_rooms,
        }
    }

    /// Check whether `user_id` may join `room_id` right now.
    ///
    /// Reconnecting users are always admitted.
    pub async fn check_admission(&self, room_id: &RoomId, user_id: &UserId) -> Result<()> {
        let rooms = self.rooms.lock().await;
        self.admit(&rooms, room_id, user_id)
    }

    fn admit(&self, rooms: &HashMap<RoomId, Room>, room_id: &RoomId, user_id: &UserId) -> Result<()> {
        match rooms.get(room_id) {
            Some(room) if room.is_full() && !room.contains(user_id) => Err(ServerError::room_full(
                room_id.as_str(),
                room.rules.users_count(),
            )),
            Some(_) => Ok(()),
            None if rooms.len() >= self.max_rooms => Err(ServerError::TooManyRooms(self.max_rooms)),
            None => Ok(()),
        }
    }

    /// Add a connection to a room and broadcast the new membership.
    ///
    /// A user id that is already present keeps its place in the join order
    /// but starts over with its default name and no selections.
    pub async fn connect(
        &self,
        room_id: RoomId,
        user_id: UserId,
        sender: EventSender,
    ) -> Result<ConnectionToken> {
        let mut rooms = self.rooms.lock().await;
        self.admit(&rooms, &room_id, &user_id)?;

        let token = ConnectionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let room = rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.rules()));

        let member = Member {
            user_name: user_id.to_string(),
            user_id: user_id.clone(),
            selections: Vec::new(),
            sender,
            token,
        };

        match room.member_mut(&user_id) {
            Some(existing) => {
                log::info!("User {} reconnected to room {}", user_id, room_id);
                *existing = member;
            }
            None => {
                log::info!(
                    "User {} joined room {} ({}/{})",
                    user_id,
                    room_id,
                    room.members.len() + 1,
                    room.rules.users_count()
                );
                room.members.push(member);
            }
        }

        room.broadcast(&room_id, &room.status_event());
        Ok(token)
    }

    /// Remove a connection. Returns whether anything was removed.
    ///
    /// The last member leaving drops the room without a broadcast.
    pub async fn disconnect(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        token: ConnectionToken,
    ) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return false;
        };

        let before = room.members.len();
        room.members
            .retain(|m| !(&m.user_id == user_id && m.token == token));
        if room.members.len() == before {
            log::debug!(
                "Ignoring stale disconnect of user {} from room {}",
                user_id,
                room_id
            );
            return false;
        }

        log::info!("User {} left room {}", user_id, room_id);
        if room.members.is_empty() {
            rooms.remove(room_id);
            log::info!("Room {} closed", room_id);
        } else {
            room.broadcast(room_id, &room.status_event());
        }
        true
    }

    /// Decode and apply a raw text frame sent by a player.
    pub async fn handle_message(&self, room_id: &RoomId, user_id: &UserId, text: &str) -> Result<()> {
        let event = ClientEvent::from_json(text)?;
        self.apply(room_id, user_id, event).await
    }

    /// Apply a player event, then broadcast the room status.
    ///
    /// A submission that brings the number of submitted players up to the
    /// room capacity broadcasts the voting result first.
    pub async fn apply(&self, room_id: &RoomId, user_id: &UserId, event: ClientEvent) -> Result<()> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| ServerError::not_connected(room_id.as_str(), user_id.as_str()))?;
        let rules = room.rules;
        let member = room
            .member_mut(user_id)
            .ok_or_else(|| ServerError::not_connected(room_id.as_str(), user_id.as_str()))?;

        match event {
            ClientEvent::SubmitSelections { selections } => {
                validate_selections(&selections, rules)?;
                log::debug!(
                    "User {} in room {} submitted {:?}",
                    user_id,
                    room_id,
                    selections
                );
                member.selections = selections;

                if room.submitted_count() == rules.users_count() {
                    log::info!("Voting completed in room {}", room_id);
                    room.broadcast(room_id, &room.results_event());
                }
            }
            ClientEvent::UpdateUserName { user_name } => {
                let user_name = user_name.trim();
                if user_name.is_empty() {
                    return Err(ServerError::invalid_request("user name must not be empty"));
                }
                member.user_name = user_name.to_string();
            }
        }

        room.broadcast(room_id, &room.status_event());
        Ok(())
    }

    /// Connected user ids per room.
    pub async fn overview(&self) -> RoomOverview {
        let rooms = self.rooms.lock().await;
        rooms
            .iter()
            .map(|(room_id, room)| {
                (
                    room_id.to_string(),
                    room.members.iter().map(|m| m.user_id.to_string()).collect(),
                )
            })
            .collect()
    }

    /// Current status of every member of a room.
    pub async fn users(&self, room_id: &RoomId) -> Option<Vec<UserStatus>> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|room| room.members.iter().map(Member::status).collect())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

fn validate_selections(selections: &[String], rules: RoomRules) -> Result<()> {
    if selections.is_empty() {
        return Err(ServerError::invalid_selections("no cards selected"));
    }
    if selections.len() > rules.selections_per_user() {
        return Err(ServerError::invalid_selections(format!(
            "{} cards selected but this room allows {}",
            selections.len(),
            rules.selections_per_user()
        )));
    }
    if selections.iter().any(|s| s.trim().is_empty()) {
        return Err(ServerError::invalid_selections("card names must not be blank"));
    }
    Ok(())
}
