//! Client SDK for joining cardvote rooms
//!
//! A player joins a room through a [`VotingClient`]: [`WsVotingClient`]
//! talks to a remote service over its room socket, [`DirectVotingClient`]
//! attaches to a room manager running in the same process. Both speak the
//! same events, so front ends and tests can switch between them freely.

use anyhow::Result;
use async_trait::async_trait;
use cardvote_types::{ClientEvent, RoomId, ServerEvent, UserId};

pub mod direct_client;
pub mod probe;
pub mod types;
pub mod ws_client;

pub use direct_client::DirectVotingClient;
pub use probe::LivenessProbe;
pub use types::*;
pub use ws_client::WsVotingClient;

/// VotingClient trait for taking part in a room
#[async_trait]
pub trait VotingClient: Send {
    /// Room this client is connected to
    fn room_id(&self) -> &RoomId;

    /// Ephemeral id of this connection
    fn user_id(&self) -> &UserId;

    /// Send a raw player event
    async fn send(&mut self, event: ClientEvent) -> Result<()>;

    /// Submit the player's vote
    async fn submit_selections(&mut self, selections: Vec<String>) -> Result<()> {
        self.send(ClientEvent::submit_selections(selections)).await
    }

    /// Change the name shown to the other players
    async fn update_user_name(&mut self, user_name: &str) -> Result<()> {
        self.send(ClientEvent::update_user_name(user_name)).await
    }

    /// Wait for the next room event; `None` once the room connection is gone
    async fn next_event(&mut self) -> Result<Option<ServerEvent>>;

    /// Leave the room
    async fn close(&mut self) -> Result<()>;
}

/// Factory for creating VotingClient instances
pub struct VotingClientFactory;

impl VotingClientFactory {
    /// Join a room on a remote service
    pub async fn connect_remote(
        backend_url: &str,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Box<dyn VotingClient>> {
        Ok(Box::new(
            WsVotingClient::connect(backend_url, room_id, user_id).await?,
        ))
    }

    /// Join a room on an in-process room manager
    pub async fn connect_direct(
        rooms: std::sync::Arc<cardvote_server::RoomManager>,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Box<dyn VotingClient>> {
        Ok(Box::new(
            DirectVotingClient::connect(rooms, room_id, user_id).await?,
        ))
    }
}

/// Read events until the vote completes, handing every event to `on_event`.
///
/// Returns the final `voting completed` event, or `None` if the connection
/// ended first.
pub async fn wait_for_result<C, F>(client: &mut C, mut on_event: F) -> Result<Option<ServerEvent>>
where
    C: VotingClient + ?Sized,
    F: FnMut(&ServerEvent) + Send,
{
    while let Some(event) = client.next_event().await? {
        on_event(&event);
        if event.is_voting_completed() {
            return Ok(Some(event));
        }
    }
    Ok(None)
}
