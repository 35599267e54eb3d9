use anyhow::Result;
use async_trait::async_trait;
use cardvote_server::{ConnectionToken, RoomManager};
use cardvote_types::{ClientEvent, RoomId, ServerEvent, UserId};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::VotingClient;

/// Client attached to an in-process [`RoomManager`], without a socket.
pub struct DirectVotingClient {
    rooms: Arc<RoomManager>,
    room_id: RoomId,
    user_id: UserId,
    token: Option<ConnectionToken>,
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

impl DirectVotingClient {
    pub async fn connect(rooms: Arc<RoomManager>, room_id: RoomId, user_id: UserId) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let token = rooms
            .connect(room_id.clone(), user_id.clone(), tx)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to join room {}: {}", room_id, e))?;

        Ok(Self {
            rooms,
            room_id,
            user_id,
            token: Some(token),
            events,
        })
    }
}

#[async_trait]
impl VotingClient for DirectVotingClient {
    fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn send(&mut self, event: ClientEvent) -> Result<()> {
        self.rooms
            .apply(&self.room_id, &self.user_id, event)
            .await
            .map_err(|e| anyhow::anyhow!("Room rejected event: {}", e))
    }

    async fn next_event(&mut self) -> Result<Option<ServerEvent>> {
        Ok(self.events.recv().await)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(token) = self.token.take() {
            self.rooms
                .disconnect(&self.room_id, &self.user_id, token)
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_clients_complete_a_vote() {
        let rooms = Arc::new(RoomManager::new());
        let room_id = RoomId::parse("0abcdef0").unwrap();

        let mut alice =
            DirectVotingClient::connect(rooms.clone(), room_id.clone(), UserId::parse("a").unwrap())
                .await
                .unwrap();
        let mut bob =
            DirectVotingClient::connect(rooms.clone(), room_id.clone(), UserId::parse("b").unwrap())
                .await
                .unwrap();

        alice.update_user_name("Alice").await.unwrap();
        alice.submit_selections(vec!["Moat".into()]).await.unwrap();
        bob.submit_selections(vec!["Chapel".into()]).await.unwrap();

        let mut result = None;
        while let Some(event) = alice.next_event().await.unwrap() {
            if let ServerEvent::VotingCompleted { cards, .. } = event {
                result = Some(cards);
                break;
            }
        }
        assert_eq!(result, Some(vec!["Moat".to_string(), "Chapel".to_string()]));

        alice.close().await.unwrap();
        bob.close().await.unwrap();
        assert_eq!(rooms.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_send_errors_surface() {
        let rooms = Arc::new(RoomManager::new());
        let mut alice = DirectVotingClient::connect(
            rooms,
            RoomId::parse("0abcdef0").unwrap(),
            UserId::parse("a").unwrap(),
        )
        .await
        .unwrap();

        assert!(alice.submit_selections(vec![]).await.is_err());
    }
}
