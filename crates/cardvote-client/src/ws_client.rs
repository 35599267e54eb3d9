use anyhow::{Context, Result};
use async_trait::async_trait;
use cardvote_types::{ClientEvent, RoomId, ServerEvent, UserId};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::types::socket_url;
use crate::VotingClient;

/// Client for a room on a remote cardvote service
pub struct WsVotingClient {
    room_id: RoomId,
    user_id: UserId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsVotingClient {
    /// Open the room socket at `{backend_url}/{room_id}/{user_id}`.
    pub async fn connect(backend_url: &str, room_id: RoomId, user_id: UserId) -> Result<Self> {
        let url = socket_url(backend_url, &room_id, &user_id);
        log::debug!("Connecting to {}", url);

        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to join room {} at {}", room_id, backend_url))?;

        log::info!("Joined room {} as {}", room_id, user_id);
        Ok(Self {
            room_id,
            user_id,
            socket,
        })
    }
}

#[async_trait]
impl VotingClient for WsVotingClient {
    fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn send(&mut self, event: ClientEvent) -> Result<()> {
        let payload = event.to_json()?;
        self.socket
            .send(Message::text(payload))
            .await
            .with_context(|| format!("Failed to send {} event", event.event_type()))?;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<ServerEvent>> {
        while let Some(message) = self.socket.next().await {
            match message? {
                Message::Text(text) => match ServerEvent::from_json(text.as_str()) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => log::warn!("Skipping undecodable room event: {}", e),
                },
                Message::Close(frame) => {
                    if let Some(frame) = frame {
                        log::info!("Room {} closed the connection: {}", self.room_id, frame.reason.as_str());
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        match self.socket.close(None).await {
            Ok(()) => Ok(()),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
