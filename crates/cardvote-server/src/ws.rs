//! WebSocket endpoint for a player connection.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use cardvote_types::{RoomId, ServerEvent, UserId};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::rooms::RoomManager;
use crate::AppState;

/// Handler for `GET /{room_id}/{user_id}`.
///
/// Ids and room capacity are checked before the upgrade so a rejected
/// player gets a plain HTTP error instead of a socket that closes at once.
pub async fn room_socket_handler(
    State(state): State<AppState>,
    Path((room_id, user_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let room_id = RoomId::parse(room_id)?;
    let user_id = UserId::parse(user_id)?;
    state.rooms.check_admission(&room_id, &user_id).await?;

    log::debug!("Upgrading connection of user {} to room {}", user_id, room_id);
    let rooms = state.rooms.clone();
    Ok(ws
        .max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, rooms, room_id, user_id)))
}

async fn handle_socket(socket: WebSocket, rooms: Arc<RoomManager>, room_id: RoomId, user_id: UserId) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let token = match rooms.connect(room_id.clone(), user_id.clone(), tx).await {
        Ok(token) => token,
        Err(e) => {
            // lost a race for the last seat after the upgrade was accepted
            log::warn!("Rejecting user {} from room {}: {}", user_id, room_id, e);
            let _ = sink
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: e.to_string().into(),
                })))
                .await;
            return;
        }
    };

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Failed to encode {} event: {}", event.event_type(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let recv_rooms = rooms.clone();
    let recv_room_id = room_id.clone();
    let recv_user_id = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Err(e) = recv_rooms
                        .handle_message(&recv_room_id, &recv_user_id, text.as_str())
                        .await
                    {
                        log::warn!(
                            "Ignoring message from user {} in room {}: {}",
                            recv_user_id,
                            recv_room_id,
                            e
                        );
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    log::debug!("Socket of user {} failed: {}", recv_user_id, e);
                    break;
                }
            }
        }
    });

    // Either side ending ends the connection. The send side ends when the
    // manager drops our sender, i.e. when the same user id reconnected.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    rooms.disconnect(&room_id, &user_id, token).await;
}
