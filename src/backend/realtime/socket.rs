/**
 * WebSocket Transport
 *
 * `GET /ws` upgrades to a WebSocket carrying JSON text frames. The socket
 * is split: a writer task drains the connection's broker outbox into the
 * socket while the read loop feeds incoming frames to the `ChatSession`.
 * Replies to the client go through the same outbox, so frames are never
 * written from two places.
 *
 * Closing the socket, a read error, or a failed write ends the session and
 * removes the connection from the broker. Nothing persisted is touched.
 */

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};

use crate::backend::middleware::auth::Identity;
use crate::backend::realtime::session::{ChatSession, SessionContext};
use crate::backend::server::state::AppState;

/// Handle the real-time upgrade (GET /ws)
///
/// The caller must be identified; browsers pass the token as
/// `?access_token=` since they cannot set headers on an upgrade.
pub async fn handle_chat_socket(
    State(state): State<AppState>,
    identity: Identity,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let ctx = state.session_context();
    ws.on_upgrade(move |socket| run_socket(socket, ctx, identity))
}

async fn run_socket(socket: WebSocket, ctx: SessionContext, identity: Identity) {
    let (mut session, mut outbox) = match ChatSession::open(ctx.clone(), identity.user_id()).await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!("[Socket] Could not register {}: {}", identity.user_id(), e);
            return;
        }
    };
    let connection = session.connection();
    let (mut sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("[Socket] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    for reply in session.handle_text(text.as_str()).await {
                        ctx.broker.send_to(connection, reply).await;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                // pings are answered by axum; binary frames are not part of the protocol
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("[Socket] Read error on {}: {}", connection, e);
                    break;
                }
            },
            _ = &mut writer => {
                tracing::debug!("[Socket] Writer for {} stopped", connection);
                break;
            }
        }
    }

    session.close().await;
    writer.abort();
}
