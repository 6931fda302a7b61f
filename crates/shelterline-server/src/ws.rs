//! Staff dashboard WebSocket: chat relay plus state-change broadcasts.
//!
//! Each connection gets a bounded outbound queue. A subscriber that cannot
//! keep up has events dropped rather than slowing the engine; the client
//! is expected to reconnect and recover with snapshot reads
//! (`GET /api/beds/list`, `GET /api/reservations/`).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use shelterline_api::ApiError;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /api/chat/ws?token=…`
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    if let Some(expected) = &state.config.server.api_token {
        if params.token.as_deref() != Some(expected.as_str()) {
            return ApiError::Unauthorized("invalid or missing token".into()).into_response();
        }
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let bound = state.config.notifier.subscriber_queue_bound;
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(bound);
    let mut events = state.events.subscribe();
    let mut chat = state.chat.subscribe();
    let (mut sink, mut stream) = socket.split();

    // Forwarder: engine events and chat onto this client's bounded queue.
    // try_send drops on a full queue; the event bus is never blocked by a
    // slow dashboard.
    let forwarder = tokio::spawn(async move {
        loop {
            let payload = tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(_) => continue,
                    },
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "subscriber lagged behind the event bus");
                        continue;
                    }
                    Err(_) => break,
                },
                message = chat.recv() => match message {
                    Ok(message) => message,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                },
            };
            if let Err(mpsc::error::TrySendError::Full(_)) = outbound_tx.try_send(payload) {
                warn!("dashboard subscriber queue full, dropping event");
            } else if outbound_tx.is_closed() {
                break;
            }
        }
    });

    // Writer: drain the bounded queue to the socket.
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader: inbound text is staff chat, rebroadcast to every client.
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let payload = json!({ "event": "chat.message", "message": text.as_str() });
                let _ = state.chat.send(payload.to_string());
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    forwarder.abort();
    writer.abort();
}
