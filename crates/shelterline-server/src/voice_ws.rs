//! Voice session WebSocket: the in-process realization of the telephony
//! boundary. A vendor bridge translates its webhook or SIP leg into this
//! quad: a session token, utterances in, speech out, and a close on
//! hangup.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use shelterline_voice::{run_session, CallSession, SessionConfig};

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceParams {
    /// Per-call token from the telephony bridge; generated when absent.
    #[serde(default)]
    pub session: Option<String>,
}

/// `GET /api/voice/ws?session=…`
pub async fn voice_ws(
    ws: WebSocketUpgrade,
    Query(params): Query<VoiceParams>,
    State(state): State<AppState>,
) -> Response {
    let token = params
        .session
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    ws.on_upgrade(move |socket| handle_call(socket, state, token))
}

async fn handle_call(socket: WebSocket, state: AppState, token: String) {
    let session = CallSession::new(
        token,
        state.classifier.clone(),
        state.tools.clone(),
        state.config.voice.chapel_time_slots.clone(),
    );
    let (utterance_tx, utterance_rx) = mpsc::channel::<String>(16);
    let (reply_tx, mut reply_rx) = mpsc::channel(16);

    let driver = tokio::spawn(run_session(
        session,
        utterance_rx,
        reply_tx,
        SessionConfig {
            idle_timeout: state.config.idle_session_timeout(),
        },
    ));

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            reply = reply_rx.recv() => {
                let Some(reply) = reply else { break };
                let payload = json!({ "speech": reply.speech, "end_call": reply.end_call });
                if sink.send(Message::Text(payload.to_string().into())).await.is_err() {
                    break;
                }
                if reply.end_call {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if utterance_tx.send(text.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("caller hung up");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // Dropping the utterance channel tells the driver the caller is gone;
    // an in-flight tool call still finishes and commits.
    drop(utterance_tx);
    let _ = driver.await;
}
