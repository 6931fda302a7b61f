use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::phrases;
use crate::session::{CallSession, SessionConfig, SessionReply};

/// Drive one call session over the telephony bridge's channels: utterances
/// in, speech out.
///
/// The task ends on caller hangup (the utterance channel closing), an
/// explicit farewell, or the idle timeout. An in-flight tool call always
/// finishes and commits before the session reference is dropped, so
/// cancellation can never half-apply a side effect.
pub async fn run_session(
    mut session: CallSession,
    mut utterances: mpsc::Receiver<String>,
    replies: mpsc::Sender<SessionReply>,
    config: SessionConfig,
) {
    let token = session.token().to_string();
    info!(token = %token, "call session started");

    if replies.send(session.greeting()).await.is_err() {
        return;
    }

    loop {
        match timeout(config.idle_timeout, utterances.recv()).await {
            Ok(Some(utterance)) => {
                let reply = match session.handle_utterance(&utterance).await {
                    Ok(reply) => reply,
                    Err(err) => {
                        debug!(token = %token, error = %err, "session refused utterance");
                        break;
                    }
                };
                let end_call = reply.end_call;
                if replies.send(reply).await.is_err() {
                    break;
                }
                if end_call {
                    info!(token = %token, "call ended by farewell");
                    break;
                }
            }
            Ok(None) => {
                info!(token = %token, "caller hung up");
                break;
            }
            Err(_) => {
                info!(
                    token = %token,
                    idle_secs = config.idle_timeout.as_secs(),
                    "idle timeout, closing call"
                );
                let farewell = SessionReply {
                    speech: phrases::farewell(session.language()).to_string(),
                    end_call: true,
                };
                let _ = replies.send(farewell).await;
                break;
            }
        }
    }
}
