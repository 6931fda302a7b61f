//! Voice-agent front end for the Shelterline engine.
//!
//! The speech pipeline (STT / LLM / TTS / VAD) lives outside this crate:
//! what arrives here is a stream of transcribed caller utterances, and
//! what leaves is the text the pipeline should speak. Between the two sits
//! a per-call state machine that classifies intent, gathers intake slots,
//! and drives the engine through a narrow, validated tool interface with
//! exactly-once side effects.

mod driver;
mod error;
mod intent;
mod phrases;
mod session;
mod tools;

pub use driver::run_session;
pub use error::{ToolError, VoiceError};
pub use intent::{detect_language, CrisisLexicon, Intent, IntentClassifier};
pub use session::{
    BedStage, CallSession, ChapelStage, SessionConfig, SessionReply, SessionState, VolunteerStage,
};
pub use tools::{ToolRouter, ToolRouterConfig};
