use thiserror::Error;

use shelterline_engine::EngineError;

/// Errors from tool invocations, as the session sees them.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool exceeded its per-call deadline. The session apologizes and
    /// may retry once before degrading.
    #[error("Tool call exceeded its deadline")]
    Timeout,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors from the session layer itself.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Call session already ended")]
    SessionEnded,

    #[error(transparent)]
    Tool(#[from] ToolError),
}
