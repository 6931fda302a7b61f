use thiserror::Error;

/// Core error types for Shelterline domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid bed id: {0} (valid beds: 1-108)")]
    InvalidBedId(i64),

    #[error("Invalid confirmation code: {0}")]
    InvalidCode(String),

    #[error("Invalid language tag: {0}")]
    InvalidLanguage(String),

    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new InvalidCode error
    pub fn invalid_code(code: impl Into<String>) -> Self {
        Self::InvalidCode(code.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(message: impl Into<String>) -> Self {
        Self::InvalidDateTime(message.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
