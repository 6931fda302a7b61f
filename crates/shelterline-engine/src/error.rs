use thiserror::Error;

use shelterline_storage::StorageError;

/// Errors surfaced by engine operations.
///
/// `Conflict` is recovered locally by bounded retry where the operation
/// allows it; everything else propagates to the caller (HTTP or voice)
/// for a user-appropriate translation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No beds available")]
    NoCapacity,

    #[error("Reservation {0} has expired")]
    Expired(String),

    #[error("Reservation {code} is for bed {expected}, not bed {given}")]
    BedMismatch {
        code: String,
        expected: u16,
        given: u16,
    },

    #[error("You already have an active reservation")]
    DuplicateCaller,

    #[error("Chapel services are held on weekdays only")]
    WeekendDisallowed,

    #[error("That chapel slot is already booked")]
    SlotTaken,

    #[error("Invalid chapel time: {0}")]
    InvalidTime(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { what, id } => EngineError::NotFound { what, id },
            StorageError::AlreadyExists { .. } | StorageError::Conflict { .. } => {
                EngineError::Conflict(err.to_string())
            }
            StorageError::Backend(message) => EngineError::Internal(message),
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
