use thiserror::Error;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("{what} already exists: {id}")]
    AlreadyExists { what: &'static str, id: String },

    /// Optimistic concurrency loss: the compare half of a compare-and-set
    /// did not match. Callers either retry or accept the winner's effect.
    #[error("Conflict on {what} {id}: expected {expected}, found {actual}")]
    Conflict {
        what: &'static str,
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn already_exists(what: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            what,
            id: id.into(),
        }
    }

    pub fn conflict(
        what: &'static str,
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            what,
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// True for compare-and-set losses, the one storage error the engine
    /// recovers from locally.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
