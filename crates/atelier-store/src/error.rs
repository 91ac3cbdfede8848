use atelier_types::{PieceId, TypeError};

/// Errors from backend adapter and collaborator operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The operation targeted an id that does not exist.
    #[error("art piece not found: {id}")]
    NotFound { id: PieceId },

    /// The backend is unreachable or rejected the write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The operation was invoked outside the runtime context it needs.
    #[error("environment error: {0}")]
    Environment(String),

    /// The record failed validation.
    #[error(transparent)]
    Invalid(#[from] TypeError),

    /// Encoding or decoding of a persisted record failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn not_found(id: &PieceId) -> Self {
        Self::NotFound { id: id.clone() }
    }

    /// Wrap a lower-level failure as a persistence error with context.
    pub fn persistence(context: &str, source: impl std::fmt::Display) -> Self {
        Self::Persistence(format!("{context}: {source}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Map a poisoned lock into a persistence error.
pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Persistence(format!("lock poisoned: {e}"))
}
