use atelier_store::StoreError;
use atelier_types::PieceId;

/// Errors surfaced by collection operations.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("art piece not found: {id}")]
    NotFound { id: PieceId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CollectionError {
    pub fn is_not_found(&self) -> bool {
        match self {
            CollectionError::NotFound { .. } => true,
            CollectionError::Store(e) => e.is_not_found(),
        }
    }
}

/// Result alias for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;
