/// Errors from image store operations.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The operation needs an interactive runtime (network or file access).
    #[error("environment error: {0}")]
    Environment(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
