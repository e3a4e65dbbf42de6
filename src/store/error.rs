use thiserror::Error;

/// Errors raised by key-value store backends.
///
/// These are never produced for absent data: a missing key reads as `None`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] cacache::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("Store task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
