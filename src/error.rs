//! Error types for readlog

use thiserror::Error;

/// Result type alias for readlog operations
pub type Result<T> = std::result::Result<T, ReadlogError>;

/// Errors that can occur around the memory store
#[derive(Error, Debug)]
pub enum ReadlogError {
    /// Dump file exists but its content is unusable
    #[error("Corrupted dump file: {0}")]
    CorruptedDump(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Command could not be understood
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Publishing to the external target failed
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReadlogError {
    /// Check if this error comes from the persistence layer
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptedDump(_) | Self::Serialization(_) | Self::Io(_)
        )
    }
}

impl From<tokio::task::JoinError> for ReadlogError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}
