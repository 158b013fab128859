//! Error types for stickies-memory

use thiserror::Error;

/// Errors that can occur in the note system
#[derive(Debug, Error)]
pub enum NoteError {
    /// Embedding provider could not produce a vector (unavailable, timed out)
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Embedding provider failed to load; remembered for the process lifetime
    #[error("Embedding provider failed to load: {0}")]
    ProviderLoadFailed(String),

    /// Note has no stored vector
    #[error("Vector not found for note: {0}")]
    VectorNotFound(String),

    /// Vectors of different lengths were compared
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Requested cluster count cannot be used
    #[error("Invalid cluster count: {0}")]
    InvalidClusterCount(usize),

    /// RocksDB error
    #[error("Storage error: {0}")]
    Rocks(#[from] rocksdb::Error),

    /// Generic persistence failure
    #[error("Storage error: {0}")]
    Store(String),

    /// Serialization error (bincode)
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UUID parsing error
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Builder error
    #[error("Builder error: {0}")]
    Builder(#[from] crate::note::NoteBuilderError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NoteError {
    /// Create a provider-unavailable error
    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }

    /// Create a provider-load-failed error
    pub fn provider_load_failed(msg: impl Into<String>) -> Self {
        Self::ProviderLoadFailed(msg.into())
    }

    /// Create a vector-not-found error
    pub fn vector_not_found(id: impl ToString) -> Self {
        Self::VectorNotFound(id.to_string())
    }

    /// Create a dimension mismatch error
    pub fn invalid_dimension(expected: usize, actual: usize) -> Self {
        Self::InvalidDimension { expected, actual }
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a not found error
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound(id.to_string())
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// True when embedding generation cannot proceed
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::ProviderLoadFailed(_)
        )
    }

    /// True when the underlying persistence layer failed
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Rocks(_) | Self::Store(_) | Self::Bincode(_) | Self::Json(_) | Self::Io(_)
        )
    }
}

/// Result type for note operations
pub type Result<T> = std::result::Result<T, NoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failure_classification() {
        assert!(NoteError::provider_unavailable("timeout").is_provider_failure());
        assert!(NoteError::provider_load_failed("no model").is_provider_failure());
        assert!(!NoteError::store("disk full").is_provider_failure());
        assert!(!NoteError::invalid_dimension(3, 4).is_provider_failure());
    }

    #[test]
    fn test_store_failure_classification() {
        assert!(NoteError::store("disk full").is_store_failure());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(NoteError::from(io).is_store_failure());
        assert!(!NoteError::not_found("abc").is_store_failure());
    }

    #[test]
    fn test_invalid_dimension_display() {
        let err = NoteError::invalid_dimension(384, 256);
        assert_eq!(
            err.to_string(),
            "Invalid vector dimension: expected 384, got 256"
        );
    }
}
