use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying engine.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The store's bounded lock wait elapsed before the operation could run.
    /// Transient: callers may retry with backoff instead of hanging.
    #[error("storage busy: {message}")]
    Busy { message: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a busy error naming the operation that timed out.
    pub fn busy(operation: &str) -> Self {
        StorageError::Busy {
            message: format!("lock wait exceeded during {operation}"),
        }
    }
}
