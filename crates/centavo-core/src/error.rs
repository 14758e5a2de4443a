//! Error types for the centavo learning engine.

use thiserror::Error;

/// Result type alias using centavo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for learning-engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(uuid::Uuid),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(uuid::Uuid),

    /// Correction queue error
    #[error("Queue error: {0}")]
    Queue(String),

    /// Spell-correction collaborator failed
    #[error("Spell correction error: {0}")]
    Spell(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CategoryNotFound(uuid::Uuid::nil());
        assert!(err.to_string().contains("Category not found"));

        let err = Error::Queue("claim failed".into());
        assert_eq!(err.to_string(), "Queue error: claim failed");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
