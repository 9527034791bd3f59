// Error types for the todo store

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`TodoStore`](crate::TodoStore) operations
#[derive(Error, Debug)]
pub enum TodoError {
    /// The database file could not be opened, read or initialised
    #[error("Failed to initialize todo database at {}: {source}", .path.display())]
    StorageInit {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A mutation could not be made durable
    #[error("Failed to persist todo database: {0}")]
    StorageWrite(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Todo not found: {0}")]
    NotFound(i64),

    #[error("Invalid todo: {0}")]
    Validation(String),

    #[error("Todo store is closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl TodoError {
    pub(crate) fn init<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TodoError::StorageInit {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn write<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TodoError::StorageWrite(Box::new(source))
    }

    /// True for the per-record failures a caller can recover from
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TodoError::NotFound(_) | TodoError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TodoError::NotFound(7).to_string(), "Todo not found: 7");
        assert_eq!(
            TodoError::Validation("task must not be empty".to_string()).to_string(),
            "Invalid todo: task must not be empty"
        );
        assert_eq!(TodoError::Closed.to_string(), "Todo store is closed");
    }

    #[test]
    fn test_storage_init_mentions_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TodoError::init("/tmp/todos.db", io);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/todos.db"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(TodoError::NotFound(1).is_recoverable());
        assert!(TodoError::Validation(String::new()).is_recoverable());
        assert!(!TodoError::Closed.is_recoverable());
        let io = std::io::Error::other("disk full");
        assert!(!TodoError::write(io).is_recoverable());
    }
}
