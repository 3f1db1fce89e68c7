//! Error types for the Stashnotes core library.

use crate::NoteId;
use thiserror::Error;

/// All errors that can occur within the Stashnotes core library.
#[derive(Debug, Error)]
pub enum StashError {
    /// A note ID was referenced that does not exist (or was deleted).
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    /// The persistence backend is unavailable or refused the write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mutation was rejected before reaching the repository.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The opened file is not a valid Stashnotes database.
    #[error("Invalid store: {0}")]
    InvalidStore(String),
}

/// Convenience alias that pins the error type to [`StashError`].
pub type Result<T> = std::result::Result<T, StashError>;

impl StashError {
    /// Returns `true` for failures that originate in the persistence layer.
    ///
    /// The UI uses this to tell a generic "could not save" apart from an
    /// inline validation message.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Database(_) | Self::Io(_) | Self::Json(_)
        )
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Note no longer exists".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::InvalidStore(_) => "Could not open note database".to_string(),
            Self::Storage(e) => format!("Failed to save: {e}"),
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
