//! Mutation records for the Stashnotes operation journal.

use crate::NoteId;
use serde::{Deserialize, Serialize};

/// A single note mutation recorded in the journal of a [`SqliteBackend`](crate::SqliteBackend).
///
/// Every variant carries a stable `operation_id`, a wall-clock `timestamp`,
/// and the `store_id` of the database that applied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// A note was written for the first time.
    CreateNote {
        /// Stable UUID for this operation.
        operation_id: String,
        /// Unix timestamp (seconds) when the operation was recorded.
        timestamp: i64,
        /// ID of the store that applied the operation.
        store_id: String,
        note_id: NoteId,
        title: String,
        content: String,
    },
    /// The title and content of an existing note were replaced.
    UpdateNote {
        /// Stable UUID for this operation.
        operation_id: String,
        /// Unix timestamp (seconds) when the operation was recorded.
        timestamp: i64,
        /// ID of the store that applied the operation.
        store_id: String,
        note_id: NoteId,
        title: String,
        content: String,
    },
    /// A note was removed.
    DeleteNote {
        /// Stable UUID for this operation.
        operation_id: String,
        /// Unix timestamp (seconds) when the operation was recorded.
        timestamp: i64,
        /// ID of the store that applied the operation.
        store_id: String,
        note_id: NoteId,
    },
}

impl Operation {
    /// Returns the stable identifier for this operation.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        match self {
            Self::CreateNote { operation_id, .. }
            | Self::UpdateNote { operation_id, .. }
            | Self::DeleteNote { operation_id, .. } => operation_id,
        }
    }

    /// Returns the wall-clock Unix timestamp (seconds) when this operation was recorded.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::CreateNote { timestamp, .. }
            | Self::UpdateNote { timestamp, .. }
            | Self::DeleteNote { timestamp, .. } => *timestamp,
        }
    }

    #[must_use]
    pub fn store_id(&self) -> &str {
        match self {
            Self::CreateNote { store_id, .. }
            | Self::UpdateNote { store_id, .. }
            | Self::DeleteNote { store_id, .. } => store_id,
        }
    }

    #[must_use]
    pub fn note_id(&self) -> NoteId {
        match self {
            Self::CreateNote { note_id, .. }
            | Self::UpdateNote { note_id, .. }
            | Self::DeleteNote { note_id, .. } => *note_id,
        }
    }

    /// Name stored in the `operation_type` column.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CreateNote { .. } => "CreateNote",
            Self::UpdateNote { .. } => "UpdateNote",
            Self::DeleteNote { .. } => "DeleteNote",
        }
    }
}
