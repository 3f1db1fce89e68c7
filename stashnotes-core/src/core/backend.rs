//! Persistence backend contract and the in-memory implementation.
//!
//! The repository talks to durable storage only through [`Backend`]. Any
//! key-value store that offers read-your-writes consistency for the calling
//! process can sit behind it; [`SqliteBackend`](crate::SqliteBackend) is the
//! durable one shipped with the crate.

use crate::{Note, NoteId, Result};
use std::collections::BTreeMap;

/// Durable key-value storage of note records.
pub trait Backend: Send {
    /// Fetches the record stored under `id`, if any.
    fn get(&self, id: NoteId) -> Result<Option<Note>>;

    /// Inserts or replaces the record stored under `note.id`.
    fn put(&mut self, note: &Note) -> Result<()>;

    /// Removes the record stored under `id`. Returns whether a record existed.
    fn delete(&mut self, id: NoteId) -> Result<bool>;

    /// Returns every stored record, in no particular order.
    fn list_all(&self) -> Result<Vec<Note>>;

    /// Reserves a fresh note ID.
    ///
    /// An ID returned once is never returned again for the same store, even
    /// if the note that used it has since been deleted.
    fn next_id(&mut self) -> Result<NoteId>;
}

/// Non-durable [`Backend`] that keeps records in a map.
///
/// Useful for tests and scratch stores; everything is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: BTreeMap<NoteId, Note>,
    last_id: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, id: NoteId) -> Result<Option<Note>> {
        Ok(self.records.get(&id).cloned())
    }

    fn put(&mut self, note: &Note) -> Result<()> {
        self.records.insert(note.id, note.clone());
        Ok(())
    }

    fn delete(&mut self, id: NoteId) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    fn list_all(&self) -> Result<Vec<Note>> {
        Ok(self.records.values().cloned().collect())
    }

    fn next_id(&mut self) -> Result<NoteId> {
        self.last_id += 1;
        Ok(NoteId::new(self.last_id))
    }
}
