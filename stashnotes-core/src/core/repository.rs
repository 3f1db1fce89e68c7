//! Canonical in-memory note set, written through to a [`Backend`].

use crate::{Backend, DeletePolicy, Note, NoteId, Result, StashError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) type NoteMap = BTreeMap<NoteId, Note>;

/// State that only a writer may touch: the backend and the logical clock.
struct Writer {
    backend: Box<dyn Backend>,
    clock: u64,
}

/// Owns the canonical copy of every note.
///
/// Writes go to the backend first and reach the in-memory set only once the
/// backend has acknowledged them, so a failed write leaves both sides at their
/// last-known-good state. Writers are serialized by an internal lock; readers
/// only ever see whole mutations.
pub struct Repository {
    writer: Mutex<Writer>,
    notes: RwLock<NoteMap>,
    delete_policy: DeletePolicy,
}

impl Repository {
    /// Loads every record from `backend` and seeds the modification clock.
    ///
    /// # Errors
    ///
    /// Propagates any failure of [`Backend::list_all`].
    pub fn open(backend: Box<dyn Backend>, delete_policy: DeletePolicy) -> Result<Self> {
        let notes: NoteMap = backend
            .list_all()?
            .into_iter()
            .map(|note| (note.id, note))
            .collect();
        let clock = notes.values().map(|n| n.revision).max().unwrap_or(0);

        log::debug!("repository loaded {} notes at revision {clock}", notes.len());
        Ok(Self {
            writer: Mutex::new(Writer { backend, clock }),
            notes: RwLock::new(notes),
            delete_policy,
        })
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Creates a note with a fresh ID and returns the stored copy.
    ///
    /// # Errors
    ///
    /// Fails only when the backend cannot allocate an ID or persist the record.
    pub fn create(&self, title: String, content: String) -> Result<Note> {
        let mut writer = self.lock_writer()?;

        let id = writer.backend.next_id()?;
        let now = chrono::Utc::now().timestamp();
        let note = Note {
            id,
            title,
            content,
            created_at: now,
            modified_at: now,
            revision: writer.clock + 1,
        };
        writer.backend.put(&note)?;
        writer.clock = note.revision;

        self.write_notes().insert(id, note.clone());
        Ok(note)
    }

    /// Replaces the title and content of `id`, keeping the ID.
    ///
    /// Writing back the values already stored is a no-op: nothing reaches the
    /// backend and the stored note is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StashError::NotFound`] if no note with `id` exists, or any
    /// backend failure.
    pub fn update(&self, id: NoteId, title: String, content: String) -> Result<Note> {
        let mut writer = self.lock_writer()?;

        let current = self.get(id).ok_or(StashError::NotFound(id))?;
        if current.title == title && current.content == content {
            return Ok(current);
        }

        let note = Note {
            title,
            content,
            modified_at: chrono::Utc::now().timestamp(),
            revision: writer.clock + 1,
            ..current
        };
        writer.backend.put(&note)?;
        writer.clock = note.revision;

        self.write_notes().insert(id, note.clone());
        Ok(note)
    }

    /// Removes `id`. Returns whether a note was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StashError::NotFound`] for an absent ID under
    /// [`DeletePolicy::Strict`], or any backend failure.
    pub fn delete(&self, id: NoteId) -> Result<bool> {
        let mut writer = self.lock_writer()?;

        if !self.read_notes().contains_key(&id) {
            return match self.delete_policy {
                DeletePolicy::Strict => Err(StashError::NotFound(id)),
                DeletePolicy::Idempotent => Ok(false),
            };
        }

        if !writer.backend.delete(id)? {
            log::warn!("note {id} was missing from the backend when deleted");
        }

        self.write_notes().remove(&id);
        Ok(true)
    }

    /// Returns a copy of the note stored under `id`.
    pub fn get(&self, id: NoteId) -> Option<Note> {
        self.read_notes().get(&id).cloned()
    }

    /// Returns copies of all notes, in no guaranteed order.
    pub fn get_all(&self) -> Vec<Note> {
        self.read_notes().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read_notes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_notes().is_empty()
    }

    /// Runs `f` against one consistent view of the note set.
    pub(crate) fn with_notes<R>(&self, f: impl FnOnce(&NoteMap) -> R) -> R {
        f(&self.read_notes())
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, Writer>> {
        self.writer.lock().map_err(|_| {
            StashError::Storage("a previous write panicked; repository is unavailable".to_string())
        })
    }

    // The map is only ever replaced entry-by-entry, so a poisoned lock still
    // guards a consistent set.
    fn read_notes(&self) -> RwLockReadGuard<'_, NoteMap> {
        self.notes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_notes(&self) -> RwLockWriteGuard<'_, NoteMap> {
        self.notes.write().unwrap_or_else(PoisonError::into_inner)
    }
}
