//! SQLite-backed [`Backend`] with a write-ahead operation journal.

use crate::{Backend, Note, NoteId, Operation, OperationLog, OperationSummary, PurgeStrategy, Result, StashError};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// Durable note storage in a single SQLite file.
///
/// Every `put` and `delete` runs in its own transaction together with the
/// matching [`Operation`] journal entry, so the journal never disagrees with
/// the `notes` table.
pub struct SqliteBackend {
    conn: Connection,
    operation_log: OperationLog,
    store_id: String,
}

impl SqliteBackend {
    /// Creates a new database at `path` and initialises the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StashError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P, strategy: PurgeStrategy) -> Result<Self> {
        Self::initialise(Connection::open(path)?, strategy)
    }

    /// Creates a throwaway database that lives only as long as the returned value.
    pub fn create_in_memory(strategy: PurgeStrategy) -> Result<Self> {
        Self::initialise(Connection::open_in_memory()?, strategy)
    }

    /// Opens an existing database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StashError::InvalidStore`] if the file does not contain the
    /// Stashnotes tables, or [`StashError::Database`] for any SQLite failure
    /// (including a file that is not a database at all).
    pub fn open<P: AsRef<Path>>(path: P, strategy: PurgeStrategy) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('notes', 'id_sequence', 'operations', 'store_meta')",
            [],
            |row| row.get(0),
        )?;

        if table_count != 4 {
            return Err(StashError::InvalidStore(
                "Not a valid Stashnotes database".to_string(),
            ));
        }

        let store_id = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'store_id'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| StashError::InvalidStore("Missing store_id".to_string()))?;

        log::info!("opened note database {store_id}");
        Ok(Self {
            conn,
            operation_log: OperationLog::new(strategy),
            store_id,
        })
    }

    /// Opens the database at `path`, creating it first when the file does not
    /// exist or is empty.
    pub fn open_or_create<P: AsRef<Path>>(path: P, strategy: PurgeStrategy) -> Result<Self> {
        let has_content = match std::fs::metadata(path.as_ref()) {
            Ok(meta) => meta.len() > 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if has_content {
            Self::open(path, strategy)
        } else {
            if let Some(parent) = path.as_ref().parent() {
                std::fs::create_dir_all(parent)?;
            }
            Self::create(path, strategy)
        }
    }

    fn initialise(mut conn: Connection, strategy: PurgeStrategy) -> Result<Self> {
        // Schema and store_id land together or not at all, so an interrupted
        // initialisation leaves a file that open_or_create can start over on.
        let store_id = Uuid::new_v4().to_string();
        let tx = conn.transaction()?;
        tx.execute_batch(include_str!("schema.sql"))?;
        tx.execute(
            "INSERT INTO store_meta (key, value) VALUES (?, ?)",
            ["store_id", &store_id],
        )?;
        tx.commit()?;

        log::info!("created note database {store_id}");
        Ok(Self {
            conn,
            operation_log: OperationLog::new(strategy),
            store_id,
        })
    }

    /// Identifier written into every journal entry produced by this database.
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Returns the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns journal summaries, newest first, optionally for a single note.
    pub fn list_operations(&self, note_id: Option<NoteId>) -> Result<Vec<OperationSummary>> {
        self.operation_log.list(&self.conn, note_id)
    }

    /// Returns every journalled operation in the order it was applied.
    pub fn replay_operations(&self) -> Result<Vec<Operation>> {
        self.operation_log.replay(&self.conn)
    }
}

impl Backend for SqliteBackend {
    fn get(&self, id: NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                "SELECT id, title, content, created_at, modified_at, revision
                 FROM notes WHERE id = ?1",
                [id.as_u64() as i64],
                map_note_row,
            )
            .optional()?;
        Ok(note)
    }

    fn put(&mut self, note: &Note) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT COUNT(*) FROM notes WHERE id = ?1",
            [note.id.as_u64() as i64],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;

        tx.execute(
            "INSERT INTO notes (id, title, content, created_at, modified_at, revision)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                modified_at = excluded.modified_at,
                revision = excluded.revision",
            rusqlite::params![
                note.id.as_u64() as i64,
                note.title,
                note.content,
                note.created_at,
                note.modified_at,
                note.revision as i64,
            ],
        )?;

        let operation_id = Uuid::new_v4().to_string();
        let store_id = self.store_id.clone();
        let op = if exists {
            Operation::UpdateNote {
                operation_id,
                timestamp: now,
                store_id,
                note_id: note.id,
                title: note.title.clone(),
                content: note.content.clone(),
            }
        } else {
            Operation::CreateNote {
                operation_id,
                timestamp: now,
                store_id,
                note_id: note.id,
                title: note.title.clone(),
                content: note.content.clone(),
            }
        };
        self.operation_log.log(&tx, &op)?;
        self.operation_log.purge_if_needed(&tx)?;

        tx.commit()?;
        Ok(())
    }

    fn delete(&mut self, id: NoteId) -> Result<bool> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM notes WHERE id = ?1", [id.as_u64() as i64])?;

        // A DELETE on a missing row succeeds but touches nothing; leave the
        // journal untouched in that case.
        if tx.changes() == 0 {
            return Ok(false);
        }

        let op = Operation::DeleteNote {
            operation_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            store_id: self.store_id.clone(),
            note_id: id,
        };
        self.operation_log.log(&tx, &op)?;
        self.operation_log.purge_if_needed(&tx)?;

        tx.commit()?;
        Ok(true)
    }

    fn list_all(&self) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, modified_at, revision FROM notes",
        )?;
        let notes = stmt
            .query_map([], map_note_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn next_id(&mut self) -> Result<NoteId> {
        // AUTOINCREMENT keeps the high-water mark in sqlite_sequence, so the
        // placeholder row can go straight away without the value being reused.
        let tx = self.conn.transaction()?;
        tx.execute("INSERT INTO id_sequence DEFAULT VALUES", [])?;
        let id = tx.last_insert_rowid();
        tx.execute("DELETE FROM id_sequence WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(NoteId::new(id as u64))
    }
}

/// Row-mapping closure for `rusqlite::Row` → [`Note`].
fn map_note_row(row: &rusqlite::Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: NoteId::new(row.get::<_, i64>(0)? as u64),
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        modified_at: row.get(4)?,
        revision: row.get::<_, i64>(5)? as u64,
    })
}
