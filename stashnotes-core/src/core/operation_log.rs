//! Durable operation journal and purge strategies for a SQLite-backed store.

use crate::{NoteId, Operation, Result};
use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};

/// Controls which old operations are removed from the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PurgeStrategy {
    /// Retain only the most recent `keep_last` operations.
    KeepLast {
        #[serde(rename = "keepLast")]
        keep_last: usize,
    },
    /// Never purge.
    KeepAll,
}

impl Default for PurgeStrategy {
    fn default() -> Self {
        Self::KeepLast { keep_last: 1000 }
    }
}

/// One journal row, without the serialized payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub operation_id: String,
    pub timestamp: i64,
    pub operation_type: String,
    pub note_id: NoteId,
}

/// Records note mutations to the `operations` table and purges stale entries.
#[derive(Debug)]
pub struct OperationLog {
    strategy: PurgeStrategy,
}

impl OperationLog {
    /// Creates a new `OperationLog` with the given purge strategy.
    pub fn new(strategy: PurgeStrategy) -> Self {
        Self { strategy }
    }

    /// Serialises `op` and appends it to the `operations` table within `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StashError::Database`] if the INSERT fails, or
    /// [`crate::StashError::Json`] if `op` cannot be serialised.
    pub fn log(&self, tx: &Transaction, op: &Operation) -> Result<()> {
        let op_json = serde_json::to_string(op)?;

        tx.execute(
            "INSERT INTO operations (operation_id, timestamp, store_id, operation_type, note_id, operation_data)
             VALUES (?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                op.operation_id(),
                op.timestamp(),
                op.store_id(),
                op.type_name(),
                op.note_id().as_u64() as i64,
                op_json,
            ],
        )?;

        Ok(())
    }

    /// Deletes old operations from the journal according to the purge strategy.
    ///
    /// Call this after every [`log`](Self::log) call to keep the table bounded in size.
    pub fn purge_if_needed(&self, tx: &Transaction) -> Result<()> {
        match self.strategy {
            PurgeStrategy::KeepLast { keep_last } => {
                tx.execute(
                    "DELETE FROM operations WHERE id NOT IN (
                        SELECT id FROM operations ORDER BY id DESC LIMIT ?
                    )",
                    [keep_last as i64],
                )?;
            }
            PurgeStrategy::KeepAll => {}
        }
        Ok(())
    }

    /// Returns journal summaries, newest first, optionally restricted to one note.
    pub fn list(&self, conn: &Connection, note_id: Option<NoteId>) -> Result<Vec<OperationSummary>> {
        let mut stmt = conn.prepare(
            "SELECT operation_id, timestamp, operation_type, note_id
             FROM operations
             WHERE ?1 IS NULL OR note_id = ?1
             ORDER BY id DESC",
        )?;
        let filter = note_id.map(|id| id.as_u64() as i64);
        let rows = stmt
            .query_map([filter], |row| {
                Ok(OperationSummary {
                    operation_id: row.get(0)?,
                    timestamp: row.get(1)?,
                    operation_type: row.get(2)?,
                    note_id: NoteId::new(row.get::<_, i64>(3)? as u64),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Loads the full operation payloads in the order they were recorded.
    pub fn replay(&self, conn: &Connection) -> Result<Vec<Operation>> {
        let mut stmt = conn.prepare("SELECT operation_data FROM operations ORDER BY id ASC")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        payloads
            .iter()
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("schema.sql")).unwrap();
        conn
    }

    fn delete_op(i: u64) -> Operation {
        Operation::DeleteNote {
            operation_id: format!("op-{}", i),
            timestamp: 1000 + i as i64,
            store_id: "store-1".to_string(),
            note_id: NoteId::new(i % 3),
        }
    }

    #[test]
    fn test_log_and_purge() {
        let mut conn = journal_db();
        let log = OperationLog::new(PurgeStrategy::KeepLast { keep_last: 5 });

        let tx = conn.transaction().unwrap();
        for i in 0..10 {
            log.log(&tx, &delete_op(i)).unwrap();
        }
        log.purge_if_needed(&tx).unwrap();
        tx.commit().unwrap();

        let summaries = log.list(&conn, None).unwrap();
        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[0].operation_id, "op-9");
    }

    #[test]
    fn test_list_filters_by_note_and_replay_keeps_order() {
        let mut conn = journal_db();
        let log = OperationLog::new(PurgeStrategy::KeepAll);

        let tx = conn.transaction().unwrap();
        for i in 0..6 {
            log.log(&tx, &delete_op(i)).unwrap();
        }
        log.purge_if_needed(&tx).unwrap();
        tx.commit().unwrap();

        let for_one = log.list(&conn, Some(NoteId::new(1))).unwrap();
        let ids: Vec<_> = for_one.iter().map(|s| s.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["op-4", "op-1"]);

        let replayed = log.replay(&conn).unwrap();
        assert_eq!(replayed.len(), 6);
        assert_eq!(replayed[0], delete_op(0));
    }

    #[test]
    fn test_purge_strategy_json_is_camel_case() {
        let json = serde_json::to_string(&PurgeStrategy::KeepLast { keep_last: 10 }).unwrap();
        assert_eq!(json, r#"{"kind":"keepLast","keepLast":10}"#);

        let parsed: PurgeStrategy = serde_json::from_str(r#"{"kind":"keepAll"}"#).unwrap();
        assert_eq!(parsed, PurgeStrategy::KeepAll);
    }
}
