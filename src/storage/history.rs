//! Run History Store
//!
//! Keeps the most recent pipeline runs in a small SQLite database. The
//! store is capped: inserting past the limit trims the oldest rows, so the
//! database never grows beyond `max_entries`.
//!
//! History writes are best-effort from the caller's point of view: front
//! ends log and continue when persistence fails.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::pipeline::PipelineRun;
use crate::types::{Error, Result, RunMode};

/// One persisted run
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub output: String,
    pub mode: RunMode,
    pub created_at: DateTime<Utc>,
}

/// Capped SQLite history store.
///
/// The connection sits behind a mutex; history traffic is light enough
/// that contention is not a concern.
pub struct HistoryStore {
    conn: Mutex<Connection>,
    max_entries: usize,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`.
    pub fn open(path: &Path, max_entries: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, max_entries)
    }

    /// In-memory store, used by tests and the `--no-history` path.
    pub fn open_in_memory(max_entries: usize) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, max_entries)
    }

    fn init(conn: Connection, max_entries: usize) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS history (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT NOT NULL,
                prompt     TEXT NOT NULL,
                output     TEXT NOT NULL,
                mode       TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_entries,
        })
    }

    /// Record a completed run. Runs without a final output are skipped.
    pub fn add(&self, run: &PipelineRun) -> Result<()> {
        let Some(output) = run.final_output() else {
            debug!(run_id = %run.id, "Skipping history write for incomplete run");
            return Ok(());
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO history (id, prompt, output, mode, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.id.to_string(),
                run.prompt,
                output,
                run.mode.to_string(),
                run.started_at.to_rfc3339(),
            ],
        )?;

        // Trim to the cap, oldest first
        conn.execute(
            "DELETE FROM history WHERE seq NOT IN (
                SELECT seq FROM history ORDER BY seq DESC LIMIT ?1
            )",
            params![self.max_entries as i64],
        )?;

        Ok(())
    }

    /// The most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, prompt, output, mode, created_at
             FROM history ORDER BY seq DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, prompt, output, mode, created_at) = row?;
            entries.push(HistoryEntry {
                id,
                prompt,
                output,
                mode: mode
                    .parse()
                    .map_err(|e: String| Error::Config(format!("corrupt history row: {e}")))?,
                created_at: created_at
                    .parse()
                    .map_err(|e| Error::Config(format!("corrupt history timestamp: {e}")))?,
            });
        }
        Ok(entries)
    }

    /// Delete every entry.
    pub fn clear(&self) -> Result<()> {
        self.lock()?.execute("DELETE FROM history", [])?;
        Ok(())
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize> {
        let count: i64 =
            self.lock()?
                .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Config("history store mutex poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn run_with_output(prompt: &str, output: &str) -> PipelineRun {
        let mut results = BTreeMap::new();
        results.insert("comprehensive".to_string(), output.to_string());
        PipelineRun {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            mode: RunMode::Standard,
            started_at: Utc::now(),
            results,
            failure: None,
        }
    }

    #[test]
    fn test_add_and_recent() {
        let store = HistoryStore::open_in_memory(50).unwrap();
        store.add(&run_with_output("first", "out1")).unwrap();
        store.add(&run_with_output("second", "out2")).unwrap();

        let entries = store.recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first
        assert_eq!(entries[0].prompt, "second");
        assert_eq!(entries[0].output, "out2");
        assert_eq!(entries[1].prompt, "first");
        assert_eq!(entries[0].mode, RunMode::Standard);
    }

    #[test]
    fn test_cap_trims_oldest() {
        let store = HistoryStore::open_in_memory(3).unwrap();
        for i in 0..5 {
            store
                .add(&run_with_output(&format!("p{i}"), &format!("o{i}")))
                .unwrap();
        }

        assert_eq!(store.len().unwrap(), 3);
        let entries = store.recent(10).unwrap();
        assert_eq!(entries[0].prompt, "p4");
        assert_eq!(entries[2].prompt, "p2");
    }

    #[test]
    fn test_incomplete_run_skipped() {
        let store = HistoryStore::open_in_memory(50).unwrap();
        let mut run = run_with_output("failed", "x");
        run.results.clear();
        store.add(&run).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_clear() {
        let store = HistoryStore::open_in_memory(50).unwrap();
        store.add(&run_with_output("a", "b")).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = HistoryStore::open(&path, 50).unwrap();
            store.add(&run_with_output("kept", "output")).unwrap();
        }

        let store = HistoryStore::open(&path, 50).unwrap();
        let entries = store.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].prompt, "kept");
    }
}
