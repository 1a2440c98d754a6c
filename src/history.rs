//! `SQLite`-backed request history.
//!
//! Every solved or checked problem can be recorded locally so users can scroll
//! back through past problems (`mathsnap --history 20`). The store is a single
//! table in one database file; WAL mode keeps concurrent CLI invocations safe.

use crate::config::TaskKind;
use crate::error::MathSnapError;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Schema version recorded in `user_version`. Bump on any table change.
const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    kind        TEXT    NOT NULL,
    problem     TEXT    NOT NULL,
    result      TEXT    NOT NULL,
    correct     INTEGER,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at DESC);
";

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// Row id (0 until inserted).
    pub id: i64,
    /// Whether this was a solve or a check run.
    pub kind: TaskKind,
    /// The problem statement as extracted from the response.
    pub problem: String,
    /// The full cleaned model response.
    pub result: String,
    /// Check-mode verdict; `None` for solve runs or unreadable verdicts.
    pub correct: Option<bool>,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// Persistent history store.
///
/// # Examples
///
/// ```no_run
/// use mathsnap::history::HistoryStore;
///
/// let store = HistoryStore::open("~/.mathsnap/history.db").unwrap();
/// for rec in store.recent(10).unwrap() {
///     println!("[{}] {}", rec.kind.as_str(), rec.problem);
/// }
/// ```
pub struct HistoryStore {
    conn: Connection,
    /// Database file path (None for in-memory).
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// Opens or creates the history database at the given path.
    ///
    /// The parent directory is created if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MathSnapError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MathSnapError::Internal(format!(
                        "Failed to create history directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL mode for concurrent CLI invocations (returns a row, use query_row)
        let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;

        let mut store = Self {
            conn,
            path: Some(path),
        };
        store.init()?;
        Ok(store)
    }

    /// Creates an in-memory history store. Useful for testing and `--no-history`.
    pub fn in_memory() -> Result<Self, MathSnapError> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(&mut self) -> Result<(), MathSnapError> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(SCHEMA_SQL)?;
            // PRAGMA does not support bound parameters
            self.conn
                .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        }
        Ok(())
    }

    /// Inserts a record and returns it with `id` and `created_at` filled in.
    pub fn insert(
        &self,
        kind: TaskKind,
        problem: &str,
        result: &str,
        correct: Option<bool>,
    ) -> Result<HistoryRecord, MathSnapError> {
        let created_at = now();
        self.conn.execute(
            "INSERT INTO history (kind, problem, result, correct, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![kind.as_str(), problem, result, correct, created_at],
        )?;

        Ok(HistoryRecord {
            id: self.conn.last_insert_rowid(),
            kind,
            problem: problem.to_string(),
            result: result.to_string(),
            correct,
            created_at,
        })
    }

    /// Returns the most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, MathSnapError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, problem, result, correct, created_at
             FROM history ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryRecord {
                id: row.get(0)?,
                kind: TaskKind::from_str_lossy(&row.get::<_, String>(1)?),
                problem: row.get(2)?,
                result: row.get(3)?,
                correct: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Deletes all records. Returns the number removed.
    pub fn clear(&self) -> Result<usize, MathSnapError> {
        let n = self.conn.execute("DELETE FROM history", [])?;
        Ok(n)
    }
}

/// Current Unix timestamp in seconds.
fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
