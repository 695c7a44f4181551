//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Session results, deduplicated so replayed events are harmless
//! - Daily statistics
//! - Key-value store for engine snapshots and other host state

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::battle::{EndReason, SessionResult};
use crate::error::{DatabaseError, Result};

/// A session result as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: i64,
    pub result: SessionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DailyStats {
    pub date: Option<NaiveDate>,
    pub sessions: u64,
    pub victories: u64,
    pub retreats: u64,
    pub focused_seconds: f64,
    pub wasted_seconds: f64,
}

/// SQLite database for session results and host state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/focusraid.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusraid.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> std::result::Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session_results (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id           TEXT NOT NULL,
                task_name         TEXT NOT NULL,
                end_reason        TEXT NOT NULL,
                focused_seconds   REAL NOT NULL,
                wasted_seconds    REAL NOT NULL,
                remaining_seconds REAL,
                recorded_at       TEXT NOT NULL,
                day               TEXT NOT NULL,
                UNIQUE (task_id, recorded_at, end_reason)
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_session_results_day ON session_results(day);",
        )
    }

    /// Record a session result. Returns `false` if the same result was
    /// already stored, which makes replays after `restore` harmless.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_result(&self, result: &SessionResult) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO session_results
                (task_id, task_name, end_reason, focused_seconds, wasted_seconds,
                 remaining_seconds, recorded_at, day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                result.task_id,
                result.task_name,
                result.end_reason.as_str(),
                result.focused_seconds,
                result.wasted_seconds,
                result.remaining_seconds_at_exit,
                result.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                day_key(result.timestamp.date_naive()),
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Results recorded on `date` (UTC), oldest first.
    pub fn results_on(&self, date: NaiveDate) -> Result<Vec<StoredResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, task_name, end_reason, focused_seconds, wasted_seconds,
                    remaining_seconds, recorded_at
             FROM session_results
             WHERE day = ?1
             ORDER BY recorded_at, id",
        )?;
        let rows = stmt.query_map(params![day_key(date)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, task_id, task_name, reason, focused, wasted, remaining, recorded_at) = row?;
            let end_reason = EndReason::parse(&reason).ok_or_else(|| {
                DatabaseError::QueryFailed(format!("unknown end_reason '{reason}'"))
            })?;
            let timestamp = DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
                .with_timezone(&Utc);
            results.push(StoredResult {
                id,
                result: SessionResult {
                    end_reason,
                    focused_seconds: focused,
                    wasted_seconds: wasted,
                    remaining_seconds_at_exit: remaining,
                    task_id,
                    task_name,
                    timestamp,
                },
            });
        }
        Ok(results)
    }

    pub fn stats_for(&self, date: NaiveDate) -> Result<DailyStats> {
        let mut stats = DailyStats {
            date: Some(date),
            ..DailyStats::default()
        };
        for stored in self.results_on(date)? {
            let r = &stored.result;
            stats.sessions += 1;
            match r.end_reason {
                EndReason::Victory | EndReason::ForcedComplete => stats.victories += 1,
                EndReason::IncompleteExit => stats.retreats += 1,
            }
            stats.focused_seconds += r.focused_seconds;
            stats.wasted_seconds += r.wasted_seconds;
        }
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Read a JSON-encoded value from the kv store.
    pub fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv_get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv_set(key, &json)
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result(reason: EndReason, focused: f64, hour: u32) -> SessionResult {
        SessionResult {
            end_reason: reason,
            focused_seconds: focused,
            wasted_seconds: 12.0,
            remaining_seconds_at_exit: (reason == EndReason::IncompleteExit).then_some(30.0),
            task_id: "task-1".into(),
            task_name: "Read paper".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 4, 9, hour, 15, 0).unwrap(),
        }
    }

    #[test]
    fn replayed_results_are_ignored() {
        let db = Database::open_memory().unwrap();
        let r = result(EndReason::Victory, 1500.0, 9);
        assert!(db.record_result(&r).unwrap());
        assert!(!db.record_result(&r).unwrap());

        let day = r.timestamp.date_naive();
        let stored = db.results_on(day).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].result, r);
    }

    #[test]
    fn same_name_different_tasks_are_kept() {
        let db = Database::open_memory().unwrap();
        let first = result(EndReason::Victory, 1500.0, 9);
        let second = SessionResult {
            task_id: "task-2".into(),
            ..first.clone()
        };
        assert!(db.record_result(&first).unwrap());
        assert!(db.record_result(&second).unwrap());
        assert_eq!(db.results_on(first.timestamp.date_naive()).unwrap().len(), 2);
    }

    #[test]
    fn daily_stats() {
        let db = Database::open_memory().unwrap();
        db.record_result(&result(EndReason::Victory, 1500.0, 9)).unwrap();
        db.record_result(&result(EndReason::IncompleteExit, 600.0, 11)).unwrap();
        db.record_result(&result(EndReason::ForcedComplete, 300.0, 13)).unwrap();

        let stats = db
            .stats_for(NaiveDate::from_ymd_opt(2026, 4, 9).unwrap())
            .unwrap();
        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.victories, 2);
        assert_eq!(stats.retreats, 1);
        assert_eq!(stats.focused_seconds, 2400.0);
        assert_eq!(stats.wasted_seconds, 36.0);

        let other = db
            .stats_for(NaiveDate::from_ymd_opt(2026, 4, 10).unwrap())
            .unwrap();
        assert_eq!(other.sessions, 0);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn kv_json() {
        let db = Database::open_memory().unwrap();
        db.kv_set_json("numbers", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = db.kv_get_json("numbers").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raid.db");
        let db = Database::open_at(&path).unwrap();
        db.kv_set("k", "v").unwrap();
        drop(db);
        let reopened = Database::open_at(&path).unwrap();
        assert_eq!(reopened.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
