use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::utils::{from_millis, to_millis};

#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("Alarm store error: {0}")]
    StoreError(#[from] rusqlite::Error),
    #[error("Failed to encode alarm payload: {0}")]
    PayloadError(#[from] serde_json::Error),
    #[error("Failed to create alarm directory: {0}")]
    DirectoryError(String),
    #[error("Alarm registration rejected: {0}")]
    Rejected(String),
}

/// Snapshot handed to the dispatcher when an alarm fires.
/// Captured at scheduling time and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub task_id: i64,
    pub title: String,
}

impl ReminderPayload {
    pub fn encode(&self) -> Result<String, AlarmError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One-shot wake-up facility, keyed by task id.
///
/// Registering under an existing key replaces the previous alarm.
pub trait AlarmRegistry {
    /// Whether exact alarms may currently be registered
    fn can_schedule_exact(&self) -> bool;

    fn register_one_shot(
        &self,
        key: i64,
        trigger_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), AlarmError>;

    /// Remove the alarm under `key`. A missing alarm is not an error.
    fn cancel(&self, key: i64) -> Result<(), AlarmError>;
}

/// Alarm waiting to fire, as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlarm {
    pub key: i64,
    pub trigger_at: DateTime<Utc>,
    /// Raw payload text, decoded by the dispatcher
    pub payload: String,
}

/// Alarm facility backed by its own SQLite file.
///
/// The app registers alarms here and the reminder daemon drains due rows,
/// so delivery works from a cold start with nothing but this file.
pub struct SqliteAlarmRegistry {
    conn: Connection,
    exact_alarms_allowed: bool,
}

impl SqliteAlarmRegistry {
    pub fn open(path: &Path, exact_alarms_allowed: bool) -> Result<Self, AlarmError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AlarmError::DirectoryError(e.to_string()))?;
            }
        }
        Self::from_connection(Connection::open(path)?, exact_alarms_allowed)
    }

    pub fn open_in_memory(exact_alarms_allowed: bool) -> Result<Self, AlarmError> {
        Self::from_connection(Connection::open_in_memory()?, exact_alarms_allowed)
    }

    fn from_connection(conn: Connection, exact_alarms_allowed: bool) -> Result<Self, AlarmError> {
        // The app registers while the watcher drains, from separate processes
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS alarms (
                task_id     INTEGER PRIMARY KEY,
                trigger_at  INTEGER NOT NULL,
                payload     TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_alarms_trigger_at ON alarms(trigger_at)",
            [],
        )?;
        Ok(Self {
            conn,
            exact_alarms_allowed,
        })
    }

    fn row_to_alarm(row: &rusqlite::Row) -> Result<PendingAlarm, rusqlite::Error> {
        let millis: i64 = row.get(1)?;
        Ok(PendingAlarm {
            key: row.get(0)?,
            trigger_at: from_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(1, millis))?,
            payload: row.get(2)?,
        })
    }

    /// Every registered alarm, soonest first
    pub fn pending(&self) -> Result<Vec<PendingAlarm>, AlarmError> {
        let mut stmt = self
            .conn
            .prepare("SELECT task_id, trigger_at, payload FROM alarms ORDER BY trigger_at ASC, task_id ASC")?;
        let alarms = stmt
            .query_map([], Self::row_to_alarm)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alarms)
    }

    pub fn get(&self, key: i64) -> Result<Option<PendingAlarm>, AlarmError> {
        use rusqlite::OptionalExtension;
        let alarm = self
            .conn
            .query_row(
                "SELECT task_id, trigger_at, payload FROM alarms WHERE task_id = ?1",
                rusqlite::params![key],
                Self::row_to_alarm,
            )
            .optional()?;
        Ok(alarm)
    }

    /// Remove and return every alarm due at or before `now`.
    /// Each alarm is handed out once.
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<PendingAlarm>, AlarmError> {
        // Take the write lock up front; upgrading a read lock cannot wait out a busy writer
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let due = {
            let mut stmt = tx.prepare(
                "SELECT task_id, trigger_at, payload FROM alarms WHERE trigger_at <= ?1
                 ORDER BY trigger_at ASC, task_id ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![to_millis(now)], Self::row_to_alarm)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.execute(
            "DELETE FROM alarms WHERE trigger_at <= ?1",
            rusqlite::params![to_millis(now)],
        )?;
        tx.commit()?;
        Ok(due)
    }
}

impl AlarmRegistry for SqliteAlarmRegistry {
    fn can_schedule_exact(&self) -> bool {
        self.exact_alarms_allowed
    }

    fn register_one_shot(
        &self,
        key: i64,
        trigger_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), AlarmError> {
        let payload = payload.encode()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO alarms (task_id, trigger_at, payload) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, to_millis(trigger_at), payload],
        )?;
        Ok(())
    }

    fn cancel(&self, key: i64) -> Result<(), AlarmError> {
        self.conn
            .execute("DELETE FROM alarms WHERE task_id = ?1", rusqlite::params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload(task_id: i64, title: &str) -> ReminderPayload {
        ReminderPayload {
            task_id,
            title: title.to_string(),
        }
    }

    #[test]
    fn registering_same_key_replaces() {
        let alarms = SqliteAlarmRegistry::open_in_memory(true).unwrap();
        let now = Utc::now();
        alarms.register_one_shot(7, now + Duration::hours(1), &payload(7, "old")).unwrap();
        alarms.register_one_shot(7, now + Duration::hours(2), &payload(7, "new")).unwrap();

        let pending = alarms.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].payload.contains("new"));
    }

    #[test]
    fn take_due_drains_only_due_alarms() {
        let alarms = SqliteAlarmRegistry::open_in_memory(true).unwrap();
        let now = Utc::now();
        alarms.register_one_shot(1, now - Duration::minutes(1), &payload(1, "due")).unwrap();
        alarms.register_one_shot(2, now, &payload(2, "exactly now")).unwrap();
        alarms.register_one_shot(3, now + Duration::minutes(1), &payload(3, "later")).unwrap();

        let due = alarms.take_due(now).unwrap();
        assert_eq!(due.iter().map(|a| a.key).collect::<Vec<_>>(), vec![1, 2]);
        assert!(alarms.take_due(now).unwrap().is_empty());
        assert_eq!(alarms.pending().unwrap().len(), 1);
    }

    #[test]
    fn take_due_waits_for_a_concurrent_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.db");
        let alarms = SqliteAlarmRegistry::open(&path, true).unwrap();
        let now = Utc::now();

        // Another process is halfway through registering an alarm
        let writer = Connection::open(&path).unwrap();
        writer.execute_batch("BEGIN IMMEDIATE").unwrap();
        writer
            .execute(
                "INSERT INTO alarms (task_id, trigger_at, payload) VALUES (5, ?1, '{\"task_id\":5}')",
                rusqlite::params![to_millis(now - Duration::minutes(1))],
            )
            .unwrap();
        let committer = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            writer.execute_batch("COMMIT").unwrap();
        });

        let due = alarms.take_due(now).unwrap();
        committer.join().unwrap();
        assert_eq!(due.iter().map(|a| a.key).collect::<Vec<_>>(), vec![5]);
        assert!(alarms.pending().unwrap().is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let alarms = SqliteAlarmRegistry::open_in_memory(true).unwrap();
        alarms.cancel(42).unwrap();
        alarms
            .register_one_shot(42, Utc::now() + Duration::hours(1), &payload(42, "x"))
            .unwrap();
        alarms.cancel(42).unwrap();
        alarms.cancel(42).unwrap();
        assert!(alarms.get(42).unwrap().is_none());
    }
}
