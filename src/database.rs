use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::live::{ChangeFeed, Table};
use crate::models::{Goal, SubTask, Task, TaskType};
use crate::utils::{from_millis, parse_date, to_millis};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("{0} has no ID")]
    MissingId(&'static str),
    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: i64 },
    #[error("Invalid task: {0}")]
    InvalidTask(&'static str),
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TASK_COLUMNS: &str = "id, title, description, is_completed, created_at, due_date, task_type, goal_id, \
     has_notification, notification_time, repeat_interval_minutes, is_deleted, deleted_at";

const GOAL_COLUMNS: &str = "id, title, description, is_completed, completed_at, start_date, target_date, \
     color, icon, created_at, is_deleted";

const SUBTASK_COLUMNS: &str = "id, task_id, title, is_completed, order_index, created_at";

/// Single long-lived handle on the app database.
/// Built once at startup and handed to every repository.
pub struct Database {
    conn: Connection,
    changes: ChangeFeed,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        Self::from_connection(Connection::open(&db_path)?)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // The CLI and the TUI may write to the same file at once
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Database {
            conn,
            changes: ChangeFeed::new(),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS goals (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                description     TEXT,
                is_completed    INTEGER NOT NULL DEFAULT 0,
                completed_at    TEXT,
                start_date      TEXT,
                target_date     TEXT,
                color           TEXT,
                icon            TEXT,
                created_at      INTEGER NOT NULL,
                is_deleted      INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id                      INTEGER PRIMARY KEY AUTOINCREMENT,
                title                   TEXT NOT NULL,
                description             TEXT NOT NULL DEFAULT '',
                is_completed            INTEGER NOT NULL DEFAULT 0,
                created_at              INTEGER NOT NULL,
                due_date                INTEGER,
                task_type               TEXT NOT NULL DEFAULT 'QUICK',
                goal_id                 INTEGER REFERENCES goals(id) ON DELETE SET NULL,
                has_notification        INTEGER NOT NULL DEFAULT 0,
                notification_time       INTEGER,
                repeat_interval_minutes INTEGER,
                is_deleted              INTEGER NOT NULL DEFAULT 0,
                deleted_at              INTEGER
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS subtasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id         INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                is_completed    INTEGER NOT NULL DEFAULT 0,
                order_index     INTEGER NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL,
                is_deleted      INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_goal_id ON tasks(goal_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_task_type ON tasks(task_type)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_subtasks_task_id ON subtasks(task_id)",
            [],
        )?;

        Ok(())
    }

    /// Counter that moves when another connection commits to the file.
    /// Writes through this handle leave it unchanged.
    pub fn data_version(&self) -> Result<i64, DatabaseError> {
        let version = self.conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Change feed fed by every committed write
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    // ===== Tasks =====

    /// Helper function to map a row to a Task
    fn row_to_task(row: &Row) -> Result<Task, rusqlite::Error> {
        let task_type: String = row.get(6)?;
        Ok(Task {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            is_completed: row.get::<_, i64>(3)? != 0,
            created_at: millis_column(row, 4)?,
            due_date: optional_millis_column(row, 5)?,
            task_type: task_type
                .parse::<TaskType>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?,
            goal_id: row.get(7)?,
            has_notification: row.get::<_, i64>(8)? != 0,
            notification_time: optional_millis_column(row, 9)?,
            repeat_interval_minutes: row.get(10)?,
            is_deleted: row.get::<_, i64>(11)? != 0,
            deleted_at: optional_millis_column(row, 12)?,
        })
    }

    fn query_tasks(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Task>, DatabaseError> {
        let sql = format!("SELECT {} FROM tasks WHERE is_deleted = 0 {}", TASK_COLUMNS, filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params, Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn count_tasks(&self, filter: &str, params: impl rusqlite::Params) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM tasks WHERE is_deleted = 0 {}", filter);
        let count = self.conn.query_row(&sql, params, |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a task into the database and return its ID
    pub fn insert_task(&self, task: &Task) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (title, description, is_completed, created_at, due_date, task_type, goal_id,
                                has_notification, notification_time, repeat_interval_minutes, is_deleted, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                task.title,
                task.description,
                task.is_completed,
                to_millis(task.created_at),
                task.due_date.map(to_millis),
                task.task_type.as_str(),
                task.goal_id,
                task.has_notification,
                task.notification_time.map(to_millis),
                task.repeat_interval_minutes,
                task.is_deleted,
                task.deleted_at.map(to_millis),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.changes.publish(Table::Tasks);
        Ok(id)
    }

    /// Update an existing, not deleted task. `created_at` is never rewritten.
    pub fn update_task(&self, task: &Task) -> Result<(), DatabaseError> {
        let id = task.id.ok_or(DatabaseError::MissingId("Task"))?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, is_completed = ?3, due_date = ?4, task_type = ?5,
                 goal_id = ?6, has_notification = ?7, notification_time = ?8, repeat_interval_minutes = ?9
             WHERE id = ?10 AND is_deleted = 0",
            rusqlite::params![
                task.title,
                task.description,
                task.is_completed,
                task.due_date.map(to_millis),
                task.task_type.as_str(),
                task.goal_id,
                task.has_notification,
                task.notification_time.map(to_millis),
                task.repeat_interval_minutes,
                id
            ],
        )?;
        tx.commit()?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { table: "task", id });
        }
        self.changes.publish(Table::Tasks);
        Ok(())
    }

    /// Get a single, not deleted task by ID
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        Ok(self.query_tasks("AND id = ?1", rusqlite::params![id])?.into_iter().next())
    }

    /// Get a task by ID even when soft-deleted
    pub fn get_task_including_deleted(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = self
            .conn
            .query_row(&sql, rusqlite::params![id], Self::row_to_task)
            .optional()?;
        Ok(task)
    }

    /// All tasks, newest first
    pub fn get_all_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks("ORDER BY created_at DESC, id DESC", [])
    }

    pub fn get_tasks_by_type(&self, task_type: TaskType) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            "AND task_type = ?1 ORDER BY created_at DESC, id DESC",
            rusqlite::params![task_type.as_str()],
        )
    }

    pub fn get_tasks_by_goal(&self, goal_id: i64) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            "AND goal_id = ?1 ORDER BY created_at DESC, id DESC",
            rusqlite::params![goal_id],
        )
    }

    /// Tasks due within `[start, end]`, earliest due first
    pub fn get_tasks_by_due_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            "AND due_date BETWEEN ?1 AND ?2 ORDER BY due_date ASC, id ASC",
            rusqlite::params![to_millis(start), to_millis(end)],
        )
    }

    pub fn get_tasks_by_completion(&self, completed: bool) -> Result<Vec<Task>, DatabaseError> {
        self.query_tasks(
            "AND is_completed = ?1 ORDER BY created_at DESC, id DESC",
            rusqlite::params![completed],
        )
    }

    pub fn count_tasks_by_type(&self, task_type: TaskType, completed_only: bool) -> Result<i64, DatabaseError> {
        if completed_only {
            self.count_tasks("AND task_type = ?1 AND is_completed = 1", rusqlite::params![task_type.as_str()])
        } else {
            self.count_tasks("AND task_type = ?1", rusqlite::params![task_type.as_str()])
        }
    }

    pub fn count_tasks_by_goal(&self, goal_id: i64, completed_only: bool) -> Result<i64, DatabaseError> {
        if completed_only {
            self.count_tasks("AND goal_id = ?1 AND is_completed = 1", rusqlite::params![goal_id])
        } else {
            self.count_tasks("AND goal_id = ?1", rusqlite::params![goal_id])
        }
    }

    /// Mark a task deleted. Returns false when it was missing or already deleted.
    pub fn soft_delete_task(&self, id: i64, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET is_deleted = 1, deleted_at = ?1 WHERE id = ?2 AND is_deleted = 0",
            rusqlite::params![to_millis(at), id],
        )?;
        tx.commit()?;
        if changed > 0 {
            self.changes.publish(Table::Tasks);
        }
        Ok(changed > 0)
    }

    /// Mark every completed task deleted, returning how many rows changed
    pub fn soft_delete_completed_tasks(&self, at: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks SET is_deleted = 1, deleted_at = ?1 WHERE is_completed = 1 AND is_deleted = 0",
            rusqlite::params![to_millis(at)],
        )?;
        tx.commit()?;
        if changed > 0 {
            self.changes.publish(Table::Tasks);
        }
        Ok(changed)
    }

    // ===== Goals =====

    /// Helper function to map a row to a Goal
    fn row_to_goal(row: &Row) -> Result<Goal, rusqlite::Error> {
        Ok(Goal {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            is_completed: row.get::<_, i64>(3)? != 0,
            completed_at: optional_date_column(row, 4)?,
            start_date: optional_date_column(row, 5)?,
            target_date: optional_date_column(row, 6)?,
            color: row.get(7)?,
            icon: row.get(8)?,
            created_at: millis_column(row, 9)?,
            is_deleted: row.get::<_, i64>(10)? != 0,
        })
    }

    fn query_goals(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Goal>, DatabaseError> {
        let sql = format!("SELECT {} FROM goals WHERE is_deleted = 0 {}", GOAL_COLUMNS, filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let goals = stmt
            .query_map(params, Self::row_to_goal)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Insert a goal into the database and return its ID
    pub fn insert_goal(&self, goal: &Goal) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO goals (title, description, is_completed, completed_at, start_date, target_date,
                                color, icon, created_at, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                goal.title,
                goal.description,
                goal.is_completed,
                goal.completed_at.map(format_date),
                goal.start_date.map(format_date),
                goal.target_date.map(format_date),
                goal.color,
                goal.icon,
                to_millis(goal.created_at),
                goal.is_deleted,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.changes.publish(Table::Goals);
        Ok(id)
    }

    /// Update an existing goal
    pub fn update_goal(&self, goal: &Goal) -> Result<(), DatabaseError> {
        let id = goal.id.ok_or(DatabaseError::MissingId("Goal"))?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE goals SET title = ?1, description = ?2, is_completed = ?3, completed_at = ?4,
                 start_date = ?5, target_date = ?6, color = ?7, icon = ?8
             WHERE id = ?9 AND is_deleted = 0",
            rusqlite::params![
                goal.title,
                goal.description,
                goal.is_completed,
                goal.completed_at.map(format_date),
                goal.start_date.map(format_date),
                goal.target_date.map(format_date),
                goal.color,
                goal.icon,
                id
            ],
        )?;
        tx.commit()?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { table: "goal", id });
        }
        self.changes.publish(Table::Goals);
        Ok(())
    }

    pub fn get_goal(&self, id: i64) -> Result<Option<Goal>, DatabaseError> {
        Ok(self.query_goals("AND id = ?1", rusqlite::params![id])?.into_iter().next())
    }

    /// All goals, newest first
    pub fn get_all_goals(&self) -> Result<Vec<Goal>, DatabaseError> {
        self.query_goals("ORDER BY created_at DESC, id DESC", [])
    }

    pub fn get_completed_goals(&self) -> Result<Vec<Goal>, DatabaseError> {
        self.query_goals("AND is_completed = 1 ORDER BY completed_at DESC, id DESC", [])
    }

    pub fn get_active_goals(&self) -> Result<Vec<Goal>, DatabaseError> {
        self.query_goals("AND is_completed = 0 ORDER BY created_at DESC, id DESC", [])
    }

    pub fn count_goals(&self) -> Result<i64, DatabaseError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM goals WHERE is_deleted = 0", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn set_goal_completed(
        &self,
        id: i64,
        completed: bool,
        completed_at: Option<NaiveDate>,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE goals SET is_completed = ?1, completed_at = ?2 WHERE id = ?3 AND is_deleted = 0",
            rusqlite::params![completed, completed_at.map(format_date), id],
        )?;
        tx.commit()?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { table: "goal", id });
        }
        self.changes.publish(Table::Goals);
        Ok(())
    }

    /// Soft delete a goal.
    /// Its tasks survive with their goal reference cleared.
    pub fn soft_delete_goal(&self, id: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE goals SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            rusqlite::params![id],
        )?;
        let detached = tx.execute(
            "UPDATE tasks SET goal_id = NULL WHERE goal_id = ?1",
            rusqlite::params![id],
        )?;
        tx.commit()?;
        if changed > 0 {
            self.changes.publish(Table::Goals);
        }
        if detached > 0 {
            self.changes.publish(Table::Tasks);
        }
        Ok(changed > 0)
    }

    // ===== Subtasks =====

    fn row_to_subtask(row: &Row) -> Result<SubTask, rusqlite::Error> {
        Ok(SubTask {
            id: Some(row.get(0)?),
            task_id: row.get(1)?,
            title: row.get(2)?,
            is_completed: row.get::<_, i64>(3)? != 0,
            order_index: row.get(4)?,
            created_at: millis_column(row, 5)?,
        })
    }

    /// Subtasks of a task, in display order
    pub fn get_subtasks(&self, task_id: i64) -> Result<Vec<SubTask>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM subtasks WHERE task_id = ?1 AND is_deleted = 0 ORDER BY order_index ASC, id ASC",
            SUBTASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let subtasks = stmt
            .query_map(rusqlite::params![task_id], Self::row_to_subtask)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subtasks)
    }

    pub fn get_subtask(&self, id: i64) -> Result<Option<SubTask>, DatabaseError> {
        let sql = format!("SELECT {} FROM subtasks WHERE id = ?1 AND is_deleted = 0", SUBTASK_COLUMNS);
        let subtask = self
            .conn
            .query_row(&sql, rusqlite::params![id], Self::row_to_subtask)
            .optional()?;
        Ok(subtask)
    }

    pub fn insert_subtask(&self, subtask: &SubTask) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO subtasks (task_id, title, is_completed, order_index, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                subtask.task_id,
                subtask.title,
                subtask.is_completed,
                subtask.order_index,
                to_millis(subtask.created_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.changes.publish(Table::SubTasks);
        Ok(id)
    }

    pub fn update_subtask(&self, subtask: &SubTask) -> Result<(), DatabaseError> {
        let id = subtask.id.ok_or(DatabaseError::MissingId("Subtask"))?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE subtasks SET title = ?1, is_completed = ?2, order_index = ?3 WHERE id = ?4 AND is_deleted = 0",
            rusqlite::params![subtask.title, subtask.is_completed, subtask.order_index, id],
        )?;
        tx.commit()?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { table: "subtask", id });
        }
        self.changes.publish(Table::SubTasks);
        Ok(())
    }

    pub fn soft_delete_subtask(&self, id: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE subtasks SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
            rusqlite::params![id],
        )?;
        tx.commit()?;
        if changed > 0 {
            self.changes.publish(Table::SubTasks);
        }
        Ok(changed > 0)
    }

    /// (total, completed) subtask counts for a task
    pub fn count_subtasks(&self, task_id: i64) -> Result<(i64, i64), DatabaseError> {
        let counts = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_completed), 0) FROM subtasks WHERE task_id = ?1 AND is_deleted = 0",
            rusqlite::params![task_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }

    /// Highest order index among a task's subtasks, -1 when it has none
    pub fn get_max_subtask_order(&self, task_id: i64) -> Result<i64, DatabaseError> {
        let max_order: Option<i64> = self.conn.query_row(
            "SELECT MAX(order_index) FROM subtasks WHERE task_id = ?1 AND is_deleted = 0",
            rusqlite::params![task_id],
            |row| row.get(0),
        )?;
        Ok(max_order.unwrap_or(-1))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn millis_column(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let millis: i64 = row.get(idx)?;
    from_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn optional_millis_column(row: &Row, idx: usize) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(millis) => from_millis(millis)
            .map(Some)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis)),
        None => Ok(None),
    }
}

fn optional_date_column(row: &Row, idx: usize) -> Result<Option<NaiveDate>, rusqlite::Error> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => parse_date(&text)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}
