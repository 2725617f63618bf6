use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::day_bounds;

/// Kind of task, stored by name in the `task_type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskType {
    /// Daily task or habit
    Daily,
    /// Quick one-time task
    Quick,
    /// Task that belongs to a goal
    Goal,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Daily, TaskType::Quick, TaskType::Goal];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Daily => "DAILY",
            TaskType::Quick => "QUICK",
            TaskType::Goal => "GOAL",
        }
    }

    /// Lowercase name, as typed on the command line
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Daily => "daily",
            TaskType::Quick => "quick",
            TaskType::Goal => "goal",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(TaskType::Daily),
            "QUICK" => Ok(TaskType::Quick),
            "GOAL" => Ok(TaskType::Goal),
            other => Err(format!("unknown task type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub task_type: TaskType,
    pub goal_id: Option<i64>,
    pub has_notification: bool,
    /// Explicit reminder instant; when absent the reminder falls back to due date minus the lead
    pub notification_time: Option<DateTime<Utc>>,
    /// Stored and round-tripped only. No reminder rule reads it.
    pub repeat_interval_minutes: Option<i64>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: String) -> Self {
        Self {
            id: None,
            title,
            description: String::new(),
            is_completed: false,
            created_at: Utc::now(),
            due_date: None,
            task_type: TaskType::Quick,
            goal_id: None,
            has_notification: false,
            notification_time: None,
            repeat_interval_minutes: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Task of type GOAL under `goal_id`, due at the start of the goal's
    /// target day when the goal has one
    pub fn for_goal<Tz: TimeZone>(title: String, goal_id: i64, target_date: Option<NaiveDate>, tz: &Tz) -> Self {
        Self {
            task_type: TaskType::Goal,
            goal_id: Some(goal_id),
            due_date: target_date.map(|date| day_bounds(date, tz).0),
            ..Self::new(title)
        }
    }

    pub fn has_due_date(&self) -> bool {
        self.due_date.is_some()
    }

    /// Past due date and not completed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && !self.is_completed,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub completed_at: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Goal {
    pub fn new(title: String) -> Self {
        Self {
            id: None,
            title,
            description: None,
            is_completed: false,
            completed_at: None,
            start_date: None,
            target_date: None,
            color: None,
            icon: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.target_date {
            Some(target) => target < today && !self.is_completed,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: Option<i64>,
    pub task_id: i64,
    pub title: String,
    pub is_completed: bool,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

impl SubTask {
    pub fn new(task_id: i64, title: String) -> Self {
        Self {
            id: None,
            task_id,
            title,
            is_completed: false,
            order_index: 0,
            created_at: Utc::now(),
        }
    }
}
