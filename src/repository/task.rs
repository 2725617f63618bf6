use chrono::{DateTime, Local, NaiveDate, Utc};
use std::rc::Rc;
use tracing::debug;

use crate::database::{Database, DatabaseError};
use crate::live::{LiveQuery, Table};
use crate::models::{Task, TaskType};
use crate::reminder::{Clock, ReminderScheduler};
use crate::utils::day_bounds;

/// Task reads and writes. Every write keeps the task's reminder in step
/// with its stored state.
pub struct TaskRepository {
    db: Rc<Database>,
    scheduler: Rc<ReminderScheduler>,
    clock: Rc<dyn Clock>,
}

impl TaskRepository {
    pub fn new(db: Rc<Database>, scheduler: Rc<ReminderScheduler>, clock: Rc<dyn Clock>) -> Self {
        Self { db, scheduler, clock }
    }

    fn live<T, F>(&self, query: F) -> LiveQuery<T>
    where
        F: Fn(&Database) -> Result<T, DatabaseError> + 'static,
    {
        LiveQuery::new(Rc::clone(&self.db), &[Table::Tasks], query)
    }

    pub fn tasks(&self) -> LiveQuery<Vec<Task>> {
        self.live(|db| db.get_all_tasks())
    }

    pub fn tasks_by_type(&self, task_type: TaskType) -> LiveQuery<Vec<Task>> {
        self.live(move |db| db.get_tasks_by_type(task_type))
    }

    pub fn tasks_by_goal(&self, goal_id: i64) -> LiveQuery<Vec<Task>> {
        self.live(move |db| db.get_tasks_by_goal(goal_id))
    }

    /// Tasks due on a calendar date in the local time zone
    pub fn tasks_for_date(&self, date: NaiveDate) -> LiveQuery<Vec<Task>> {
        let (start, end) = day_bounds(date, &Local);
        self.tasks_in_range(start, end)
    }

    pub fn tasks_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> LiveQuery<Vec<Task>> {
        self.live(move |db| db.get_tasks_by_due_range(start, end))
    }

    pub fn completed_tasks(&self) -> LiveQuery<Vec<Task>> {
        self.live(|db| db.get_tasks_by_completion(true))
    }

    pub fn pending_tasks(&self) -> LiveQuery<Vec<Task>> {
        self.live(|db| db.get_tasks_by_completion(false))
    }

    pub fn total_count_by_type(&self, task_type: TaskType) -> LiveQuery<i64> {
        self.live(move |db| db.count_tasks_by_type(task_type, false))
    }

    pub fn completed_count_by_type(&self, task_type: TaskType) -> LiveQuery<i64> {
        self.live(move |db| db.count_tasks_by_type(task_type, true))
    }

    /// One-shot read, for callers that don't need to follow changes
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        self.db.get_task(id)
    }

    /// Store a new task and schedule its reminder under the assigned id
    pub fn add_task(&self, task: &Task) -> Result<i64, DatabaseError> {
        check_goal_reference(task)?;
        let id = self.db.insert_task(task)?;
        let stored = Task {
            id: Some(id),
            ..task.clone()
        };
        let outcome = self.scheduler.schedule(&stored);
        debug!(task_id = id, ?outcome, "task added");
        Ok(id)
    }

    pub fn update_task(&self, task: &Task) -> Result<(), DatabaseError> {
        check_goal_reference(task)?;
        self.db.update_task(task)?;
        let outcome = self.scheduler.schedule(task);
        debug!(task_id = ?task.id, ?outcome, "task updated");
        Ok(())
    }

    pub fn delete_task(&self, task: &Task) -> Result<bool, DatabaseError> {
        let id = task.id.ok_or(DatabaseError::MissingId("Task"))?;
        self.scheduler.cancel(task);
        self.db.soft_delete_task(id, self.clock.now())
    }

    pub fn delete_task_by_id(&self, id: i64) -> Result<bool, DatabaseError> {
        self.scheduler.cancel_by_id(id);
        self.db.soft_delete_task(id, self.clock.now())
    }

    /// Flip completion and re-run scheduling on the new state.
    /// Returns the updated task, `None` when no such task exists.
    pub fn toggle_task_completion(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let Some(task) = self.db.get_task(id)? else {
            return Ok(None);
        };
        let updated = Task {
            is_completed: !task.is_completed,
            ..task
        };
        self.db.update_task(&updated)?;
        let outcome = self.scheduler.schedule(&updated);
        debug!(task_id = id, completed = updated.is_completed, ?outcome, "task toggled");
        Ok(Some(updated))
    }

    /// Soft delete every completed task, cancelling their reminders first
    pub fn delete_completed_tasks(&self) -> Result<usize, DatabaseError> {
        for task in self.db.get_tasks_by_completion(true)? {
            self.scheduler.cancel(&task);
        }
        self.db.soft_delete_completed_tasks(self.clock.now())
    }
}

/// Only GOAL tasks point at a goal
fn check_goal_reference(task: &Task) -> Result<(), DatabaseError> {
    if task.goal_id.is_some() && task.task_type != TaskType::Goal {
        return Err(DatabaseError::InvalidTask("only goal tasks can belong to a goal"));
    }
    Ok(())
}
