use std::rc::Rc;

use crate::database::{Database, DatabaseError};
use crate::live::{LiveQuery, Table};
use crate::models::SubTask;

pub struct SubTaskRepository {
    db: Rc<Database>,
}

impl SubTaskRepository {
    pub fn new(db: Rc<Database>) -> Self {
        Self { db }
    }

    pub fn subtasks(&self, task_id: i64) -> LiveQuery<Vec<SubTask>> {
        LiveQuery::new(Rc::clone(&self.db), &[Table::SubTasks], move |db| db.get_subtasks(task_id))
    }

    /// (total, completed)
    pub fn counts(&self, task_id: i64) -> LiveQuery<(i64, i64)> {
        LiveQuery::new(Rc::clone(&self.db), &[Table::SubTasks], move |db| db.count_subtasks(task_id))
    }

    /// Append a subtask after the task's current last one
    pub fn add_subtask(&self, task_id: i64, title: &str) -> Result<i64, DatabaseError> {
        let mut subtask = SubTask::new(task_id, title.to_string());
        subtask.order_index = self.db.get_max_subtask_order(task_id)? + 1;
        self.db.insert_subtask(&subtask)
    }

    pub fn update_subtask(&self, subtask: &SubTask) -> Result<(), DatabaseError> {
        self.db.update_subtask(subtask)
    }

    pub fn toggle_subtask(&self, id: i64) -> Result<Option<SubTask>, DatabaseError> {
        let Some(subtask) = self.db.get_subtask(id)? else {
            return Ok(None);
        };
        let updated = SubTask {
            is_completed: !subtask.is_completed,
            ..subtask
        };
        self.db.update_subtask(&updated)?;
        Ok(Some(updated))
    }

    pub fn delete_subtask(&self, id: i64) -> Result<bool, DatabaseError> {
        self.db.soft_delete_subtask(id)
    }
}
