use chrono::Local;
use std::rc::Rc;

use crate::database::{Database, DatabaseError};
use crate::live::{LiveQuery, Table};
use crate::models::Goal;

pub struct GoalRepository {
    db: Rc<Database>,
}

impl GoalRepository {
    pub fn new(db: Rc<Database>) -> Self {
        Self { db }
    }

    fn live<T, F>(&self, query: F) -> LiveQuery<T>
    where
        F: Fn(&Database) -> Result<T, DatabaseError> + 'static,
    {
        LiveQuery::new(Rc::clone(&self.db), &[Table::Goals], query)
    }

    pub fn goals(&self) -> LiveQuery<Vec<Goal>> {
        self.live(|db| db.get_all_goals())
    }

    pub fn goal_by_id(&self, id: i64) -> LiveQuery<Option<Goal>> {
        self.live(move |db| db.get_goal(id))
    }

    pub fn completed_goals(&self) -> LiveQuery<Vec<Goal>> {
        self.live(|db| db.get_completed_goals())
    }

    pub fn active_goals(&self) -> LiveQuery<Vec<Goal>> {
        self.live(|db| db.get_active_goals())
    }

    pub fn goal_count(&self) -> LiveQuery<i64> {
        self.live(|db| db.count_goals())
    }

    pub fn get_goal(&self, id: i64) -> Result<Option<Goal>, DatabaseError> {
        self.db.get_goal(id)
    }

    pub fn add_goal(&self, goal: &Goal) -> Result<i64, DatabaseError> {
        self.db.insert_goal(goal)
    }

    pub fn update_goal(&self, goal: &Goal) -> Result<(), DatabaseError> {
        self.db.update_goal(goal)
    }

    /// Soft delete; the goal's tasks are kept and detached from it
    pub fn delete_goal(&self, id: i64) -> Result<bool, DatabaseError> {
        self.db.soft_delete_goal(id)
    }

    /// Completing stamps today's date, reopening clears it
    pub fn toggle_goal_completion(&self, id: i64) -> Result<Option<Goal>, DatabaseError> {
        let Some(goal) = self.db.get_goal(id)? else {
            return Ok(None);
        };
        let is_completed = !goal.is_completed;
        let completed_at = is_completed.then(|| Local::now().date_naive());
        self.db.set_goal_completed(id, is_completed, completed_at)?;
        Ok(Some(Goal {
            is_completed,
            completed_at,
            ..goal
        }))
    }
}
