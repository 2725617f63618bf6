use std::rc::Rc;

use crate::database::{Database, DatabaseError};
use crate::live::{LiveQuery, Table};
use crate::models::{Goal, TaskType};

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal: Goal,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

impl GoalProgress {
    /// Whole percent of completed tasks, 0 for a goal with no tasks
    pub fn percent(&self) -> u16 {
        if self.total_tasks <= 0 {
            return 0;
        }
        ((self.completed_tasks.clamp(0, self.total_tasks) * 100) / self.total_tasks) as u16
    }
}

/// Figures on the home screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeSummary {
    pub daily_total: i64,
    pub daily_completed: i64,
    pub quick_total: i64,
    pub quick_completed: i64,
    pub goals: Vec<GoalProgress>,
}

impl HomeSummary {
    pub fn load(db: &Database) -> Result<Self, DatabaseError> {
        let goals = db
            .get_all_goals()?
            .into_iter()
            .map(|goal| {
                let id = goal.id.ok_or(DatabaseError::MissingId("Goal"))?;
                Ok(GoalProgress {
                    total_tasks: db.count_tasks_by_goal(id, false)?,
                    completed_tasks: db.count_tasks_by_goal(id, true)?,
                    goal,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        Ok(Self {
            daily_total: db.count_tasks_by_type(TaskType::Daily, false)?,
            daily_completed: db.count_tasks_by_type(TaskType::Daily, true)?,
            quick_total: db.count_tasks_by_type(TaskType::Quick, false)?,
            quick_completed: db.count_tasks_by_type(TaskType::Quick, true)?,
            goals,
        })
    }

    /// Summary that refreshes whenever tasks or goals change
    pub fn live(db: Rc<Database>) -> LiveQuery<HomeSummary> {
        LiveQuery::new(db, &[Table::Tasks, Table::Goals], HomeSummary::load)
    }
}
