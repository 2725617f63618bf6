use std::rc::Rc;
use thiserror::Error;

use crate::config::Config;
use crate::database::{Database, DatabaseError};
use crate::reminder::{AlarmError, AlarmRegistry, Clock, ReminderScheduler, SqliteAlarmRegistry, SystemClock};
use crate::repository::{GoalRepository, SubTaskRepository, TaskRepository};
use crate::usecase::{GetGoalsUseCase, GetTasksByTypeUseCase, GetTasksUseCase};

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Alarm store error: {0}")]
    Alarms(#[from] AlarmError),
}

/// Everything the presentation layer needs, wired once at startup
pub struct AppContainer {
    pub db: Rc<Database>,
    pub alarms: Rc<SqliteAlarmRegistry>,
    pub clock: Rc<dyn Clock>,
    pub scheduler: Rc<ReminderScheduler>,
    pub tasks: Rc<TaskRepository>,
    pub goals: Rc<GoalRepository>,
    pub subtasks: Rc<SubTaskRepository>,
    pub get_tasks: GetTasksUseCase,
    pub get_tasks_by_type: GetTasksByTypeUseCase,
    pub get_goals: GetGoalsUseCase,
}

impl AppContainer {
    /// Open the stores named in `config` and build the object graph
    pub fn from_config(config: &Config) -> Result<Self, ContainerError> {
        let db = Database::new(&config.get_database_path().to_string_lossy())?;
        let alarms = SqliteAlarmRegistry::open(&config.get_alarms_path(), config.reminders.exact_alarms)?;
        Ok(Self::new(Rc::new(db), Rc::new(alarms), Rc::new(SystemClock)))
    }

    pub fn new(db: Rc<Database>, alarms: Rc<SqliteAlarmRegistry>, clock: Rc<dyn Clock>) -> Self {
        let registry: Rc<dyn AlarmRegistry> = alarms.clone();
        let scheduler = Rc::new(ReminderScheduler::new(registry, Rc::clone(&clock)));
        let tasks = Rc::new(TaskRepository::new(
            Rc::clone(&db),
            Rc::clone(&scheduler),
            Rc::clone(&clock),
        ));
        let goals = Rc::new(GoalRepository::new(Rc::clone(&db)));
        let subtasks = Rc::new(SubTaskRepository::new(Rc::clone(&db)));

        Self {
            get_tasks: GetTasksUseCase::new(Rc::clone(&tasks)),
            get_tasks_by_type: GetTasksByTypeUseCase::new(Rc::clone(&tasks)),
            get_goals: GetGoalsUseCase::new(Rc::clone(&goals)),
            db,
            alarms,
            clock,
            scheduler,
            tasks,
            goals,
            subtasks,
        }
    }
}
