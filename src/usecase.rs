//! Read use-cases: repository live queries exposed as `Resource` streams.

use std::rc::Rc;

use crate::models::{Goal, Task, TaskType};
use crate::repository::{GoalRepository, TaskRepository};
use crate::resource::ResourceStream;

pub struct GetTasksUseCase {
    tasks: Rc<TaskRepository>,
}

impl GetTasksUseCase {
    pub fn new(tasks: Rc<TaskRepository>) -> Self {
        Self { tasks }
    }

    pub fn execute(&self) -> ResourceStream<Vec<Task>> {
        ResourceStream::new(self.tasks.tasks())
    }
}

pub struct GetTasksByTypeUseCase {
    tasks: Rc<TaskRepository>,
}

impl GetTasksByTypeUseCase {
    pub fn new(tasks: Rc<TaskRepository>) -> Self {
        Self { tasks }
    }

    pub fn execute(&self, task_type: TaskType) -> ResourceStream<Vec<Task>> {
        ResourceStream::new(self.tasks.tasks_by_type(task_type))
    }
}

pub struct GetGoalsUseCase {
    goals: Rc<GoalRepository>,
}

impl GetGoalsUseCase {
    pub fn new(goals: Rc<GoalRepository>) -> Self {
        Self { goals }
    }

    pub fn execute(&self) -> ResourceStream<Vec<Goal>> {
        ResourceStream::new(self.goals.goals())
    }
}
