mod goal;
mod subtask;
mod task;

pub use goal::GoalRepository;
pub use subtask::SubTaskRepository;
pub use task::TaskRepository;
