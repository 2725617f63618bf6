pub mod calendar;
pub mod cli;
pub mod config;
pub mod container;
pub mod database;
pub mod live;
pub mod logging;
pub mod models;
pub mod reminder;
pub mod repository;
pub mod resource;
pub mod summary;
pub mod tui;
pub mod usecase;
pub mod utils;

pub use config::Config;
pub use container::AppContainer;
pub use database::Database;
pub use models::{Goal, SubTask, Task, TaskType};
pub use utils::Profile;
