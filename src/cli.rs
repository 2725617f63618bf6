use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use thiserror::Error;

use crate::calendar::{count_by_day, visible_days, Agenda, CalendarMode};
use crate::config::{Config, ConfigError, SETTING_KEYS};
use crate::container::AppContainer;
use crate::database::DatabaseError;
use crate::models::{Goal, Task, TaskType};
use crate::reminder::dispatcher::decode_payload;
use crate::reminder::{AlarmError, AlarmRunner, Notifier, SqliteAlarmRegistry};
use crate::summary::HomeSummary;
use crate::utils::{day_bounds, parse_date, parse_datetime};

#[derive(Parser)]
#[command(name = "goaldo")]
#[command(about = "Goals, daily and quick tasks with local reminders, in the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a new task
    AddTask(AddTaskArgs),
    /// Change a task; its reminder is rescheduled from the new values
    Edit(EditTaskArgs),
    /// Add a new goal
    AddGoal {
        /// Goal title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Start date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        start: Option<String>,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target: Option<String>,
    },
    /// List tasks
    List {
        /// Only tasks of this type (daily, quick, goal)
        #[arg(long = "type")]
        task_type: Option<TaskType>,
        /// Only tasks linked to this goal
        #[arg(long)]
        goal: Option<i64>,
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,
        /// Only pending tasks
        #[arg(long)]
        pending: bool,
    },
    /// Toggle a task between done and not done
    Done {
        id: i64,
    },
    /// Delete a task, or every completed task
    Delete {
        #[arg(required_unless_present = "completed")]
        id: Option<i64>,
        /// Delete all completed tasks instead
        #[arg(long, conflicts_with = "id")]
        completed: bool,
    },
    /// List goals with their progress
    Goals,
    /// Delete a goal; its tasks are kept
    DeleteGoal {
        id: i64,
    },
    /// Show the calendar and the agenda of a day
    Calendar {
        /// Day to show (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<String>,
        /// Show only the week of that day
        #[arg(long)]
        week: bool,
    },
    /// Inspect and deliver scheduled reminders
    Reminders {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Args)]
pub struct AddTaskArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// daily, quick or goal; quick when omitted, goal with --goal
    #[arg(long = "type")]
    pub task_type: Option<TaskType>,
    /// Due date or date and time (YYYY-MM-DD[ HH:MM]); a goal task defaults to the goal's target date
    #[arg(long)]
    pub due: Option<String>,
    /// Goal the task contributes to
    #[arg(long)]
    pub goal: Option<i64>,
    /// Turn on a reminder (five minutes before the due time unless --remind-at is given)
    #[arg(long)]
    pub remind: bool,
    /// Exact reminder time (YYYY-MM-DD HH:MM); implies --remind
    #[arg(long)]
    pub remind_at: Option<String>,
    /// Repeat interval in minutes, stored with the task
    #[arg(long)]
    pub repeat: Option<i64>,
}

#[derive(Args)]
pub struct EditTaskArgs {
    /// Task ID
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// New due date or date and time (YYYY-MM-DD[ HH:MM])
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    /// Turn the reminder on
    #[arg(long, conflicts_with = "no_remind")]
    pub remind: bool,
    /// Turn the reminder off
    #[arg(long)]
    pub no_remind: bool,
    /// Exact reminder time (YYYY-MM-DD HH:MM); implies --remind
    #[arg(long, conflicts_with_all = ["clear_remind_at", "no_remind"])]
    pub remind_at: Option<String>,
    /// Go back to reminding five minutes before the due time
    #[arg(long)]
    pub clear_remind_at: bool,
    /// Repeat interval in minutes
    #[arg(long)]
    pub repeat: Option<i64>,
}

#[derive(Subcommand)]
pub enum ReminderCommands {
    /// List registered reminders
    List,
    /// Deliver every reminder that is due now, once
    Fire,
    /// Keep delivering reminders as they come due
    Watch,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print the current settings
    Show,
    /// Change a setting
    Set {
        key: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Alarm store error: {0}")]
    AlarmError(#[from] AlarmError),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Output error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn parse_instant(input: &str) -> Result<DateTime<Utc>, CliError> {
    parse_datetime(input, &Local).map_err(CliError::DateParseError)
}

fn parse_day(input: &str) -> Result<NaiveDate, CliError> {
    parse_date(input).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", input, e)))
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "[{}] #{} {:<5} {}",
        if task.is_completed { "x" } else { " " },
        task.id.unwrap_or_default(),
        task.task_type.label(),
        task.title
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", format_instant(due)));
    }
    if task.has_notification {
        match task.notification_time {
            Some(at) => line.push_str(&format!("  reminder {}", format_instant(at))),
            None => line.push_str("  reminder"),
        }
    }
    line
}

/// Task type for add-task; `--goal` makes a goal task and nothing else
fn resolve_task_type(requested: Option<TaskType>, goal: Option<i64>) -> Result<TaskType, CliError> {
    match (requested, goal) {
        (None | Some(TaskType::Goal), Some(_)) => Ok(TaskType::Goal),
        (Some(other), Some(_)) => Err(CliError::InvalidArgument(format!(
            "--goal only applies to goal tasks, not {} tasks",
            other.label()
        ))),
        (Some(TaskType::Goal), None) => Err(CliError::InvalidArgument("goal tasks need --goal <id>".to_string())),
        (requested, None) => Ok(requested.unwrap_or(TaskType::Quick)),
    }
}

/// Handle the add-task command
pub fn handle_add_task(args: AddTaskArgs, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    let task_type = resolve_task_type(args.task_type, args.goal)?;

    let mut task = match args.goal {
        Some(goal_id) => {
            let goal = container
                .goals
                .get_goal(goal_id)?
                .ok_or_else(|| CliError::NotFound(format!("Goal {}", goal_id)))?;
            Task::for_goal(args.title, goal_id, goal.target_date, &Local)
        }
        None => Task::new(args.title),
    };
    task.task_type = task_type;
    task.description = args.description.unwrap_or_default();
    if let Some(due) = args.due.as_deref() {
        task.due_date = Some(parse_instant(due)?);
    }
    task.notification_time = args.remind_at.as_deref().map(parse_instant).transpose()?;
    task.has_notification = args.remind || task.notification_time.is_some();
    task.repeat_interval_minutes = args.repeat;

    let id = container.tasks.add_task(&task)?;
    writeln!(out, "Task created successfully (ID: {})", id)?;
    write_reminder_status(id, &task, container, out)
}

/// Handle the edit command. Only the given fields change.
pub fn handle_edit_task(args: EditTaskArgs, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    let id = args.id;
    let mut task = container
        .tasks
        .get_task(id)?
        .ok_or_else(|| CliError::NotFound(format!("Task {}", id)))?;

    if let Some(title) = args.title {
        if title.trim().is_empty() {
            return Err(CliError::InvalidArgument("title cannot be empty".to_string()));
        }
        task.title = title.trim().to_string();
    }
    if let Some(description) = args.description {
        task.description = description;
    }
    if args.clear_due {
        task.due_date = None;
    } else if let Some(due) = args.due.as_deref() {
        task.due_date = Some(parse_instant(due)?);
    }
    if args.clear_remind_at {
        task.notification_time = None;
    } else if let Some(at) = args.remind_at.as_deref() {
        task.notification_time = Some(parse_instant(at)?);
        task.has_notification = true;
    }
    if args.remind {
        task.has_notification = true;
    } else if args.no_remind {
        task.has_notification = false;
    }
    if let Some(repeat) = args.repeat {
        task.repeat_interval_minutes = Some(repeat);
    }

    container.tasks.update_task(&task)?;
    writeln!(out, "Task {} updated", id)?;
    write_reminder_status(id, &task, container, out)
}

fn write_reminder_status(id: i64, task: &Task, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    if !task.has_notification {
        return Ok(());
    }
    match container.alarms.get(id)? {
        Some(alarm) => writeln!(out, "Reminder set for {}", format_instant(alarm.trigger_at))?,
        None => writeln!(out, "No reminder scheduled (time already passed, missing or not allowed)")?,
    }
    Ok(())
}

/// Handle the add-goal command
pub fn handle_add_goal(
    title: String,
    description: Option<String>,
    start: Option<String>,
    target: Option<String>,
    container: &AppContainer,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut goal = Goal::new(title);
    goal.description = description;
    goal.start_date = Some(match start {
        Some(s) => parse_day(&s)?,
        None => Local::now().date_naive(),
    });
    goal.target_date = target.as_deref().map(parse_day).transpose()?;

    let id = container.goals.add_goal(&goal)?;
    writeln!(out, "Goal created successfully (ID: {})", id)?;
    Ok(())
}

pub fn handle_list(
    task_type: Option<TaskType>,
    goal: Option<i64>,
    completed: bool,
    pending: bool,
    container: &AppContainer,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let db = &container.db;
    let mut tasks = match (goal, task_type) {
        (Some(goal_id), _) => db.get_tasks_by_goal(goal_id)?,
        (None, Some(t)) => db.get_tasks_by_type(t)?,
        (None, None) if completed => db.get_tasks_by_completion(true)?,
        (None, None) if pending => db.get_tasks_by_completion(false)?,
        (None, None) => db.get_all_tasks()?,
    };
    if let (Some(t), Some(_)) = (task_type, goal) {
        tasks.retain(|task| task.task_type == t);
    }
    if completed {
        tasks.retain(|task| task.is_completed);
    } else if pending {
        tasks.retain(|task| !task.is_completed);
    }

    if tasks.is_empty() {
        writeln!(out, "No tasks")?;
    }
    for task in &tasks {
        writeln!(out, "{}", format_task_line(task))?;
    }
    Ok(())
}

/// Handle the done command: flips completion and reschedules or cancels the reminder
pub fn handle_done(id: i64, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    let task = container
        .tasks
        .toggle_task_completion(id)?
        .ok_or_else(|| CliError::NotFound(format!("Task {}", id)))?;
    let state = if task.is_completed { "done" } else { "not done" };
    writeln!(out, "Task {} marked {}", id, state)?;
    Ok(())
}

pub fn handle_delete(id: Option<i64>, completed: bool, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    if completed {
        let count = container.tasks.delete_completed_tasks()?;
        writeln!(out, "Deleted {} completed task(s)", count)?;
        return Ok(());
    }
    let Some(id) = id else {
        return Ok(());
    };
    if !container.tasks.delete_task_by_id(id)? {
        return Err(CliError::NotFound(format!("Task {}", id)));
    }
    writeln!(out, "Task {} deleted", id)?;
    Ok(())
}

pub fn handle_goals(container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    let summary = HomeSummary::load(&container.db)?;
    writeln!(
        out,
        "Daily tasks: {}/{}   Quick tasks: {}/{}",
        summary.daily_completed, summary.daily_total, summary.quick_completed, summary.quick_total
    )?;
    if summary.goals.is_empty() {
        writeln!(out, "No goals")?;
    }
    for progress in &summary.goals {
        let goal = &progress.goal;
        let mut line = format!(
            "[{}] #{} {}  {}/{} ({}%)",
            if goal.is_completed { "x" } else { " " },
            goal.id.unwrap_or_default(),
            goal.title,
            progress.completed_tasks,
            progress.total_tasks,
            progress.percent()
        );
        if let Some(target) = goal.target_date {
            line.push_str(&format!("  target {}", target));
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

pub fn handle_delete_goal(id: i64, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    if !container.goals.delete_goal(id)? {
        return Err(CliError::NotFound(format!("Goal {}", id)));
    }
    writeln!(out, "Goal {} deleted, its tasks were kept", id)?;
    Ok(())
}

pub fn handle_calendar(date: Option<String>, week: bool, container: &AppContainer, out: &mut impl Write) -> Result<(), CliError> {
    let selected = match date {
        Some(d) => parse_day(&d)?,
        None => Local::now().date_naive(),
    };
    let mode = if week { CalendarMode::Week } else { CalendarMode::Month };
    let days = visible_days(selected, mode);
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Ok(());
    };

    let (start, _) = day_bounds(*first, &Local);
    let (_, end) = day_bounds(*last, &Local);
    let counts = count_by_day(&container.db.get_tasks_by_due_range(start, end)?, &Local);

    writeln!(out, "{}", selected.format("%B %Y"))?;
    writeln!(out, "  Mo    Tu    We    Th    Fr    Sa    Su")?;
    for chunk in days.chunks(7) {
        let row: Vec<String> = chunk
            .iter()
            .map(|day| {
                let marker = if *day == selected { '>' } else { ' ' };
                let tasks = counts.get(day).map(|c| format!("{}", c.total)).unwrap_or_default();
                format!("{}{}{:<3}", marker, day.format("%d"), tasks)
            })
            .collect();
        writeln!(out, "{}", row.join(""))?;
    }

    let (day_start, day_end) = day_bounds(selected, &Local);
    let agenda = Agenda::from_tasks(container.db.get_tasks_by_due_range(day_start, day_end)?);
    writeln!(out)?;
    writeln!(out, "Agenda for {}", selected)?;
    if agenda.is_empty() {
        writeln!(out, "  Nothing due")?;
    }
    for task in agenda.todo.iter().chain(agenda.completed.iter()) {
        writeln!(out, "  {}", format_task_line(task))?;
    }
    Ok(())
}

pub fn handle_reminders_list(alarms: &SqliteAlarmRegistry, out: &mut impl Write) -> Result<(), CliError> {
    let pending = alarms.pending()?;
    if pending.is_empty() {
        writeln!(out, "No reminders scheduled")?;
    }
    for alarm in pending {
        writeln!(
            out,
            "#{}  {}  {}",
            alarm.key,
            format_instant(alarm.trigger_at),
            decode_payload(&alarm.payload)
                .map(|payload| payload.title)
                .unwrap_or_else(|| "(unreadable payload)".to_string())
        )?;
    }
    Ok(())
}

pub fn handle_reminders_fire<N: Notifier>(runner: &AlarmRunner<N>, out: &mut impl Write) -> Result<(), CliError> {
    let posted = runner.fire_due()?;
    writeln!(out, "Delivered {} reminder(s)", posted)?;
    Ok(())
}

pub fn handle_settings_show(config: &Config, out: &mut impl Write) -> Result<(), CliError> {
    for (key, value) in config.settings() {
        writeln!(out, "{:<20} {}", key, value)?;
    }
    writeln!(out, "{:<20} {}", "available themes", config.get_available_themes().join(", "))?;
    Ok(())
}

/// Change a setting and write the config file back
pub fn handle_settings_set(
    key: &str,
    value: &str,
    config: &mut Config,
    config_path: &std::path::Path,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !SETTING_KEYS.contains(&key) {
        return Err(ConfigError::UnknownSetting(format!("{} (expected one of: {})", key, SETTING_KEYS.join(", "))).into());
    }
    config.set_value(key, value)?;
    config.save_to_path(config_path)?;
    writeln!(out, "{} = {}", key, value)?;
    Ok(())
}
