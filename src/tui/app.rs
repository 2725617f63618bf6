use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use ratatui::widgets::ListState;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, warn};

use crate::calendar::CalendarView;
use crate::container::AppContainer;
use crate::database::DatabaseError;
use crate::live::LiveQuery;
use crate::models::{Goal, SubTask, Task, TaskType};
use crate::resource::{Resource, ResourceStream};
use crate::summary::HomeSummary;
use crate::tui::error::TuiError;
use crate::tui::widgets::color::Palette;
use crate::utils::{day_bounds, parse_date, parse_datetime};
use crate::Config;

const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Tasks,
    Goals,
    Calendar,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Home, Tab::Tasks, Tab::Goals, Tab::Calendar];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Tasks => "Tasks",
            Tab::Goals => "Goals",
            Tab::Calendar => "Calendar",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1).min(Tab::ALL.len() - 1)]
    }

    pub fn previous(&self) -> Tab {
        Tab::ALL[self.index().saturating_sub(1)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Help,
    QuickAdd,
    ConfirmDelete,
    EditTask,
}

/// One-time UI notifications, drained once per frame by the event loop.
/// Nothing here survives a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ShowMessage(String),
    ShowError(String),
    Navigate(Tab),
}

#[derive(Debug, Default)]
pub struct UiEvents {
    queue: VecDeque<UiEvent>,
}

impl UiEvents {
    pub fn push(&mut self, event: UiEvent) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<UiEvent> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

#[derive(Debug, Default)]
pub struct StatusState {
    pub message: Option<StatusMessage>,
    pub message_time: Option<Instant>,
}

/// What the confirmation dialog would delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Task(Task),
    Goal(Goal),
    CompletedTasks,
}

impl DeleteTarget {
    pub fn describe(&self) -> String {
        match self {
            DeleteTarget::Task(task) => format!("task \"{}\"", task.title),
            DeleteTarget::Goal(goal) => format!("goal \"{}\" (its tasks are kept)", goal.title),
            DeleteTarget::CompletedTasks => "all completed tasks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickAddTarget {
    Task,
    Goal,
    /// Goal task under the goal selected on the Goals tab
    GoalTask {
        goal_id: i64,
        goal_title: String,
        target_date: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone)]
pub struct QuickAddState {
    pub target: QuickAddTarget,
    pub input: String,
}

/// Task typed on the quick-add line
#[derive(Debug, Clone, PartialEq)]
pub struct QuickTask {
    pub title: String,
    pub due: Option<DateTime<Utc>>,
    pub remind: bool,
}

/// Parse `title [@YYYY-MM-DD [HH:MM]] [!]`.
/// `@` starts the due date; a trailing `!` turns the reminder on.
pub fn parse_quick_add<Tz: chrono::TimeZone>(input: &str, tz: &Tz) -> Result<QuickTask, String> {
    let mut words: Vec<&str> = input.split_whitespace().collect();

    let remind = words.last() == Some(&"!");
    if remind {
        words.pop();
    }

    let mut due = None;
    if let Some(at) = words.iter().position(|w| w.starts_with('@')) {
        let date = words[at].trim_start_matches('@');
        let time = words
            .get(at + 1)
            .filter(|w| NaiveTime::parse_from_str(w, "%H:%M").is_ok());
        let text = match time {
            Some(time) => format!("{} {}", date, time),
            None => {
                parse_date(date).map_err(|e| format!("invalid due date '{}': {}", date, e))?;
                date.to_string()
            }
        };
        due = Some(parse_datetime(&text, tz)?);
        let consumed = if time.is_some() { 2 } else { 1 };
        words.drain(at..at + consumed);
    }

    let title = words.join(" ");
    if title.is_empty() {
        return Err("title is required".to_string());
    }
    Ok(QuickTask { title, due, remind })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    DueDate,
    Reminder,
    ReminderTime,
}

impl TaskField {
    pub fn next(self) -> Self {
        match self {
            TaskField::Title => TaskField::Description,
            TaskField::Description => TaskField::DueDate,
            TaskField::DueDate => TaskField::Reminder,
            TaskField::Reminder => TaskField::ReminderTime,
            TaskField::ReminderTime => TaskField::Title,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            TaskField::Title => TaskField::ReminderTime,
            TaskField::Description => TaskField::Title,
            TaskField::DueDate => TaskField::Description,
            TaskField::Reminder => TaskField::DueDate,
            TaskField::ReminderTime => TaskField::Reminder,
        }
    }
}

const FORM_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Edit form for an existing task. Dates are typed as local `YYYY-MM-DD [HH:MM]`.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub current_field: TaskField,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub remind: bool,
    /// Full date and time, or `HH:MM` on the due day
    pub reminder_time: String,
    editing_task: Task,
}

impl TaskForm {
    pub fn from_task<Tz: TimeZone>(task: &Task, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let show = |dt: DateTime<Utc>| dt.with_timezone(tz).format(FORM_DATETIME_FORMAT).to_string();
        Self {
            current_field: TaskField::Title,
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.map(show).unwrap_or_default(),
            remind: task.has_notification,
            reminder_time: task.notification_time.map(show).unwrap_or_default(),
            editing_task: task.clone(),
        }
    }

    pub fn editing_task_id(&self) -> Option<i64> {
        self.editing_task.id
    }

    /// Text of the focused field; the reminder switch has none
    fn active_text(&mut self) -> Option<&mut String> {
        match self.current_field {
            TaskField::Title => Some(&mut self.title),
            TaskField::Description => Some(&mut self.description),
            TaskField::DueDate => Some(&mut self.due_date),
            TaskField::ReminderTime => Some(&mut self.reminder_time),
            TaskField::Reminder => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.current_field == TaskField::Reminder {
            if c == ' ' {
                self.remind = !self.remind;
            }
            return;
        }
        if let Some(text) = self.active_text() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.active_text() {
            text.pop();
        }
    }

    /// The edited task, or a message naming the field that did not parse
    pub fn to_task<Tz: TimeZone>(&self, tz: &Tz) -> Result<Task, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let due_date = match self.due_date.trim() {
            "" => None,
            text => Some(parse_datetime(text, tz).map_err(|e| format!("Due date: {}", e))?),
        };
        let notification_time = match self.reminder_time.trim() {
            "" => None,
            text => Some(self.parse_reminder_time(text, due_date, tz)?),
        };
        Ok(Task {
            title: title.to_string(),
            description: self.description.clone(),
            due_date,
            has_notification: self.remind,
            notification_time,
            ..self.editing_task.clone()
        })
    }

    fn parse_reminder_time<Tz: TimeZone>(
        &self,
        text: &str,
        due_date: Option<DateTime<Utc>>,
        tz: &Tz,
    ) -> Result<DateTime<Utc>, String> {
        let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M") else {
            return parse_datetime(text, tz).map_err(|e| format!("Reminder time: {}", e));
        };
        let due = due_date.ok_or_else(|| "Reminder time: HH:MM needs a due date".to_string())?;
        let day = due.with_timezone(tz).date_naive();
        parse_datetime(&format!("{} {}", day, time.format("%H:%M")), tz).map_err(|e| format!("Reminder time: {}", e))
    }
}

pub struct App {
    pub config: Config,
    pub palette: Palette,
    pub container: AppContainer,

    pub current_tab: Tab,
    pub mode: Mode,
    pub task_filter: Option<TaskType>,

    pub tasks: Resource<Vec<Task>>,
    pub goals: Resource<Vec<Goal>>,
    pub summary: Resource<HomeSummary>,
    pub calendar: CalendarView,
    /// Checklist of the selected task
    pub subtasks: Vec<SubTask>,

    pub task_list_state: ListState,
    pub goal_list_state: ListState,
    pub agenda_list_state: ListState,

    pub quick_add: Option<QuickAddState>,
    pub task_form: Option<TaskForm>,
    pub pending_delete: Option<DeleteTarget>,
    /// 0 = Delete, 1 = Cancel
    pub delete_modal_selection: usize,

    pub events: UiEvents,
    pub status: StatusState,

    tasks_stream: ResourceStream<Vec<Task>>,
    goals_stream: ResourceStream<Vec<Goal>>,
    summary_query: LiveQuery<HomeSummary>,
    subtask_query: Option<(i64, LiveQuery<Vec<SubTask>>)>,
}

impl App {
    pub fn new(config: Config, container: AppContainer) -> Result<Self, TuiError> {
        let palette = Palette::from_theme(&config.get_active_theme());
        let tasks_stream = container.get_tasks.execute();
        let goals_stream = container.get_goals.execute();
        let summary_query = HomeSummary::live(container.db.clone());
        let calendar = CalendarView::new(container.tasks.clone(), Local::now().date_naive());

        let mut app = Self {
            config,
            palette,
            container,
            current_tab: Tab::Home,
            mode: Mode::View,
            task_filter: None,
            tasks: Resource::Loading,
            goals: Resource::Loading,
            summary: Resource::Loading,
            calendar,
            subtasks: Vec::new(),
            task_list_state: ListState::default(),
            goal_list_state: ListState::default(),
            agenda_list_state: ListState::default(),
            quick_add: None,
            task_form: None,
            pending_delete: None,
            delete_modal_selection: 0,
            events: UiEvents::default(),
            status: StatusState::default(),
            tasks_stream,
            goals_stream,
            summary_query,
            subtask_query: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Pull every live query that saw a change since the last frame
    pub fn refresh(&mut self) -> Result<(), TuiError> {
        while let Some(state) = self.tasks_stream.next_state() {
            if let Resource::Error { message } = &state {
                self.events.push(UiEvent::ShowError(message.clone()));
            }
            self.tasks = state;
        }
        while let Some(state) = self.goals_stream.next_state() {
            if let Resource::Error { message } = &state {
                self.events.push(UiEvent::ShowError(message.clone()));
            }
            self.goals = state;
        }
        if let Some(result) = self.summary_query.poll() {
            self.summary = Resource::from(result);
        }
        if let Err(e) = self.calendar.refresh() {
            self.events.push(UiEvent::ShowError(e.to_string()));
        }
        self.clamp_selections();
        self.refresh_subtasks();
        Ok(())
    }

    fn refresh_subtasks(&mut self) {
        let selected = self.selected_task().and_then(|t| t.id);
        let current = self.subtask_query.as_ref().map(|(id, _)| *id);
        if selected != current {
            self.subtasks.clear();
            self.subtask_query = selected.map(|id| (id, self.container.subtasks.subtasks(id)));
        }
        let Some((_, query)) = self.subtask_query.as_mut() else {
            return;
        };
        match query.poll() {
            Some(Ok(subtasks)) => self.subtasks = subtasks,
            Some(Err(e)) => self.events.push(UiEvent::ShowError(e.to_string())),
            None => {}
        }
    }

    /// Title of the goal a task belongs to, when the goals list has it
    pub fn goal_title(&self, goal_id: Option<i64>) -> Option<&str> {
        let goal_id = goal_id?;
        self.visible_goals()
            .iter()
            .find(|g| g.id == Some(goal_id))
            .map(|g| g.title.as_str())
    }

    /// Apply queued UI events
    pub fn process_events(&mut self) {
        while let Some(event) = self.events.pop() {
            match event {
                UiEvent::ShowMessage(text) => self.set_status(StatusMessage::Info(text)),
                UiEvent::ShowError(text) => {
                    warn!(error = %text, "shown to user");
                    self.set_status(StatusMessage::Error(text));
                }
                UiEvent::Navigate(tab) => self.switch_tab(tab),
            }
        }
    }

    fn set_status(&mut self, message: StatusMessage) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.status.message = None;
                self.status.message_time = None;
            }
        }
    }

    /// Queue the error of a failed write; pass the value through otherwise
    fn report<T>(&mut self, result: Result<T, DatabaseError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.events.push(UiEvent::ShowError(e.to_string()));
                None
            }
        }
    }

    fn notify(&mut self, message: &str) {
        self.events.push(UiEvent::ShowMessage(message.to_string()));
    }

    // ===== Lists =====

    pub fn visible_tasks(&self) -> &[Task] {
        self.tasks.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible_goals(&self) -> &[Goal] {
        self.goals.data().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Agenda of the selected calendar day, to-do first
    pub fn agenda_tasks(&self) -> Vec<&Task> {
        let agenda = self.calendar.agenda();
        agenda.todo.iter().chain(agenda.completed.iter()).collect()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        match self.current_tab {
            Tab::Tasks => self.task_list_state.selected().and_then(|i| self.visible_tasks().get(i)),
            Tab::Calendar => self
                .agenda_list_state
                .selected()
                .and_then(|i| self.agenda_tasks().get(i).copied()),
            _ => None,
        }
    }

    pub fn selected_goal(&self) -> Option<&Goal> {
        if self.current_tab != Tab::Goals {
            return None;
        }
        self.goal_list_state.selected().and_then(|i| self.visible_goals().get(i))
    }

    fn clamp_selections(&mut self) {
        let task_len = self.visible_tasks().len();
        clamp(&mut self.task_list_state, task_len);
        let goal_len = self.visible_goals().len();
        clamp(&mut self.goal_list_state, goal_len);
        let agenda_len = self.agenda_tasks().len();
        clamp(&mut self.agenda_list_state, agenda_len);
    }

    fn current_list(&mut self) -> Option<(&mut ListState, usize)> {
        match self.current_tab {
            Tab::Tasks => {
                let len = self.visible_tasks().len();
                Some((&mut self.task_list_state, len))
            }
            Tab::Goals => {
                let len = self.visible_goals().len();
                Some((&mut self.goal_list_state, len))
            }
            Tab::Calendar => {
                let len = self.agenda_tasks().len();
                Some((&mut self.agenda_list_state, len))
            }
            Tab::Home => None,
        }
    }

    pub fn move_selection_up(&mut self) {
        if let Some((state, len)) = self.current_list() {
            if len > 0 {
                let i = state.selected().unwrap_or(0);
                state.select(Some(i.saturating_sub(1)));
            }
        }
    }

    pub fn move_selection_down(&mut self) {
        if let Some((state, len)) = self.current_list() {
            if len > 0 {
                let i = state.selected().map(|i| i + 1).unwrap_or(0);
                state.select(Some(i.min(len - 1)));
            }
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.clamp_selections();
    }

    /// Cycle All → Daily → Quick → Goal → All and rebuild the task stream
    pub fn cycle_task_filter(&mut self) {
        self.task_filter = match self.task_filter {
            None => Some(TaskType::Daily),
            Some(TaskType::Daily) => Some(TaskType::Quick),
            Some(TaskType::Quick) => Some(TaskType::Goal),
            Some(TaskType::Goal) => None,
        };
        self.tasks_stream = match self.task_filter {
            Some(task_type) => self.container.get_tasks_by_type.execute(task_type),
            None => self.container.get_tasks.execute(),
        };
        self.task_list_state.select(Some(0));
        debug!(filter = ?self.task_filter, "task filter changed");
    }

    pub fn filter_label(&self) -> &'static str {
        match self.task_filter {
            None => "All",
            Some(TaskType::Daily) => "Daily",
            Some(TaskType::Quick) => "Quick",
            Some(TaskType::Goal) => "Goal",
        }
    }

    // ===== Actions =====

    pub fn toggle_selected(&mut self) {
        if self.current_tab == Tab::Goals {
            if let Some(id) = self.selected_goal().and_then(|g| g.id) {
                let result = self.container.goals.toggle_goal_completion(id);
                if let Some(Some(goal)) = self.report(result) {
                    let msg = if goal.is_completed { "Goal completed" } else { "Goal reopened" };
                    self.notify(msg);
                }
            }
            return;
        }
        if let Some(id) = self.selected_task().and_then(|t| t.id) {
            let result = self.container.tasks.toggle_task_completion(id);
            if let Some(Some(task)) = self.report(result) {
                let msg = if task.is_completed { "Task marked as done" } else { "Task marked as todo" };
                self.notify(msg);
            }
        }
    }

    pub fn request_delete(&mut self) {
        let target = match self.current_tab {
            Tab::Goals => self.selected_goal().cloned().map(DeleteTarget::Goal),
            _ => self.selected_task().cloned().map(DeleteTarget::Task),
        };
        if let Some(target) = target {
            self.open_delete_confirmation(target);
        }
    }

    pub fn request_clear_completed(&mut self) {
        self.open_delete_confirmation(DeleteTarget::CompletedTasks);
    }

    fn open_delete_confirmation(&mut self, target: DeleteTarget) {
        self.pending_delete = Some(target);
        self.delete_modal_selection = 1;
        self.mode = Mode::ConfirmDelete;
    }

    pub fn confirm_delete(&mut self) {
        let target = self.pending_delete.take();
        self.mode = Mode::View;
        if self.delete_modal_selection != 0 {
            return;
        }
        match target {
            Some(DeleteTarget::Task(task)) => {
                let result = self.container.tasks.delete_task(&task);
                if self.report(result).is_some() {
                    self.notify("Task deleted");
                }
            }
            Some(DeleteTarget::Goal(goal)) => {
                if let Some(id) = goal.id {
                    let result = self.container.goals.delete_goal(id);
                    if self.report(result).is_some() {
                        self.notify("Goal deleted");
                    }
                }
            }
            Some(DeleteTarget::CompletedTasks) => {
                let result = self.container.tasks.delete_completed_tasks();
                if let Some(count) = self.report(result) {
                    self.notify(&format!("Deleted {} completed task(s)", count));
                }
            }
            None => {}
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.mode = Mode::View;
    }

    pub fn start_quick_add(&mut self) {
        let target = match self.current_tab {
            Tab::Goals => QuickAddTarget::Goal,
            Tab::Tasks if self.task_filter == Some(TaskType::Goal) => {
                self.events.push(UiEvent::ShowError(
                    "Goal tasks are added from the Goals tab".to_string(),
                ));
                return;
            }
            _ => QuickAddTarget::Task,
        };
        self.open_quick_add(target);
    }

    /// Quick add a task under the selected goal
    pub fn start_goal_task(&mut self) {
        let Some(goal) = self.selected_goal() else {
            return;
        };
        let Some(goal_id) = goal.id else {
            return;
        };
        let target = QuickAddTarget::GoalTask {
            goal_id,
            goal_title: goal.title.clone(),
            target_date: goal.target_date,
        };
        self.open_quick_add(target);
    }

    fn open_quick_add(&mut self, target: QuickAddTarget) {
        self.quick_add = Some(QuickAddState {
            target,
            input: String::new(),
        });
        self.mode = Mode::QuickAdd;
    }

    pub fn cancel_quick_add(&mut self) {
        self.quick_add = None;
        self.mode = Mode::View;
    }

    pub fn submit_quick_add(&mut self) {
        let Some(state) = self.quick_add.take() else {
            self.mode = Mode::View;
            return;
        };
        self.mode = Mode::View;

        match state.target {
            QuickAddTarget::Goal => {
                let title = state.input.trim();
                if title.is_empty() {
                    self.events.push(UiEvent::ShowError("Goal title is required".to_string()));
                    return;
                }
                let mut goal = Goal::new(title.to_string());
                goal.start_date = Some(Local::now().date_naive());
                let result = self.container.goals.add_goal(&goal);
                if self.report(result).is_some() {
                    self.notify("Goal created");
                }
            }
            QuickAddTarget::Task => {
                let parsed = match parse_quick_add(&state.input, &Local) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        self.events.push(UiEvent::ShowError(e));
                        return;
                    }
                };
                let mut task = Task::new(parsed.title);
                task.task_type = match self.task_filter {
                    Some(TaskType::Goal) | None => TaskType::Quick,
                    Some(task_type) => task_type,
                };
                task.has_notification = parsed.remind;
                task.due_date = match (parsed.due, self.current_tab) {
                    (Some(due), _) => Some(due),
                    // Added from the calendar: due at the start of the selected day
                    (None, Tab::Calendar) => Some(day_bounds(self.calendar.selected(), &Local).0),
                    (None, _) => None,
                };
                let result = self.container.tasks.add_task(&task);
                if self.report(result).is_some() {
                    self.notify("Task added");
                }
            }
            QuickAddTarget::GoalTask { goal_id, target_date, .. } => {
                let parsed = match parse_quick_add(&state.input, &Local) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        self.events.push(UiEvent::ShowError(e));
                        return;
                    }
                };
                let mut task = Task::for_goal(parsed.title, goal_id, target_date, &Local);
                if parsed.due.is_some() {
                    task.due_date = parsed.due;
                }
                task.has_notification = parsed.remind;
                let result = self.container.tasks.add_task(&task);
                if self.report(result).is_some() {
                    self.notify("Task added to goal");
                }
            }
        }
    }

    pub fn start_edit(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.task_form = Some(TaskForm::from_task(task, &Local));
        self.mode = Mode::EditTask;
    }

    pub fn cancel_edit(&mut self) {
        self.task_form = None;
        self.mode = Mode::View;
    }

    /// Save the form. A field that does not parse keeps the form open.
    pub fn submit_edit(&mut self) {
        let Some(form) = self.task_form.as_ref() else {
            self.mode = Mode::View;
            return;
        };
        let task = match form.to_task(&Local) {
            Ok(task) => task,
            Err(e) => {
                self.events.push(UiEvent::ShowError(e));
                return;
            }
        };
        self.task_form = None;
        self.mode = Mode::View;
        let result = self.container.tasks.update_task(&task);
        if self.report(result).is_some() {
            self.notify("Task saved");
        }
    }

    pub fn key_hints(&self) -> Vec<String> {
        let kb = &self.config.key_bindings;
        let fmt = crate::utils::format_key_binding_for_display;
        let mut hints = vec![format!("{}: Quit", fmt(&kb.quit)), format!("{}: Help", fmt(&kb.help))];
        match self.current_tab {
            Tab::Home => {}
            Tab::Tasks => {
                hints.push(format!("{}: New", fmt(&kb.new)));
                hints.push(format!("{}: Edit", fmt(&kb.edit)));
                hints.push(format!("{}: Done", fmt(&kb.toggle_task_status)));
                hints.push(format!("{}: Delete", fmt(&kb.delete)));
                hints.push(format!("{}: Filter ({})", fmt(&kb.filter), self.filter_label()));
                hints.push(format!("{}: Clear completed", fmt(&kb.clear_completed)));
            }
            Tab::Goals => {
                hints.push(format!("{}: New goal", fmt(&kb.new)));
                hints.push(format!("{}: Add task", fmt(&kb.add_to_goal)));
                hints.push(format!("{}: Complete", fmt(&kb.toggle_task_status)));
                hints.push(format!("{}: Delete", fmt(&kb.delete)));
            }
            Tab::Calendar => {
                hints.push("h/l: Day".to_string());
                hints.push("</>: Period".to_string());
                hints.push(format!("{}: Month/Week", fmt(&kb.toggle_calendar_mode)));
                hints.push(format!("{}: New", fmt(&kb.new)));
                hints.push(format!("{}: Edit", fmt(&kb.edit)));
                hints.push(format!("{}: Done", fmt(&kb.toggle_task_status)));
            }
        }
        hints
    }
}

fn clamp(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        let i = state.selected().unwrap_or(0).min(len - 1);
        state.select(Some(i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn quick_add_reads_due_date_and_reminder() {
        let parsed = parse_quick_add("Call mom @2025-06-01 18:30 !", &Utc).unwrap();
        assert_eq!(parsed.title, "Call mom");
        assert_eq!(parsed.due, Some(Utc.with_ymd_and_hms(2025, 6, 1, 18, 30, 0).unwrap()));
        assert!(parsed.remind);
    }

    #[test]
    fn quick_add_date_only_and_plain_title() {
        let parsed = parse_quick_add("Pay rent @2025-06-01", &Utc).unwrap();
        assert_eq!(parsed.due, Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
        assert!(!parsed.remind);

        let plain = parse_quick_add("  water plants  ", &Utc).unwrap();
        assert_eq!(plain.title, "water plants");
        assert_eq!(plain.due, None);
    }

    #[test]
    fn quick_add_rejects_bad_input() {
        assert!(parse_quick_add("   ", &Utc).is_err());
        assert!(parse_quick_add("!", &Utc).is_err());
        assert!(parse_quick_add("thing @tomorrow", &Utc).is_err());
    }

    fn sample_task() -> Task {
        let mut task = Task::new("Dentist".to_string());
        task.id = Some(4);
        task.due_date = Some(Utc.with_ymd_and_hms(2030, 3, 1, 9, 0, 0).unwrap());
        task
    }

    #[test]
    fn form_shows_the_task_and_writes_edits_back() {
        let mut form = TaskForm::from_task(&sample_task(), &Utc);
        assert_eq!(form.due_date, "2030-03-01 09:00");
        assert_eq!(form.reminder_time, "");

        form.title.push_str(" checkup");
        form.current_field = TaskField::Reminder;
        form.input_char('x');
        form.input_char(' ');
        form.current_field = TaskField::ReminderTime;
        for c in "08:30".chars() {
            form.input_char(c);
        }

        let task = form.to_task(&Utc).unwrap();
        assert_eq!(task.id, Some(4));
        assert_eq!(task.title, "Dentist checkup");
        assert!(task.has_notification);
        assert_eq!(task.notification_time, Some(Utc.with_ymd_and_hms(2030, 3, 1, 8, 30, 0).unwrap()));
    }

    #[test]
    fn form_clears_dates_and_rejects_bad_ones() {
        let mut form = TaskForm::from_task(&sample_task(), &Utc);
        form.current_field = TaskField::DueDate;
        while !form.due_date.is_empty() {
            form.backspace();
        }
        assert_eq!(form.to_task(&Utc).unwrap().due_date, None);

        form.reminder_time = "07:00".to_string();
        assert!(form.to_task(&Utc).unwrap_err().contains("needs a due date"));

        form.reminder_time.clear();
        form.due_date = "soon".to_string();
        assert!(form.to_task(&Utc).unwrap_err().starts_with("Due date"));

        form.due_date.clear();
        form.title = "  ".to_string();
        assert!(form.to_task(&Utc).is_err());
    }

    #[test]
    fn form_fields_cycle_both_ways() {
        assert_eq!(TaskField::ReminderTime.next(), TaskField::Title);
        assert_eq!(TaskField::Title.previous(), TaskField::ReminderTime);
        assert_eq!(TaskField::Description.next().previous(), TaskField::Description);
    }

    #[test]
    fn tabs_stop_at_the_ends() {
        assert_eq!(Tab::Home.previous(), Tab::Home);
        assert_eq!(Tab::Home.next(), Tab::Tasks);
        assert_eq!(Tab::Calendar.next(), Tab::Calendar);
    }
}
