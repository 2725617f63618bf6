mod common;

use common::{fixed_now, FixedClock};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use goaldo::calendar::CalendarMode;
use goaldo::reminder::SqliteAlarmRegistry;
use chrono::{Local, NaiveDate};
use goaldo::tui::app::{QuickAddTarget, StatusMessage, TaskField};
use goaldo::tui::{handle_key_event, App, Layout, Mode, Tab, UiEvent};
use goaldo::utils::{day_bounds, parse_datetime};
use goaldo::{AppContainer, Config, Database, Goal, TaskType};
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::rc::Rc;

fn app() -> App {
    let container = AppContainer::new(
        Rc::new(Database::open_in_memory().unwrap()),
        Rc::new(SqliteAlarmRegistry::open_in_memory(true).unwrap()),
        Rc::new(FixedClock::new(fixed_now())),
    );
    App::new(Config::default(), container).unwrap()
}

fn press(app: &mut App, code: KeyCode) -> bool {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

/// One frame's worth of bookkeeping, as the event loop does it
fn tick(app: &mut App) {
    app.refresh().unwrap();
    app.process_events();
}

#[test]
fn starts_on_home_with_loaded_data() {
    let app = app();
    assert_eq!(app.current_tab, Tab::Home);
    assert_eq!(app.mode, Mode::View);
    assert!(app.tasks.is_success());
    assert!(app.goals.is_success());
    assert!(app.summary.is_success());
}

#[test]
fn quick_add_toggle_and_delete_a_task() {
    let mut app = app();
    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.current_tab, Tab::Tasks);

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.mode, Mode::QuickAdd);
    type_text(&mut app, "Buy breadx");
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    assert_eq!(app.mode, Mode::View);
    assert_eq!(app.status.message, Some(StatusMessage::Info("Task added".to_string())));
    assert_eq!(app.visible_tasks().len(), 1);
    assert_eq!(app.selected_task().unwrap().title, "Buy bread");

    press(&mut app, KeyCode::Char(' '));
    tick(&mut app);
    assert!(app.visible_tasks()[0].is_completed);

    // Cancel is preselected
    press(&mut app, KeyCode::Char('d'));
    assert_eq!(app.mode, Mode::ConfirmDelete);
    press(&mut app, KeyCode::Enter);
    tick(&mut app);
    assert_eq!(app.visible_tasks().len(), 1);

    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Char('y'));
    tick(&mut app);
    assert!(app.visible_tasks().is_empty());
    assert_eq!(app.status.message, Some(StatusMessage::Info("Task deleted".to_string())));
}

#[test]
fn quick_add_errors_reach_the_status_bar() {
    let mut app = app();
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Pay @someday");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    assert!(matches!(app.status.message, Some(StatusMessage::Error(_))));
    assert!(app.visible_tasks().is_empty());
}

#[test]
fn filter_cycles_task_types() {
    let mut app = app();
    press(&mut app, KeyCode::Char('2'));

    press(&mut app, KeyCode::Char('f'));
    assert_eq!(app.task_filter, Some(TaskType::Daily));

    // New tasks take the filtered type
    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Journal");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);
    assert_eq!(app.visible_tasks()[0].task_type, TaskType::Daily);

    for _ in 0..3 {
        press(&mut app, KeyCode::Char('f'));
    }
    assert_eq!(app.task_filter, None);
    assert_eq!(app.filter_label(), "All");
}

#[test]
fn goals_tab_adds_and_completes_goals() {
    let mut app = app();
    press(&mut app, KeyCode::Char('3'));
    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Run 10k");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    assert_eq!(app.visible_goals().len(), 1);
    press(&mut app, KeyCode::Char(' '));
    tick(&mut app);
    assert!(app.visible_goals()[0].is_completed);
    assert_eq!(app.status.message, Some(StatusMessage::Info("Goal completed".to_string())));
    assert_eq!(app.summary.data().unwrap().goals.len(), 1);
}

#[test]
fn calendar_keys_move_the_selection() {
    let mut app = app();
    press(&mut app, KeyCode::Char('4'));
    let start = app.calendar.selected();

    press(&mut app, KeyCode::Char('l'));
    assert_eq!(app.calendar.selected(), start.succ_opt().unwrap());
    press(&mut app, KeyCode::Char('h'));
    assert_eq!(app.calendar.selected(), start);

    assert_eq!(app.calendar.mode(), CalendarMode::Month);
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(app.calendar.mode(), CalendarMode::Week);
    press(&mut app, KeyCode::Char('>'));
    assert_eq!(app.calendar.selected(), start + chrono::Duration::days(7));
}

#[test]
fn calendar_quick_add_lands_on_the_selected_day() {
    let mut app = app();
    press(&mut app, KeyCode::Char('4'));
    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "Dinner");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    let agenda = app.agenda_tasks();
    assert_eq!(agenda.len(), 1);
    assert_eq!(agenda[0].title, "Dinner");
}

#[test]
fn help_overlay_and_tab_arrows() {
    let mut app = app();
    press(&mut app, KeyCode::F(1));
    assert_eq!(app.mode, Mode::Help);
    // Other keys are ignored while help is open
    assert!(!press(&mut app, KeyCode::Char('q')));
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, Mode::View);

    press(&mut app, KeyCode::Right);
    assert_eq!(app.current_tab, Tab::Tasks);
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Left);
    assert_eq!(app.current_tab, Tab::Home);

    assert!(press(&mut app, KeyCode::Char('q')));
}

#[test]
fn navigate_events_switch_tabs() {
    let mut app = app();
    app.events.push(UiEvent::Navigate(Tab::Goals));
    app.events.push(UiEvent::ShowError("disk full".to_string()));
    app.process_events();

    assert!(app.events.is_empty());
    assert_eq!(app.current_tab, Tab::Goals);
    assert_eq!(app.status.message, Some(StatusMessage::Error("disk full".to_string())));
}

fn add_task_from_tasks_tab(app: &mut App, line: &str) {
    press(app, KeyCode::Char('2'));
    press(app, KeyCode::Char('n'));
    type_text(app, line);
    press(app, KeyCode::Enter);
    tick(app);
}

#[test]
fn edit_form_saves_title_and_turns_on_the_reminder() {
    let mut app = app();
    add_task_from_tasks_tab(&mut app, "Dentist @2030-03-01 09:00");

    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.mode, Mode::EditTask);
    let form = app.task_form.as_ref().unwrap();
    assert_eq!(form.title, "Dentist");
    assert_eq!(form.due_date, "2030-03-01 09:00");
    assert!(!form.remind);

    type_text(&mut app, " visit");
    for _ in 0..3 {
        press(&mut app, KeyCode::Tab);
    }
    assert_eq!(app.task_form.as_ref().unwrap().current_field, TaskField::Reminder);
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    assert_eq!(app.mode, Mode::View);
    assert_eq!(app.status.message, Some(StatusMessage::Info("Task saved".to_string())));
    let task = &app.visible_tasks()[0];
    assert_eq!(task.title, "Dentist visit");
    assert!(task.has_notification);

    let id = task.id.unwrap();
    let alarm = app.container.alarms.get(id).unwrap().unwrap();
    assert_eq!(alarm.trigger_at, parse_datetime("2030-03-01 08:55", &Local).unwrap());
}

#[test]
fn edit_form_stays_open_on_a_bad_date() {
    let mut app = app();
    add_task_from_tasks_tab(&mut app, "Pay rent");

    press(&mut app, KeyCode::Char('e'));
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "someday");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    assert_eq!(app.mode, Mode::EditTask);
    assert!(matches!(app.status.message, Some(StatusMessage::Error(_))));

    press(&mut app, KeyCode::Esc);
    tick(&mut app);
    assert_eq!(app.mode, Mode::View);
    assert!(app.task_form.is_none());
    assert_eq!(app.visible_tasks()[0].due_date, None);
}

#[test]
fn goals_tab_adds_a_task_due_on_the_goal_target_day() {
    let mut app = app();
    let target = NaiveDate::from_ymd_opt(2030, 10, 12).unwrap();
    let mut goal = Goal::new("Run a marathon".to_string());
    goal.target_date = Some(target);
    let goal_id = app.container.goals.add_goal(&goal).unwrap();
    tick(&mut app);

    press(&mut app, KeyCode::Char('3'));
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.mode, Mode::QuickAdd);
    assert!(matches!(
        app.quick_add.as_ref().unwrap().target,
        QuickAddTarget::GoalTask { goal_id: id, .. } if id == goal_id
    ));
    type_text(&mut app, "Long run");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);

    assert_eq!(app.status.message, Some(StatusMessage::Info("Task added to goal".to_string())));
    let tasks = app.container.db.get_tasks_by_goal(goal_id).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Long run");
    assert_eq!(tasks[0].task_type, TaskType::Goal);
    assert_eq!(tasks[0].due_date, Some(day_bounds(target, &Local).0));

    // An explicit date wins over the target day
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Half marathon @2030-06-01 07:00");
    press(&mut app, KeyCode::Enter);
    tick(&mut app);
    let tasks = app.container.db.get_tasks_by_goal(goal_id).unwrap();
    let half = tasks.iter().find(|t| t.title == "Half marathon").unwrap();
    assert_eq!(half.due_date, Some(parse_datetime("2030-06-01 07:00", &Local).unwrap()));
}

#[test]
fn goal_filter_does_not_quick_add_goal_less_tasks() {
    let mut app = app();
    press(&mut app, KeyCode::Char('2'));
    for _ in 0..3 {
        press(&mut app, KeyCode::Char('f'));
    }
    assert_eq!(app.task_filter, Some(TaskType::Goal));

    press(&mut app, KeyCode::Char('n'));
    tick(&mut app);
    assert_eq!(app.mode, Mode::View);
    assert_eq!(
        app.status.message,
        Some(StatusMessage::Error("Goal tasks are added from the Goals tab".to_string()))
    );
    assert!(app.container.db.get_all_tasks().unwrap().is_empty());
}

#[test]
fn edit_form_renders_its_fields() {
    let mut app = app();
    add_task_from_tasks_tab(&mut app, "Water plants");
    press(&mut app, KeyCode::Char('e'));

    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal
        .draw(|f| {
            let layout = Layout::calculate(Rect::new(0, 0, 120, 40), app.config.sidebar_width_percent);
            goaldo::tui::render(f, &mut app, &layout);
        })
        .unwrap();

    let screen: String = terminal.backend().buffer().content.iter().map(|cell| cell.symbol()).collect();
    assert!(screen.contains("Edit task"));
    assert!(screen.contains("Water plants"));
    assert!(screen.contains("Reminder (Space)"));
}
