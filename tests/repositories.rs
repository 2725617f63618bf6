mod common;

use chrono::{Duration, Local, NaiveDate, TimeZone};
use common::{fixed_now, harness};
use goaldo::database::DatabaseError;
use goaldo::live::{LiveQuery, Table};
use goaldo::repository::{GoalRepository, SubTaskRepository};
use goaldo::resource::{Resource, ResourceStream};
use goaldo::summary::HomeSummary;
use goaldo::{Database, Goal, Task, TaskType};
use std::rc::Rc;

fn typed(title: &str, task_type: TaskType) -> Task {
    let mut task = Task::new(title.to_string());
    task.task_type = task_type;
    task
}

#[test]
fn live_query_emits_initial_then_only_after_writes() {
    let h = harness();
    let mut query = h.tasks.tasks();

    assert_eq!(query.poll().unwrap().unwrap().len(), 0);
    assert!(query.poll().is_none());

    h.tasks.add_task(&Task::new("First".to_string())).unwrap();
    let tasks = query.poll().unwrap().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "First");
    assert!(query.poll().is_none());
}

#[test]
fn pending_changes_coalesce_into_one_emission() {
    let h = harness();
    let mut query = h.tasks.tasks();
    query.poll();

    for i in 0..3 {
        h.tasks.add_task(&Task::new(format!("Task {}", i))).unwrap();
    }
    assert_eq!(query.poll().unwrap().unwrap().len(), 3);
    assert!(query.poll().is_none());
}

#[test]
fn goal_writes_do_not_wake_task_queries() {
    let h = harness();
    let goals = GoalRepository::new(h.db.clone());
    let mut query = h.tasks.tasks();
    query.poll();

    goals.add_goal(&Goal::new("Learn Rust".to_string())).unwrap();
    assert!(query.poll().is_none());
}

#[test]
fn commits_from_another_connection_wake_live_queries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("goaldo.db");
    let path = path.to_str().unwrap();
    let app_db = Rc::new(Database::new(path).unwrap());
    let cli_db = Database::new(path).unwrap();

    let mut query = LiveQuery::new(app_db.clone(), &[Table::Tasks], |db| db.get_all_tasks());
    assert!(query.poll().unwrap().unwrap().is_empty());
    assert!(query.poll().is_none());

    cli_db.insert_task(&Task::new("Added from the command line".to_string())).unwrap();
    let tasks = query.poll().unwrap().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Added from the command line");
    assert!(query.poll().is_none());

    app_db.insert_task(&Task::new("Local".to_string())).unwrap();
    assert_eq!(query.poll().unwrap().unwrap().len(), 2);
    assert!(query.poll().is_none());
}

#[test]
fn only_goal_tasks_may_reference_a_goal() {
    let h = harness();
    let goal_id = GoalRepository::new(h.db.clone())
        .add_goal(&Goal::new("Ship v1".to_string()))
        .unwrap();

    let mut stray = typed("Write docs", TaskType::Quick);
    stray.goal_id = Some(goal_id);
    assert!(matches!(h.tasks.add_task(&stray), Err(DatabaseError::InvalidTask(_))));
    assert!(h.db.get_all_tasks().unwrap().is_empty());

    let mut task = typed("Write docs", TaskType::Goal);
    task.goal_id = Some(goal_id);
    let id = h.tasks.add_task(&task).unwrap();

    let mut retyped = h.db.get_task(id).unwrap().unwrap();
    retyped.task_type = TaskType::Daily;
    assert!(matches!(h.tasks.update_task(&retyped), Err(DatabaseError::InvalidTask(_))));
    assert_eq!(h.db.get_task(id).unwrap().unwrap().task_type, TaskType::Goal);
}

#[test]
fn dropped_queries_unsubscribe() {
    let h = harness();
    let query = h.tasks.tasks();
    let before = h.db.changes().subscriber_count();
    drop(query);

    h.db.changes().publish(Table::Tasks);
    assert_eq!(h.db.changes().subscriber_count(), before - 1);
}

#[test]
fn resource_stream_starts_loading() {
    let h = harness();
    h.tasks.add_task(&Task::new("Read".to_string())).unwrap();
    let mut stream = ResourceStream::new(h.tasks.tasks());

    assert!(stream.next_state().unwrap().is_loading());
    match stream.next_state() {
        Some(Resource::Success(tasks)) => assert_eq!(tasks.len(), 1),
        other => panic!("expected success, got {:?}", other),
    }
    assert!(stream.next_state().is_none());
}

#[test]
fn filters_by_type_and_completion() {
    let h = harness();
    h.tasks.add_task(&typed("Stretch", TaskType::Daily)).unwrap();
    let quick = h.tasks.add_task(&typed("Buy milk", TaskType::Quick)).unwrap();
    h.tasks.toggle_task_completion(quick).unwrap();

    let daily = h.tasks.tasks_by_type(TaskType::Daily).current().unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].title, "Stretch");

    assert_eq!(h.tasks.completed_tasks().current().unwrap().len(), 1);
    assert_eq!(h.tasks.pending_tasks().current().unwrap().len(), 1);
    assert_eq!(h.tasks.total_count_by_type(TaskType::Quick).current().unwrap(), 1);
    assert_eq!(h.tasks.completed_count_by_type(TaskType::Quick).current().unwrap(), 1);
    assert_eq!(h.tasks.completed_count_by_type(TaskType::Daily).current().unwrap(), 0);
}

#[test]
fn soft_deleted_tasks_disappear_from_reads() {
    let h = harness();
    let id = h.tasks.add_task(&Task::new("Gone soon".to_string())).unwrap();
    assert!(h.tasks.delete_task_by_id(id).unwrap());

    assert!(h.tasks.get_task(id).unwrap().is_none());
    assert!(h.tasks.tasks().current().unwrap().is_empty());

    let stored = h.db.get_task_including_deleted(id).unwrap().unwrap();
    assert!(stored.is_deleted);
    assert_eq!(stored.deleted_at.map(|d| d.timestamp_millis()), Some(fixed_now().timestamp_millis()));

    // A deleted row cannot be updated back to life
    assert!(h.tasks.update_task(&stored).is_err());
}

#[test]
fn range_query_is_inclusive() {
    let h = harness();
    let start = fixed_now();
    let end = start + Duration::hours(1);
    for (title, due) in [("at start", start), ("at end", end), ("after", end + Duration::milliseconds(1))] {
        let mut task = Task::new(title.to_string());
        task.due_date = Some(due);
        h.tasks.add_task(&task).unwrap();
    }

    let titles: Vec<String> = h
        .tasks
        .tasks_in_range(start, end)
        .current()
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["at start", "at end"]);
}

#[test]
fn tasks_for_date_uses_the_local_day() {
    let h = harness();
    let date = NaiveDate::from_ymd_opt(2030, 2, 1).unwrap();
    let local_noon = Local
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
        .single()
        .unwrap()
        .to_utc();

    let mut task = Task::new("Lunch".to_string());
    task.due_date = Some(local_noon);
    h.tasks.add_task(&task).unwrap();

    assert_eq!(h.tasks.tasks_for_date(date).current().unwrap().len(), 1);
    assert!(h.tasks.tasks_for_date(date.succ_opt().unwrap()).current().unwrap().is_empty());
}

#[test]
fn deleting_a_goal_keeps_its_tasks() {
    let h = harness();
    let goals = GoalRepository::new(h.db.clone());
    let goal_id = goals.add_goal(&Goal::new("Ship it".to_string())).unwrap();

    let mut task = typed("Write docs", TaskType::Goal);
    task.goal_id = Some(goal_id);
    let task_id = h.tasks.add_task(&task).unwrap();
    assert_eq!(h.tasks.tasks_by_goal(goal_id).current().unwrap().len(), 1);

    let mut task_query = h.tasks.tasks();
    task_query.poll();

    assert!(goals.delete_goal(goal_id).unwrap());
    assert!(goals.get_goal(goal_id).unwrap().is_none());
    assert!(!goals.delete_goal(goal_id).unwrap());

    let kept = h.tasks.get_task(task_id).unwrap().unwrap();
    assert_eq!(kept.goal_id, None);
    // Detaching is a task write, so task queries hear about it
    assert!(task_query.poll().is_some());
}

#[test]
fn goal_completion_stamps_today() {
    let h = harness();
    let goals = GoalRepository::new(h.db.clone());
    let id = goals.add_goal(&Goal::new("Read 12 books".to_string())).unwrap();

    let done = goals.toggle_goal_completion(id).unwrap().unwrap();
    assert!(done.is_completed);
    assert_eq!(done.completed_at, Some(Local::now().date_naive()));
    assert_eq!(goals.completed_goals().current().unwrap().len(), 1);
    assert!(goals.active_goals().current().unwrap().is_empty());

    let reopened = goals.toggle_goal_completion(id).unwrap().unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(goals.get_goal(id).unwrap().unwrap().completed_at, None);
    assert_eq!(goals.goal_count().current().unwrap(), 1);
    assert!(goals.toggle_goal_completion(999).unwrap().is_none());
}

#[test]
fn goal_dates_round_trip() {
    let h = harness();
    let goals = GoalRepository::new(h.db.clone());
    let mut goal = Goal::new("Marathon".to_string());
    goal.start_date = NaiveDate::from_ymd_opt(2030, 1, 1);
    goal.target_date = NaiveDate::from_ymd_opt(2030, 10, 12);
    goal.description = Some("Sub four hours".to_string());
    let id = goals.add_goal(&goal).unwrap();

    let stored = goals.goal_by_id(id).current().unwrap().unwrap();
    assert_eq!(stored.start_date, goal.start_date);
    assert_eq!(stored.target_date, goal.target_date);
    assert_eq!(stored.description.as_deref(), Some("Sub four hours"));
}

#[test]
fn subtasks_keep_insertion_order() {
    let h = harness();
    let subtasks = SubTaskRepository::new(h.db.clone());
    let task_id = h.tasks.add_task(&Task::new("Move house".to_string())).unwrap();

    let boxes = subtasks.add_subtask(task_id, "Buy boxes").unwrap();
    subtasks.add_subtask(task_id, "Book van").unwrap();
    let third = subtasks.add_subtask(task_id, "Pack kitchen").unwrap();

    let mut live = subtasks.subtasks(task_id);
    let list = live.poll().unwrap().unwrap();
    let titles: Vec<&str> = list.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Buy boxes", "Book van", "Pack kitchen"]);
    assert_eq!(list[0].order_index, 0);

    assert!(subtasks.toggle_subtask(boxes).unwrap().unwrap().is_completed);
    assert!(subtasks.delete_subtask(third).unwrap());
    assert_eq!(live.poll().unwrap().unwrap().len(), 2);
    assert_eq!(subtasks.counts(task_id).current().unwrap(), (2, 1));
}

#[test]
fn repeat_interval_round_trips_untouched() {
    let h = harness();
    let mut task = Task::new("Hydrate".to_string());
    task.repeat_interval_minutes = Some(60);
    let id = h.tasks.add_task(&task).unwrap();
    assert_eq!(h.tasks.get_task(id).unwrap().unwrap().repeat_interval_minutes, Some(60));
}

#[test]
fn home_summary_follows_writes() {
    let h = harness();
    let goals = GoalRepository::new(h.db.clone());
    let goal_id = goals.add_goal(&Goal::new("Fitness".to_string())).unwrap();

    let mut summary = HomeSummary::live(h.db.clone());
    let initial = summary.poll().unwrap().unwrap();
    assert_eq!(initial.goals.len(), 1);
    assert_eq!(initial.goals[0].percent(), 0);

    let daily = h.tasks.add_task(&typed("Push-ups", TaskType::Daily)).unwrap();
    for title in ["Run", "Swim", "Bike"] {
        let mut task = typed(title, TaskType::Goal);
        task.goal_id = Some(goal_id);
        let id = h.tasks.add_task(&task).unwrap();
        if title == "Run" {
            h.tasks.toggle_task_completion(id).unwrap();
        }
    }
    h.tasks.toggle_task_completion(daily).unwrap();

    let updated = summary.poll().unwrap().unwrap();
    assert_eq!((updated.daily_completed, updated.daily_total), (1, 1));
    assert_eq!((updated.quick_completed, updated.quick_total), (0, 0));
    assert_eq!(updated.goals[0].total_tasks, 3);
    assert_eq!(updated.goals[0].completed_tasks, 1);
    assert_eq!(updated.goals[0].percent(), 33);
}
