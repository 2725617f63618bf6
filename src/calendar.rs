use chrono::{Datelike, Duration, Local, Months, NaiveDate, TimeZone};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::database::DatabaseError;
use crate::live::LiveQuery;
use crate::models::Task;
use crate::repository::TaskRepository;
use crate::utils::day_bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMode {
    Month,
    Week,
}

impl CalendarMode {
    pub fn toggled(self) -> Self {
        match self {
            CalendarMode::Month => CalendarMode::Week,
            CalendarMode::Week => CalendarMode::Month,
        }
    }
}

/// Tasks due on the selected day, split by completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agenda {
    pub todo: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Agenda {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let (completed, todo) = tasks.into_iter().partition(|t| t.is_completed);
        Self { todo, completed }
    }

    pub fn is_empty(&self) -> bool {
        self.todo.is_empty() && self.completed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCounts {
    pub total: usize,
    pub completed: usize,
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Days shown for `selected`: its Monday-to-Sunday week, or every full week
/// overlapping its month.
pub fn visible_days(selected: NaiveDate, mode: CalendarMode) -> Vec<NaiveDate> {
    let (first, last) = match mode {
        CalendarMode::Week => {
            let start = week_start(selected);
            (start, start + Duration::days(6))
        }
        CalendarMode::Month => {
            let month_first = selected.with_day(1).unwrap_or(selected);
            let month_last = month_first
                .checked_add_months(Months::new(1))
                .map(|next| next - Duration::days(1))
                .unwrap_or(selected);
            let start = week_start(month_first);
            (start, week_start(month_last) + Duration::days(6))
        }
    };
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// Group tasks by the local calendar date of their due date
pub fn count_by_day<Tz: TimeZone>(tasks: &[Task], tz: &Tz) -> BTreeMap<NaiveDate, DayCounts> {
    let mut counts: BTreeMap<NaiveDate, DayCounts> = BTreeMap::new();
    for task in tasks {
        let Some(due) = task.due_date else { continue };
        let entry = counts.entry(due.with_timezone(tz).date_naive()).or_default();
        entry.total += 1;
        if task.is_completed {
            entry.completed += 1;
        }
    }
    counts
}

/// Calendar screen state: selection, mode and the live data behind them.
/// Queries are rebuilt when the selection moves to another day or period.
pub struct CalendarView {
    tasks: Rc<TaskRepository>,
    selected: NaiveDate,
    mode: CalendarMode,
    day_query: LiveQuery<Vec<Task>>,
    range_query: LiveQuery<Vec<Task>>,
    agenda: Agenda,
    day_counts: BTreeMap<NaiveDate, DayCounts>,
}

impl CalendarView {
    pub fn new(tasks: Rc<TaskRepository>, today: NaiveDate) -> Self {
        let mode = CalendarMode::Month;
        let day_query = tasks.tasks_for_date(today);
        let range_query = Self::range_query(&tasks, today, mode);
        Self {
            tasks,
            selected: today,
            mode,
            day_query,
            range_query,
            agenda: Agenda::default(),
            day_counts: BTreeMap::new(),
        }
    }

    fn range_query(tasks: &TaskRepository, selected: NaiveDate, mode: CalendarMode) -> LiveQuery<Vec<Task>> {
        let days = visible_days(selected, mode);
        let first = days.first().copied().unwrap_or(selected);
        let last = days.last().copied().unwrap_or(selected);
        let (start, _) = day_bounds(first, &Local);
        let (_, end) = day_bounds(last, &Local);
        tasks.tasks_in_range(start, end)
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn mode(&self) -> CalendarMode {
        self.mode
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn day_counts(&self) -> &BTreeMap<NaiveDate, DayCounts> {
        &self.day_counts
    }

    pub fn visible_days(&self) -> Vec<NaiveDate> {
        visible_days(self.selected, self.mode)
    }

    pub fn select(&mut self, date: NaiveDate) {
        if date == self.selected {
            return;
        }
        let old_days = self.visible_days();
        self.selected = date;
        self.day_query = self.tasks.tasks_for_date(date);
        if self.visible_days() != old_days {
            self.range_query = Self::range_query(&self.tasks, date, self.mode);
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.range_query = Self::range_query(&self.tasks, self.selected, self.mode);
    }

    pub fn next_period(&mut self) {
        let target = match self.mode {
            CalendarMode::Month => self.selected.checked_add_months(Months::new(1)),
            CalendarMode::Week => self.selected.checked_add_signed(Duration::days(7)),
        };
        if let Some(date) = target {
            self.select(date);
        }
    }

    pub fn previous_period(&mut self) {
        let target = match self.mode {
            CalendarMode::Month => self.selected.checked_sub_months(Months::new(1)),
            CalendarMode::Week => self.selected.checked_sub_signed(Duration::days(7)),
        };
        if let Some(date) = target {
            self.select(date);
        }
    }

    pub fn shift_days(&mut self, days: i64) {
        if let Some(date) = self.selected.checked_add_signed(Duration::days(days)) {
            self.select(date);
        }
    }

    /// Pull fresh results for whichever query saw a change.
    /// Returns whether anything was updated.
    pub fn refresh(&mut self) -> Result<bool, DatabaseError> {
        let mut updated = false;
        if let Some(result) = self.day_query.poll() {
            self.agenda = Agenda::from_tasks(result?);
            updated = true;
        }
        if let Some(result) = self.range_query.poll() {
            self.day_counts = count_by_day(&result?, &Local);
            updated = true;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_view_runs_monday_to_sunday() {
        // 2025-01-15 is a Wednesday
        let days = visible_days(date(2025, 1, 15), CalendarMode::Week);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2025, 1, 13));
        assert_eq!(days[0].weekday(), Weekday::Mon);
        assert_eq!(days[6], date(2025, 1, 19));
    }

    #[test]
    fn month_view_covers_whole_weeks() {
        // February 2025 starts on a Saturday and ends on a Friday
        let days = visible_days(date(2025, 2, 10), CalendarMode::Month);
        assert_eq!(days.first(), Some(&date(2025, 1, 27)));
        assert_eq!(days.last(), Some(&date(2025, 3, 2)));
        assert_eq!(days.len() % 7, 0);
        assert!(days.contains(&date(2025, 2, 28)));
    }

    #[test]
    fn agenda_splits_by_completion() {
        let mut done = Task::new("done".to_string());
        done.is_completed = true;
        let open = Task::new("open".to_string());

        let agenda = Agenda::from_tasks(vec![done, open]);
        assert_eq!(agenda.todo.len(), 1);
        assert_eq!(agenda.todo[0].title, "open");
        assert_eq!(agenda.completed[0].title, "done");
    }

    #[test]
    fn counts_group_by_due_day() {
        let due = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        let mut a = Task::new("a".to_string());
        a.due_date = Some(due);
        let mut b = Task::new("b".to_string());
        b.due_date = Some(due + Duration::hours(2));
        b.is_completed = true;
        let undated = Task::new("c".to_string());

        let counts = count_by_day(&[a, b, undated], &Utc);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&date(2025, 3, 4)], DayCounts { total: 2, completed: 1 });
    }
}
