use chrono::Local;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::models::{Goal, Task};
use crate::reminder::derive_trigger_time;
use crate::tui::widgets::color::Palette;

fn field<'a>(label: &'a str, value: String, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), palette.muted()),
        Span::styled(value, palette.base()),
    ])
}

pub fn task_detail_lines<'a>(task: &'a Task, goal_title: Option<&str>, palette: &Palette) -> Vec<Line<'a>> {
    let fmt = |dt: chrono::DateTime<chrono::Utc>| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();

    let mut lines = vec![
        Line::from(Span::styled(task.title.as_str(), palette.highlight())),
        Line::from(""),
        field("Type", task.task_type.as_str().to_string(), palette),
        field(
            "Status",
            if task.is_completed { "done" } else { "todo" }.to_string(),
            palette,
        ),
        field("Due", task.due_date.map(fmt).unwrap_or_else(|| "-".to_string()), palette),
    ];
    if let Some(goal) = goal_title {
        lines.push(field("Goal", goal.to_string(), palette));
    }
    let reminder = if task.has_notification {
        derive_trigger_time(task.notification_time, task.due_date)
            .map(fmt)
            .unwrap_or_else(|| "on, no time set".to_string())
    } else {
        "off".to_string()
    };
    lines.push(field("Reminder", reminder, palette));
    if let Some(minutes) = task.repeat_interval_minutes {
        lines.push(field("Repeat", format!("every {} min", minutes), palette));
    }
    if !task.description.is_empty() {
        lines.push(Line::from(""));
        lines.extend(task.description.lines().map(|l| Line::from(Span::styled(l, palette.base()))));
    }
    lines
}

pub fn goal_detail_lines<'a>(goal: &'a Goal, palette: &Palette) -> Vec<Line<'a>> {
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        Line::from(Span::styled(goal.title.as_str(), palette.highlight())),
        Line::from(""),
        field("Started", date(goal.start_date), palette),
        field("Target", date(goal.target_date), palette),
        field(
            "Status",
            if goal.is_completed {
                format!("completed {}", date(goal.completed_at))
            } else {
                "active".to_string()
            },
            palette,
        ),
    ];
    if let Some(description) = goal.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::from(""));
        lines.extend(description.lines().map(|l| Line::from(Span::styled(l, palette.base()))));
    }
    lines
}

pub fn render_detail(f: &mut Frame, area: Rect, lines: Vec<Line>, palette: &Palette) {
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .style(palette.base())
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
