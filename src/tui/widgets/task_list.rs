use chrono::{Local, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget,
};
use ratatui::Frame;

use crate::models::Task;
use crate::resource::Resource;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::truncate_to;

/// One list row: status, title, due date and a bell when a reminder is on
pub fn task_line(task: &Task, max_width: usize) -> String {
    let status_indicator = if task.is_completed { "✓" } else { "○" };
    let due_str = task
        .due_date
        .map(|d| format!(" [{}]", d.with_timezone(&Local).format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    let bell = if task.has_notification { " 🔔" } else { "" };
    truncate_to(format!("{} {}{}{}", status_indicator, task.title, due_str, bell), max_width)
}

pub fn render_task_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    tasks: &Resource<Vec<Task>>,
    list_state: &mut ListState,
    palette: &Palette,
) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());

    let tasks = match tasks {
        Resource::Loading => {
            f.render_widget(Paragraph::new("Loading...").block(block).style(palette.muted()), area);
            return;
        }
        Resource::Error { message } => {
            f.render_widget(Paragraph::new(format!("Error: {}", message)).block(block).style(palette.base()), area);
            return;
        }
        Resource::Success(tasks) => tasks,
    };

    if tasks.is_empty() {
        f.render_widget(Paragraph::new("No tasks").block(block).style(palette.muted()), area);
        return;
    }

    // Account for borders and padding
    let max_width = area.width.saturating_sub(4) as usize;
    let now = Utc::now();

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            let style = if task.is_completed {
                palette.muted()
            } else if task.is_overdue(now) {
                palette.base().fg(ratatui::style::Color::Red)
            } else {
                palette.base()
            };
            ListItem::new(Line::from(Span::styled(task_line(task, max_width), style)))
        })
        .collect();

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let total_items = items.len();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("{} ({})", title, total_items)))
        .style(palette.base())
        .highlight_style(palette.highlight());

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);
    render_scrollbar(f, list_area, scrollbar_area, total_items, list_state);
}

pub(crate) fn render_scrollbar(
    f: &mut Frame,
    list_area: Rect,
    scrollbar_area: Rect,
    total_items: usize,
    list_state: &ListState,
) {
    let visible_items = list_area.height.saturating_sub(2) as usize;
    if total_items <= visible_items || scrollbar_area.width == 0 || list_area.height <= 2 {
        return;
    }

    let scrollbar_inner_area = Rect::new(
        scrollbar_area.x,
        list_area.y + 1,
        scrollbar_area.width,
        list_area.height.saturating_sub(2),
    );

    let selected_index = list_state.selected().unwrap_or(0);
    let scroll_position = if selected_index < visible_items {
        0
    } else {
        selected_index.saturating_sub(visible_items - 1)
    };

    let mut scrollbar_state = ScrollbarState::new(total_items)
        .viewport_content_length(visible_items)
        .position(scroll_position);

    let scrollbar = Scrollbar::default()
        .orientation(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"))
        .track_symbol(Some("│"))
        .thumb_symbol("█");

    f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_marks_status_and_reminder() {
        let mut task = Task::new("Stretch".to_string());
        assert_eq!(task_line(&task, 80), "○ Stretch");

        task.is_completed = true;
        task.has_notification = true;
        assert_eq!(task_line(&task, 80), "✓ Stretch 🔔");
    }

    #[test]
    fn long_titles_are_truncated() {
        let task = Task::new("a very long task title indeed".to_string());
        assert_eq!(task_line(&task, 12), "○ a very ...");
    }
}
