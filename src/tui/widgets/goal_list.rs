use chrono::Local;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget};
use ratatui::Frame;

use crate::models::Goal;
use crate::resource::Resource;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::task_list::render_scrollbar;
use crate::tui::widgets::truncate_to;

pub fn goal_line(goal: &Goal, max_width: usize) -> String {
    let status_indicator = if goal.is_completed { "★" } else { "☆" };
    let target = goal
        .target_date
        .map(|d| format!(" → {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    truncate_to(format!("{} {}{}", status_indicator, goal.title, target), max_width)
}

pub fn render_goal_list(
    f: &mut Frame,
    area: Rect,
    goals: &Resource<Vec<Goal>>,
    list_state: &mut ListState,
    palette: &Palette,
) {
    let goals = match goals {
        Resource::Loading => {
            let block = Block::default().borders(Borders::ALL).title("Goals");
            f.render_widget(Paragraph::new("Loading...").block(block).style(palette.muted()), area);
            return;
        }
        Resource::Error { message } => {
            let block = Block::default().borders(Borders::ALL).title("Goals");
            f.render_widget(Paragraph::new(format!("Error: {}", message)).block(block).style(palette.base()), area);
            return;
        }
        Resource::Success(goals) => goals,
    };

    if goals.is_empty() {
        let block = Block::default().borders(Borders::ALL).title("Goals");
        f.render_widget(
            Paragraph::new("No goals yet. Press n to set one.").block(block).style(palette.muted()),
            area,
        );
        return;
    }

    let max_width = area.width.saturating_sub(4) as usize;
    let today = Local::now().date_naive();

    let items: Vec<ListItem> = goals
        .iter()
        .map(|goal| {
            let style = if goal.is_completed {
                palette.muted()
            } else if goal.is_overdue(today) {
                palette.base().fg(ratatui::style::Color::Red)
            } else {
                palette.base()
            };
            ListItem::new(goal_line(goal, max_width)).style(style)
        })
        .collect();

    let [list_area, scrollbar_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .areas(area);

    let total_items = items.len();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("Goals ({})", total_items)))
        .style(palette.base())
        .highlight_style(palette.highlight());

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);
    render_scrollbar(f, list_area, scrollbar_area, total_items, list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn line_shows_target_date() {
        let mut goal = Goal::new("Run a marathon".to_string());
        goal.target_date = NaiveDate::from_ymd_opt(2025, 10, 12);
        assert_eq!(goal_line(&goal, 80), "☆ Run a marathon → 2025-10-12");

        goal.is_completed = true;
        goal.target_date = None;
        assert_eq!(goal_line(&goal, 80), "★ Run a marathon");
    }
}
