use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

use crate::resource::Resource;
use crate::summary::HomeSummary;
use crate::tui::widgets::color::Palette;

fn ratio(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        (completed as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Dashboard: daily and quick task progress, then one bar per goal
pub fn render_home(f: &mut Frame, area: Rect, summary: &Resource<HomeSummary>, palette: &Palette) {
    let outer = Block::default().borders(Borders::ALL).title("Home").style(palette.base());

    let summary = match summary {
        Resource::Success(summary) => summary,
        Resource::Loading => {
            f.render_widget(Paragraph::new("Loading...").block(outer).style(palette.muted()), area);
            return;
        }
        Resource::Error { message } => {
            f.render_widget(Paragraph::new(format!("Error: {}", message)).block(outer), area);
            return;
        }
    };

    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let goal_rows = summary.goals.len().max(1) as u16;
    let [daily_area, quick_area, goals_title_area, goals_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Max(goal_rows * 2),
    ])
    .areas(inner);

    let gauge = |title: String, completed: i64, total: i64| {
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(palette.highlight())
            .style(palette.base())
            .ratio(ratio(completed, total))
            .label(format!("{}/{}", completed, total))
    };

    f.render_widget(
        gauge("Daily tasks".to_string(), summary.daily_completed, summary.daily_total),
        daily_area,
    );
    f.render_widget(
        gauge("Quick tasks".to_string(), summary.quick_completed, summary.quick_total),
        quick_area,
    );
    f.render_widget(
        Paragraph::new(Line::from(Span::styled("Goals", palette.highlight()))),
        goals_title_area,
    );

    if summary.goals.is_empty() {
        f.render_widget(Paragraph::new("No goals yet").style(palette.muted()), goals_area);
        return;
    }

    let rows = Layout::vertical(summary.goals.iter().map(|_| Constraint::Length(2))).split(goals_area);
    for (progress, row) in summary.goals.iter().zip(rows.iter()) {
        let [label_area, bar_area] = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(*row);
        let label_style = if progress.goal.is_completed { palette.muted() } else { palette.base() };
        f.render_widget(
            Paragraph::new(format!(
                "{} ({}/{} tasks)",
                progress.goal.title, progress.completed_tasks, progress.total_tasks
            ))
            .style(label_style),
            label_area,
        );
        f.render_widget(
            Gauge::default()
                .gauge_style(palette.highlight())
                .style(palette.base())
                .percent(progress.percent())
                .label(format!("{}%", progress.percent())),
            bar_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_handles_empty_totals() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
        assert_eq!(ratio(5, 4), 1.0);
    }
}
