use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::app::{QuickAddState, QuickAddTarget};
use crate::tui::widgets::color::Palette;

/// Single-line input box pinned to the middle of the screen
pub fn render_quick_add(f: &mut Frame, area: Rect, state: &QuickAddState, palette: &Palette) {
    let vertical = Layout::vertical([Constraint::Length(4)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(60)]).flex(Flex::Center);
    let [popup] = vertical.areas(area);
    let [popup] = horizontal.areas(popup);
    f.render_widget(Clear, popup);

    let task_hint = "title @YYYY-MM-DD [HH:MM] !   Enter: save  Esc: cancel";
    let (title, hint) = match &state.target {
        QuickAddTarget::Task => ("New task".to_string(), task_hint),
        QuickAddTarget::Goal => ("New goal".to_string(), "title   Enter: save  Esc: cancel"),
        QuickAddTarget::GoalTask { goal_title, target_date, .. } => {
            let title = match target_date {
                Some(date) => format!("New task for \"{}\" (due {} unless @ given)", goal_title, date),
                None => format!("New task for \"{}\"", goal_title),
            };
            (title, task_hint)
        }
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(state.input.as_str(), palette.base()),
            Span::styled("█", palette.base()),
        ]),
        Line::from(Span::styled(hint, palette.muted())),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title).style(palette.base()))
        .style(palette.base());
    f.render_widget(paragraph, popup);
}
