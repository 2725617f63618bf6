use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::app::{TaskField, TaskForm};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;

pub fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm, palette: &Palette) {
    let popup = popup_area(area, 60, 80);
    if popup.width < 2 || popup.height < 2 {
        return;
    }
    f.render_widget(Clear, popup);

    let title = match form.editing_task_id() {
        Some(id) => format!("Edit task #{}", id),
        None => "Edit task".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(palette.base());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    // One bordered box per field, description gets the slack
    let field_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // Description
            Constraint::Length(3), // Due date
            Constraint::Length(3), // Reminder
            Constraint::Length(3), // Reminder time
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    let inactive_style = palette.base().add_modifier(Modifier::DIM);
    let style_for = |field: TaskField| {
        if form.current_field == field {
            palette.highlight()
        } else {
            inactive_style
        }
    };
    let cursor = |field: TaskField| if form.current_field == field { "█" } else { "" };

    let text_fields = [
        (TaskField::Title, "Title", form.title.as_str(), field_areas[0]),
        (TaskField::Description, "Description", form.description.as_str(), field_areas[1]),
        (TaskField::DueDate, "Due (YYYY-MM-DD [HH:MM])", form.due_date.as_str(), field_areas[2]),
        (
            TaskField::ReminderTime,
            "Reminder time (HH:MM or YYYY-MM-DD HH:MM, empty: 5 min before due)",
            form.reminder_time.as_str(),
            field_areas[4],
        ),
    ];
    for (field, label, text, field_area) in text_fields {
        let line = Line::from(vec![Span::raw(text.to_string()), Span::raw(cursor(field))]);
        let paragraph = Paragraph::new(line)
            .style(style_for(field))
            .block(Block::default().borders(Borders::ALL).title(label));
        f.render_widget(paragraph, field_area);
    }

    let reminder = if form.remind { "[x] On" } else { "[ ] Off" };
    let reminder_paragraph = Paragraph::new(Line::from(reminder))
        .style(style_for(TaskField::Reminder))
        .block(Block::default().borders(Borders::ALL).title("Reminder (Space)"));
    f.render_widget(reminder_paragraph, field_areas[3]);

    let hint = Paragraph::new(Line::from(Span::styled(
        "Tab/Shift+Tab: field  Enter: save  Esc: cancel",
        palette.muted(),
    )));
    f.render_widget(hint, field_areas[5]);
}
