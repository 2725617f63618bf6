use chrono::{Datelike, Local, NaiveDate};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget};
use ratatui::Frame;

use crate::calendar::{CalendarMode, CalendarView, DayCounts};
use crate::models::Task;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::task_list::task_line;

const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Day cell: the day number, with a dot when tasks are due and a check when all are done
pub fn day_cell(date: NaiveDate, counts: Option<&DayCounts>) -> String {
    let marker = match counts {
        Some(c) if c.total > 0 && c.completed == c.total => "✓",
        Some(c) if c.total > 0 => "•",
        _ => " ",
    };
    format!("{:>2}{}", date.day(), marker)
}

pub fn render_calendar(
    f: &mut Frame,
    area: Rect,
    calendar: &CalendarView,
    agenda: &[&Task],
    list_state: &mut ListState,
    palette: &Palette,
) {
    let days = calendar.visible_days();
    let weeks = days.len().div_ceil(7) as u16;
    let [grid_area, agenda_area] =
        Layout::vertical([Constraint::Length(weeks + 3), Constraint::Min(3)]).areas(area);

    render_grid(f, grid_area, calendar, &days, palette);
    render_agenda(f, agenda_area, calendar.selected(), agenda, list_state, palette);
}

fn render_grid(f: &mut Frame, area: Rect, calendar: &CalendarView, days: &[NaiveDate], palette: &Palette) {
    let selected = calendar.selected();
    let today = Local::now().date_naive();
    let title = match calendar.mode() {
        CalendarMode::Month => selected.format("%B %Y").to_string(),
        CalendarMode::Week => format!("Week of {}", days.first().unwrap_or(&selected).format("%Y-%m-%d")),
    };

    let mut lines = vec![Line::from(
        WEEKDAYS
            .iter()
            .map(|d| Span::styled(format!("{:<4}", d), palette.muted()))
            .collect::<Vec<_>>(),
    )];

    for week in days.chunks(7) {
        let spans = week
            .iter()
            .map(|date| {
                let mut style = if date.month() != selected.month() && calendar.mode() == CalendarMode::Month {
                    palette.muted()
                } else {
                    palette.base()
                };
                if *date == today {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                if *date == selected {
                    style = palette.highlight();
                }
                Span::styled(format!("{} ", day_cell(*date, calendar.day_counts().get(date))), style)
            })
            .collect::<Vec<_>>();
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(palette.base());
    f.render_widget(paragraph, area);
}

fn render_agenda(
    f: &mut Frame,
    area: Rect,
    selected: NaiveDate,
    agenda: &[&Task],
    list_state: &mut ListState,
    palette: &Palette,
) {
    let title = format!("{} ({})", selected.format("%A, %B %-d"), agenda.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    if agenda.is_empty() {
        f.render_widget(Paragraph::new("Nothing due").block(block).style(palette.muted()), area);
        return;
    }

    let max_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = agenda
        .iter()
        .map(|task| {
            let style = if task.is_completed { palette.muted() } else { palette.base() };
            ListItem::new(task_line(task, max_width)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .style(palette.base())
        .highlight_style(palette.highlight());
    StatefulWidget::render(list, area, f.buffer_mut(), list_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_mark_due_and_done_days() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(day_cell(date, None), " 7 ");
        assert_eq!(day_cell(date, Some(&DayCounts { total: 2, completed: 1 })), " 7•");
        assert_eq!(day_cell(date, Some(&DayCounts { total: 2, completed: 2 })), " 7✓");
    }
}
