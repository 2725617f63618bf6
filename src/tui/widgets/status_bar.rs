use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::app::StatusMessage;
use crate::tui::widgets::color::Palette;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Fit as many hints as the width allows, ending with an ellipsis when some were dropped
pub fn fit_hints(hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in hints.iter().enumerate() {
        let extra = if i == 0 { 0 } else { SEPARATOR.chars().count() };
        if text.chars().count() + extra + hint.chars().count() > max_width {
            if text.chars().count() + ELLIPSIS.len() <= max_width {
                text.push_str(ELLIPSIS);
            }
            break;
        }
        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect::<String>() + ELLIPSIS
}

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&StatusMessage>,
    key_hints: &[String],
    palette: &Palette,
) {
    let max_width = area.width as usize;
    let (content, style) = match message {
        Some(StatusMessage::Info(text)) => (truncate(text, max_width), palette.highlight()),
        Some(StatusMessage::Error(text)) => (
            truncate(&format!("Error: {}", text), max_width),
            palette.highlight().fg(ratatui::style::Color::White).bg(ratatui::style::Color::Red),
        ),
        None => (fit_hints(key_hints, max_width), palette.base()),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_that_do_not_fit_are_elided() {
        let hints = vec!["q: Quit".to_string(), "n: New".to_string(), "d: Delete".to_string()];
        assert_eq!(fit_hints(&hints, 80), "q: Quit • n: New • d: Delete");
        assert_eq!(fit_hints(&hints, 20), "q: Quit • n: New...");
    }
}
