use ratatui::layout::{Constraint, Flex, Layout, Rect};

pub mod calendar;
pub mod color;
pub mod confirm_delete;
pub mod detail;
pub mod goal_list;
pub mod help;
pub mod home;
pub mod quick_add;
pub mod status_bar;
pub mod tabs;
pub mod task_form;
pub mod task_list;

/// Centered rect taking the given percentage of `area`.
/// Based on ratatui popup example: https://ratatui.rs/examples/apps/popup/
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

pub(crate) fn truncate_to(text: String, max_width: usize) -> String {
    if text.chars().count() > max_width {
        text.chars().take(max_width.saturating_sub(3)).collect::<String>() + "..."
    } else {
        text
    }
}
