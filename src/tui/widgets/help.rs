use ratatui::layout::{Alignment, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;
use crate::Config;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config, palette: &Palette) {
    let popup_area = popup_area(area, 60, 70);

    // Clear the background first so the list does not show through
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(palette.base()),
        )
        .style(palette.base())
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Switch tabs\n", key(&kb.tab_left), key(&kb.tab_right)));
    text.push_str(&format!(
        "  {} / {} / {} / {}: Home, Tasks, Goals, Calendar\n",
        key(&kb.tab_1),
        key(&kb.tab_2),
        key(&kb.tab_3),
        key(&kb.tab_4)
    ));
    text.push_str(&format!("  {} / {}: Move up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push('\n');

    text.push_str("Tasks and goals:\n");
    text.push_str(&format!("  {}: New task (goal on the Goals tab)\n", key(&kb.new)));
    text.push_str("    title @YYYY-MM-DD [HH:MM] ! sets a due date and a reminder\n");
    text.push_str(&format!("  {}: Edit selected task\n", key(&kb.edit)));
    text.push_str("    Tab / Shift+Tab: next / previous field, Space toggles the reminder\n");
    text.push_str(&format!("  {}: Add a task to the selected goal (Goals tab)\n", key(&kb.add_to_goal)));
    text.push_str(&format!("  {}: Toggle done\n", key(&kb.toggle_task_status)));
    text.push_str(&format!("  {}: Delete selected\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Filter by type (Tasks tab)\n", key(&kb.filter)));
    text.push_str(&format!("  {}: Delete all completed tasks\n", key(&kb.clear_completed)));
    text.push('\n');

    text.push_str("Calendar:\n");
    text.push_str("  h / l: Previous / next day\n");
    text.push_str("  < / >: Previous / next month or week\n");
    text.push_str("  t: Jump to today\n");
    text.push_str(&format!("  {}: Month / week view\n", key(&kb.toggle_calendar_mode)));
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));

    text
}
