use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;
use ratatui::Frame;

use crate::tui::app::Tab;
use crate::tui::widgets::color::{get_contrast_text_color, Palette};

pub fn render_tabs(f: &mut Frame, area: Rect, current_tab: Tab, palette: &Palette) {
    let tab_fg = get_contrast_text_color(palette.tab_bg);

    // Padded labels on the tab background read as boxes
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            Line::from(vec![
                Span::styled(" ", Style::default().bg(palette.tab_bg)),
                Span::styled(format!("{} {}", i + 1, tab.title()), Style::default().fg(tab_fg).bg(palette.tab_bg)),
                Span::styled(" ", Style::default().bg(palette.tab_bg)),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(current_tab.index())
        .style(palette.base())
        .highlight_style(palette.highlight())
        .divider("  ")
        .padding("", "");

    f.render_widget(tabs, area);
}
