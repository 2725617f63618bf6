use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    /// Area inside the outer border
    pub inner_area: Rect,
    pub tabs_area: Rect,
    pub list_area: Rect,
    pub detail_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application.
    /// Width fits a list of 25 columns plus a detail pane of 11.
    /// Height fits tabs, the calendar grid of a six-week month and the status bar.
    pub const MIN_WIDTH: u16 = 38;
    pub const MIN_HEIGHT: u16 = 12;

    pub fn calculate(size: Rect, list_width_percent: u16) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // List takes the configured share, at least 25 columns, and leaves
        // the detail pane at least 10
        let requested_width = (inner_area.width * list_width_percent) / 100;
        let list_width = requested_width
            .max(25)
            .min(inner_area.width.saturating_sub(10));

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(list_width), Constraint::Min(1)])
            .split(vertical[1]);

        Self {
            inner_area,
            tabs_area: vertical[0],
            list_area: horizontal[0],
            detail_area: horizontal[1],
            status_area: vertical[2],
        }
    }

    /// Content area without the list/detail split, used by the home dashboard
    pub fn content_area(&self) -> Rect {
        self.list_area.union(self.detail_area)
    }
}
