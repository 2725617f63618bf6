use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use tracing::info;

use crate::tui::app::{Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::App;
use crate::utils::{has_primary_modifier, parse_key_binding, ParsedKeyBinding};

/// Restores the terminal when dropped, panics included.
/// A terminal left in raw mode or on the alternate screen is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore on normal exit; drop does nothing afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already cleaning up, errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Checked before entering the alternate screen so the message stays visible
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    info!("tui started");

    loop {
        app.refresh()?;
        app.process_events();
        app.check_status_message_timeout();

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect, app.config.sidebar_width_percent);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events; Windows also reports Release
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    info!("tui stopped");
    Ok(())
}

/// Route a key press by mode. Returns true when the app should quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match app.mode {
        Mode::Help => {
            handle_help_mode(app, key_event)?;
            Ok(false)
        }
        Mode::ConfirmDelete => {
            handle_delete_confirmation_modal(app, key_event);
            Ok(false)
        }
        Mode::QuickAdd => {
            handle_quick_add_mode(app, key_event);
            Ok(false)
        }
        Mode::EditTask => {
            handle_edit_mode(app, key_event);
            Ok(false)
        }
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn binding(key: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key).map_err(TuiError::KeyBindingError)
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Ctrl on Windows/Linux, Option/Alt on macOS
    if binding.requires_ctrl != has_primary_modifier(key_event.modifiers) {
        return false;
    }
    binding.key_code == key_event.code
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<(), TuiError> {
    let help = binding(&app.config.key_bindings.help)?;
    if key_event.code == KeyCode::Esc || matches_key_event(key_event, &help) {
        app.mode = Mode::View;
    }
    Ok(())
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            app.delete_modal_selection = 1 - app.delete_modal_selection.min(1);
        }
        KeyCode::Char('y') => {
            app.delete_modal_selection = 0;
            app.confirm_delete();
        }
        KeyCode::Enter => app.confirm_delete(),
        KeyCode::Esc | KeyCode::Char('n') => app.cancel_delete(),
        _ => {}
    }
}

fn handle_quick_add_mode(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Enter => app.submit_quick_add(),
        KeyCode::Esc => app.cancel_quick_add(),
        KeyCode::Backspace => {
            if let Some(state) = app.quick_add.as_mut() {
                state.input.pop();
            }
        }
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => {
            if let Some(state) = app.quick_add.as_mut() {
                state.input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_edit_mode(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Enter => app.submit_edit(),
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.task_form.as_mut() {
                form.current_field = form.current_field.next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.task_form.as_mut() {
                form.current_field = form.current_field.previous();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.task_form.as_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => {
            if let Some(form) = app.task_form.as_mut() {
                form.input_char(c);
            }
        }
        _ => {}
    }
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();

    if matches_key_event(key_event, &binding(&kb.quit)?) {
        return Ok(true);
    }
    if matches_key_event(key_event, &binding(&kb.help)?) {
        app.mode = Mode::Help;
        return Ok(false);
    }

    let tab_keys = [&kb.tab_1, &kb.tab_2, &kb.tab_3, &kb.tab_4];
    for (tab, key) in Tab::ALL.iter().zip(tab_keys) {
        if matches_key_event(key_event, &binding(key)?) {
            app.switch_tab(*tab);
            return Ok(false);
        }
    }
    if matches_key_event(key_event, &binding(&kb.tab_left)?) {
        app.switch_tab(app.current_tab.previous());
        return Ok(false);
    }
    if matches_key_event(key_event, &binding(&kb.tab_right)?) {
        app.switch_tab(app.current_tab.next());
        return Ok(false);
    }

    if matches_key_event(key_event, &binding(&kb.list_up)?) || key_event.code == KeyCode::Up {
        app.move_selection_up();
        return Ok(false);
    }
    if matches_key_event(key_event, &binding(&kb.list_down)?) || key_event.code == KeyCode::Down {
        app.move_selection_down();
        return Ok(false);
    }

    if app.current_tab == Tab::Home {
        return Ok(false);
    }

    if matches_key_event(key_event, &binding(&kb.new)?) {
        app.start_quick_add();
    } else if app.current_tab == Tab::Goals && matches_key_event(key_event, &binding(&kb.add_to_goal)?) {
        app.start_goal_task();
    } else if app.current_tab != Tab::Goals && matches_key_event(key_event, &binding(&kb.edit)?) {
        app.start_edit();
    } else if matches_key_event(key_event, &binding(&kb.toggle_task_status)?) {
        app.toggle_selected();
    } else if matches_key_event(key_event, &binding(&kb.clear_completed)?) {
        if app.current_tab == Tab::Tasks {
            app.request_clear_completed();
        }
    } else if matches_key_event(key_event, &binding(&kb.delete)?) {
        app.request_delete();
    } else if app.current_tab == Tab::Tasks && matches_key_event(key_event, &binding(&kb.filter)?) {
        app.cycle_task_filter();
    } else if app.current_tab == Tab::Calendar {
        handle_calendar_keys(app, key_event, &binding(&kb.toggle_calendar_mode)?);
    }
    Ok(false)
}

fn handle_calendar_keys(app: &mut App, key_event: KeyEvent, toggle_mode: &ParsedKeyBinding) {
    if matches_key_event(key_event, toggle_mode) {
        app.calendar.toggle_mode();
        return;
    }
    match key_event.code {
        KeyCode::Char('h') => app.calendar.shift_days(-1),
        KeyCode::Char('l') => app.calendar.shift_days(1),
        KeyCode::Char('<') | KeyCode::PageUp => app.calendar.previous_period(),
        KeyCode::Char('>') | KeyCode::PageDown => app.calendar.next_period(),
        KeyCode::Char('t') => app.calendar.select(chrono::Local::now().date_naive()),
        _ => return,
    }
    app.agenda_list_state.select(Some(0));
}
