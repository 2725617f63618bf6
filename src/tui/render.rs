use ratatui::layout::Alignment;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::tui::app::{Mode, Tab};
use crate::tui::widgets::{
    calendar::render_calendar,
    confirm_delete::render_confirm_delete,
    detail::{goal_detail_lines, render_detail, task_detail_lines},
    goal_list::render_goal_list,
    help::render_help,
    home::render_home,
    quick_add::render_quick_add,
    status_bar::render_status_bar,
    tabs::render_tabs,
    task_form::render_task_form,
    task_list::render_task_list,
};
use crate::tui::{App, Layout};

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let palette = app.palette;

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("goaldo")
        .title_alignment(Alignment::Center)
        .style(palette.base());
    f.render_widget(outer_block, f.area());

    render_tabs(f, layout.tabs_area, app.current_tab, &palette);

    match app.current_tab {
        Tab::Home => render_home(f, layout.content_area(), &app.summary, &palette),
        Tab::Tasks => {
            let title = format!("Tasks: {}", app.filter_label());
            render_task_list(f, layout.list_area, &title, &app.tasks, &mut app.task_list_state, &palette);
        }
        Tab::Goals => {
            render_goal_list(f, layout.list_area, &app.goals, &mut app.goal_list_state, &palette);
        }
        Tab::Calendar => {
            let agenda = app.agenda_tasks();
            let mut state = app.agenda_list_state.clone();
            render_calendar(f, layout.list_area, &app.calendar, &agenda, &mut state, &palette);
            app.agenda_list_state = state;
        }
    }

    if app.current_tab != Tab::Home {
        render_selection_detail(f, app, layout);
    }

    let hints = app.key_hints();
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &hints, &palette);

    match app.mode {
        Mode::Help => render_help(f, f.area(), &app.config, &palette),
        Mode::ConfirmDelete => {
            if let Some(target) = &app.pending_delete {
                render_confirm_delete(f, f.area(), target, app.delete_modal_selection, &palette);
            }
        }
        Mode::QuickAdd => {
            if let Some(state) = &app.quick_add {
                render_quick_add(f, f.area(), state, &palette);
            }
        }
        Mode::EditTask => {
            if let Some(form) = &app.task_form {
                render_task_form(f, f.area(), form, &palette);
            }
        }
        Mode::View => {}
    }
}

fn render_selection_detail(f: &mut Frame, app: &App, layout: &Layout) {
    let palette = &app.palette;
    let lines = if let Some(goal) = app.selected_goal() {
        goal_detail_lines(goal, palette)
    } else if let Some(task) = app.selected_task() {
        let mut lines = task_detail_lines(task, app.goal_title(task.goal_id), palette);
        if !app.subtasks.is_empty() {
            let done = app.subtasks.iter().filter(|s| s.is_completed).count();
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Checklist {}/{}", done, app.subtasks.len()),
                palette.muted(),
            )));
            for subtask in &app.subtasks {
                let mark = if subtask.is_completed { "[x]" } else { "[ ]" };
                lines.push(Line::from(Span::styled(
                    format!("{} {}", mark, subtask.title),
                    palette.base(),
                )));
            }
        }
        lines
    } else {
        vec![Line::from(Span::styled("Nothing selected", palette.muted()))]
    };
    render_detail(f, layout.detail_area, lines, palette);
}
