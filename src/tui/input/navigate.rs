use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::task_ops::{MoveTarget, MutationOptions, PriorityChange, change_priority, move_task};
use crate::ops::transition::Direction;
use crate::tui::app::{App, ConfirmAction, Mode};
use crate::tui::wizard::Wizard;

use super::dismiss;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            dismiss(app);
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('r') => {
            app.refresh();
        }

        KeyCode::Char('h') | KeyCode::Left => app.move_column(-1),
        KeyCode::Char('l') | KeyCode::Right => app.move_column(1),
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),

        KeyCode::Enter => {
            if app.selected_task().is_some() {
                app.detail_scroll = 0;
                app.mode = Mode::Detail;
            }
        }
        KeyCode::Char('n') => begin_create(app),
        KeyCode::Char('e') => begin_edit(app),
        KeyCode::Char('m') => move_selected(app, Direction::Next),
        KeyCode::Char('M') => move_selected(app, Direction::Prev),
        KeyCode::Char('+') | KeyCode::Char('=') => reprioritize(app, PriorityChange::Raise),
        KeyCode::Char('-') => reprioritize(app, PriorityChange::Lower),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(task) = app.selected_task() {
                app.confirm = Some(ConfirmAction::Delete {
                    id: task.id,
                    title: task.title.clone(),
                });
                app.mode = Mode::Confirm;
            }
        }
        _ => {}
    }
}

pub(super) fn begin_create(app: &mut App) {
    app.wizard = Some(Wizard::create(&app.board.config));
    app.mode = Mode::Wizard;
}

pub(super) fn begin_edit(app: &mut App) {
    if let Some(task) = app.selected_task() {
        app.wizard = Some(Wizard::edit(&app.board.config, task));
        app.mode = Mode::Wizard;
    }
}

fn move_selected(app: &mut App, direction: Direction) {
    let Some(id) = app.selected_task().map(|t| t.id) else {
        return;
    };
    let result = move_task(&app.board, id, &MoveTarget::Relative(direction), &MutationOptions::default());
    app.apply(result);
}

fn reprioritize(app: &mut App, change: PriorityChange) {
    let Some(id) = app.selected_task().map(|t| t.id) else {
        return;
    };
    let result = change_priority(&app.board, id, &change, &MutationOptions::default());
    app.apply(result);
}
