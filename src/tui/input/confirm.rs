use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::task_ops::{MutationOptions, delete_task};
use crate::tui::app::{App, ConfirmAction, Mode};

pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            let action = app.confirm.take();
            app.mode = Mode::Navigate;
            if let Some(ConfirmAction::Delete { id, .. }) = action {
                let result = delete_task(&app.board, id, &MutationOptions::default());
                app.apply(result);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.confirm = None;
            app.mode = Mode::Navigate;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::tui::app::Mode;
    use crate::tui::input::handle_key;
    use crate::tui::render::test_helpers::{app_on_disk, key};

    #[test]
    fn y_archives_the_task() {
        let (_tmp, mut app) = app_on_disk();
        app.active_col = 1;
        let id = app.selected_task().map(|t| t.id).expect("todo has tasks");
        let before = app.columns[1].tasks.len();

        handle_key(&mut app, key('d'));
        handle_key(&mut app, key('x'));
        assert_eq!(app.mode, Mode::Confirm);
        handle_key(&mut app, key('y'));

        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.banner.is_none(), "{:?}", app.banner);
        assert_eq!(app.columns[1].tasks.len(), before - 1);
        assert!(app.columns.iter().all(|c| c.tasks.iter().all(|t| t.id != id)));
    }
}
