use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::KanbanError;
use crate::ops::task_ops::{MutationOptions, create_task, edit_task};
use crate::tui::app::{App, Mode};
use crate::tui::wizard::WizardStep;

pub(super) fn handle_wizard(app: &mut App, key: KeyEvent) {
    let Some(wizard) = app.wizard.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };

    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => close(app),
        (_, KeyCode::Tab) => wizard.step = wizard.step.next(),
        (_, KeyCode::BackTab) => wizard.step = wizard.step.prev(),

        // newline inside the body; plain Enter submits
        (m, KeyCode::Enter) if wizard.step == WizardStep::Body && m.contains(KeyModifiers::ALT) => {
            wizard.body.insert('\n');
        }
        (KeyModifiers::CONTROL, KeyCode::Char('j')) if wizard.step == WizardStep::Body => {
            wizard.body.insert('\n');
        }
        (_, KeyCode::Enter) => submit(app),

        (_, KeyCode::Left | KeyCode::Char('h')) if wizard.step == WizardStep::Priority => {
            wizard.cycle_priority(-1);
        }
        (_, KeyCode::Right | KeyCode::Char('l')) if wizard.step == WizardStep::Priority => {
            wizard.cycle_priority(1);
        }

        (m, code) => {
            let Some(field) = wizard.field_mut() else {
                return;
            };
            match code {
                KeyCode::Char(c) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => field.insert(c),
                KeyCode::Backspace => field.backspace(),
                KeyCode::Delete => field.delete(),
                KeyCode::Left => field.left(),
                KeyCode::Right => field.right(),
                KeyCode::Home => field.home(),
                KeyCode::End => field.end(),
                _ => {}
            }
        }
    }
}

fn close(app: &mut App) {
    app.wizard = None;
    app.mode = Mode::Navigate;
}

/// Create or edit. An empty title cancels; on failure the wizard stays
/// open with the error in the banner.
fn submit(app: &mut App) {
    let Some(wizard) = app.wizard.clone() else {
        return;
    };
    if wizard.is_blank() {
        close(app);
        return;
    }

    match wizard.editing {
        None => {
            let result = create_task(&mut app.board, wizard.to_new_task());
            if let Some(task) = app.apply(result) {
                close(app);
                app.select_id(task.id);
            }
        }
        Some(id) => {
            let current = app
                .columns
                .iter()
                .flat_map(|c| c.tasks.iter())
                .find(|t| t.id == id)
                .cloned();
            let Some(task) = current else {
                app.show_error(&KanbanError::TaskNotFound(id));
                close(app);
                return;
            };
            let result = edit_task(&app.board, id, wizard.to_edit(&task), &MutationOptions::default());
            if app.apply(result).is_some() {
                close(app);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::io::task_io::find_by_id;
    use crate::tui::app::Mode;
    use crate::tui::input::handle_key;
    use crate::tui::render::test_helpers::{app_on_disk, key, type_str};
    use crate::tui::wizard::WizardStep;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn create_walks_steps_and_submits() {
        let (_tmp, mut app) = app_on_disk();
        handle_key(&mut app, key('n'));
        assert_eq!(app.mode, Mode::Wizard);

        type_str(&mut app, "Write docs");
        handle_key(&mut app, press(KeyCode::Tab));
        type_str(&mut app, "First line");
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        type_str(&mut app, "second");
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.wizard.as_ref().map(|w| w.step), Some(WizardStep::Priority));
        handle_key(&mut app, press(KeyCode::Right));
        handle_key(&mut app, press(KeyCode::Tab));
        type_str(&mut app, "docs, ux");
        handle_key(&mut app, press(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.banner.is_none(), "{:?}", app.banner);
        let task = app.selected_task().expect("new task selected").clone();
        assert_eq!(task.title, "Write docs");
        assert_eq!(task.priority, "high");
        assert_eq!(task.tags, vec!["docs", "ux"]);
        assert_eq!(task.body.trim_end(), "First line\nsecond");
        assert_eq!(task.status, "backlog");
    }

    #[test]
    fn shift_tab_goes_back() {
        let (_tmp, mut app) = app_on_disk();
        handle_key(&mut app, key('n'));
        handle_key(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.wizard.as_ref().map(|w| w.step), Some(WizardStep::Tags));
    }

    #[test]
    fn empty_title_cancels_without_writing() {
        let (_tmp, mut app) = app_on_disk();
        let before: usize = app.columns.iter().map(|c| c.tasks.len()).sum();
        handle_key(&mut app, key('n'));
        type_str(&mut app, "   ");
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.wizard.is_none());
        app.refresh();
        let after: usize = app.columns.iter().map(|c| c.tasks.len()).sum();
        assert_eq!(before, after);
    }

    #[test]
    fn edit_renames_file_with_title() {
        let (_tmp, mut app) = app_on_disk();
        app.active_col = 1;
        let id = app.selected_task().map(|t| t.id).expect("selected");
        let old_file = app.selected_task().and_then(|t| t.file.clone()).expect("loaded from disk");

        handle_key(&mut app, key('e'));
        for _ in 0..40 {
            handle_key(&mut app, press(KeyCode::Backspace));
        }
        type_str(&mut app, "Renamed task");
        handle_key(&mut app, press(KeyCode::Enter));

        assert!(app.banner.is_none(), "{:?}", app.banner);
        let task = find_by_id(&app.board.tasks_dir(), id).unwrap();
        assert_eq!(task.title, "Renamed task");
        let new_file = task.file.expect("path");
        assert!(new_file.to_string_lossy().ends_with("renamed-task.md"));
        assert!(!old_file.exists());
    }

    #[test]
    fn esc_discards_wizard() {
        let (_tmp, mut app) = app_on_disk();
        handle_key(&mut app, key('n'));
        type_str(&mut app, "Draft");
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.wizard.is_none());
    }
}
