use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};
use crate::tui::layout::SCROLL_BOTTOM;

use super::dismiss;
use super::navigate::begin_edit;

pub(super) fn handle_detail(app: &mut App, key: KeyEvent) {
    let page = (app.column_area_height() / 2).max(1);
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (_, KeyCode::Esc) => {
            if !dismiss(app) {
                app.mode = Mode::Navigate;
            }
        }
        (_, KeyCode::Char('?')) => app.show_help = true,
        (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::PageDown) => {
            app.detail_scroll = app.detail_scroll.saturating_add(page);
        }
        (KeyModifiers::CONTROL, KeyCode::Char('u')) | (_, KeyCode::PageUp) => {
            app.detail_scroll = app.detail_scroll.saturating_sub(page);
        }
        (_, KeyCode::Char('j') | KeyCode::Down) => {
            app.detail_scroll = app.detail_scroll.saturating_add(1);
        }
        (_, KeyCode::Char('k') | KeyCode::Up) => {
            app.detail_scroll = app.detail_scroll.saturating_sub(1);
        }
        (_, KeyCode::Char('g') | KeyCode::Home) => app.detail_scroll = 0,
        (_, KeyCode::Char('G') | KeyCode::End) => app.detail_scroll = SCROLL_BOTTOM,
        (_, KeyCode::Char('e')) => begin_edit(app),
        _ => {}
    }
}
