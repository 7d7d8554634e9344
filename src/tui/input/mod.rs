mod confirm;
mod detail;
mod navigate;
mod wizard;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

use confirm::handle_confirm;
use detail::handle_detail;
use navigate::handle_navigate;
use wizard::handle_wizard;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Help overlay swallows the next key
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Detail => handle_detail(app, key),
        Mode::Wizard => handle_wizard(app, key),
        Mode::Confirm => handle_confirm(app, key),
    }
}

/// Esc: the error banner goes first, then the current view.
fn dismiss(app: &mut App) -> bool {
    if app.banner.is_some() {
        app.set_banner(None);
        return true;
    }
    false
}
