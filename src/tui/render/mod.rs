pub mod board_view;
pub mod detail_view;
pub mod help_overlay;
mod helpers;
pub mod status_row;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod wizard_popup;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, Mode};

/// Draws the current mode, then any overlay on top
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    app.resize(area.width, area.height);

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: columns | banner (0-1 rows) | status row | key hints
    let banner = u16::from(app.banner.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(banner),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    match app.mode {
        Mode::Detail => detail_view::render_detail_view(frame, app, chunks[0]),
        _ => board_view::render_board(frame, app, chunks[0]),
    }
    if banner > 0 {
        status_row::render_banner(frame, app, chunks[1]);
    }
    status_row::render_status_row(frame, app, chunks[2]);
    status_row::render_key_hints(frame, app, chunks[3]);

    match app.mode {
        Mode::Wizard => wizard_popup::render_wizard(frame, app, area),
        Mode::Confirm => status_row::render_confirm(frame, app, area),
        Mode::Navigate | Mode::Detail => {}
    }

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
}
