use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

use super::helpers::centered_box;

const BINDINGS: &[(&str, &str)] = &[
    ("h/l \u{2190}\u{2192}", "Previous / next column"),
    ("j/k \u{2193}\u{2191}", "Next / previous task"),
    ("g/G", "First / last task"),
    ("Enter", "Open task details"),
    ("n", "New task"),
    ("e", "Edit task"),
    ("m/M", "Move to next / previous status"),
    ("+/-", "Raise / lower priority"),
    ("d", "Delete (archive) task"),
    ("r", "Reload board"),
    ("Esc", "Dismiss error / close view"),
    ("?", "Toggle this help"),
    ("q", "Quit"),
];

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let height = BINDINGS.len() as u16 + 5;
    let overlay_area = centered_box(52, height, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default().fg(app.theme.highlight).bg(bg).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (key, desc) in BINDINGS {
        lines.push(Line::from(vec![
            Span::styled(format!(" {key:<14}"), key_style),
            Span::styled(*desc, desc_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " press any key to close",
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .title(Span::styled(
            " Key Bindings ",
            Style::default().fg(app.theme.text_bright).bg(bg).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

#[cfg(test)]
mod tests {
    use crate::tui::render::test_helpers::{app_with_tasks, render_app, sample_tasks};

    #[test]
    fn lists_bindings() {
        let mut app = app_with_tasks(sample_tasks());
        app.show_help = true;
        let out = render_app(&mut app, 80, 24);
        assert!(out.contains("Key Bindings"), "{out}");
        assert!(out.contains("Move to next / previous status"), "{out}");
        assert!(out.contains("press any key to close"), "{out}");
    }
}
