use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, ConfirmAction, Mode};
use crate::util::unicode::truncate_to_width;

use super::helpers::{centered_box, spans_width, truncate_spans};

/// One-line error banner
pub fn render_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(message) = app.banner.as_deref() else {
        return;
    };
    let style = Style::default().fg(app.theme.text_bright).bg(app.theme.banner_bg);
    let hint = "  esc dismiss ";
    let width = area.width as usize;
    let mut spans = vec![Span::styled(
        format!(" \u{2717} {}", message.replace('\n', " ")),
        style.add_modifier(Modifier::BOLD),
    )];
    truncate_spans(&mut spans, width.saturating_sub(hint.len()));
    let used = spans_width(&spans);
    spans.push(Span::styled(" ".repeat(width.saturating_sub(used + hint.len())), style));
    spans.push(Span::styled(hint, style));
    frame.render_widget(Paragraph::new(Line::from(spans)).style(style), area);
}

/// Board name and counts on the left, position on the right
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let total: usize = app.columns.iter().map(|c| c.tasks.len()).sum();

    let mut spans = vec![
        Span::styled(
            format!(" {}", app.board.config.board.name),
            Style::default().fg(app.theme.text_bright).bg(bg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" \u{00B7} {total} tasks"), Style::default().fg(app.theme.dim).bg(bg)),
    ];
    if app.skipped_files > 0 {
        spans.push(Span::styled(
            format!(" \u{00B7} {} unreadable", app.skipped_files),
            Style::default().fg(app.theme.yellow).bg(bg),
        ));
    }

    let position = app
        .active_column()
        .map(|c| {
            let row = if c.tasks.is_empty() { 0 } else { c.state.active_row + 1 };
            format!("{} {}/{} ", c.status, row, c.tasks.len())
        })
        .unwrap_or_default();
    let used = spans_width(&spans);
    if used + position.len() < width {
        spans.push(Span::styled(" ".repeat(width - used - position.len()), Style::default().bg(bg)));
        spans.push(Span::styled(position, Style::default().fg(app.theme.dim).bg(bg)));
    } else {
        truncate_spans(&mut spans, width);
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)), area);
}

/// Keys available in the current mode
pub fn key_hints(mode: Mode) -> &'static str {
    match mode {
        Mode::Navigate => {
            "hjkl move \u{00B7} enter open \u{00B7} n new \u{00B7} e edit \u{00B7} m/M status \u{00B7} +/- priority \u{00B7} d delete \u{00B7} ? help \u{00B7} q quit"
        }
        Mode::Detail => "j/k scroll \u{00B7} g/G top/bottom \u{00B7} e edit \u{00B7} esc back \u{00B7} q quit",
        Mode::Wizard => "tab/shift+tab step \u{00B7} enter save \u{00B7} esc cancel",
        Mode::Confirm => "y confirm \u{00B7} n cancel",
    }
}

pub fn render_key_hints(frame: &mut Frame, app: &App, area: Rect) {
    let style = Style::default().fg(app.theme.dim).bg(app.theme.background);
    let text = truncate_to_width(&format!(" {}", key_hints(app.mode)), area.width as usize);
    frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))).style(style), area);
}

/// y/n dialog for the pending action
pub fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let Some(action) = app.confirm.as_ref() else {
        return;
    };
    let bg = app.theme.background;
    let question = match action {
        ConfirmAction::Delete { id, title } => format!("Delete #{id} {title}?"),
    };
    let popup = centered_box(50, 5, area);
    frame.render_widget(Clear, popup);
    let inner_w = popup.width.saturating_sub(4) as usize;
    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", truncate_to_width(&question, inner_w)),
            Style::default().fg(app.theme.text_bright).bg(bg),
        )),
        Line::from(""),
        Line::from(Span::styled(" y delete \u{00B7} n cancel", Style::default().fg(app.theme.dim).bg(bg))),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::{app_with_tasks, render_app, sample_tasks};

    #[test]
    fn banner_and_status_row() {
        let mut app = app_with_tasks(sample_tasks());
        app.set_banner(Some("WIP limit reached for review (2/2)".into()));
        app.active_col = 1;
        let out = render_app(&mut app, 100, 20);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 20);
        assert!(rows[17].contains("\u{2717} WIP limit reached for review (2/2)"), "{out}");
        assert!(rows[17].contains("esc dismiss"));
        assert!(rows[18].contains("Test \u{00B7} 5 tasks"), "{out}");
        assert!(rows[18].ends_with("todo 1/3"), "{out}");
        assert!(rows[19].starts_with(" hjkl move"), "{out}");
    }

    #[test]
    fn unreadable_files_flagged() {
        let mut app = app_with_tasks(sample_tasks());
        app.skipped_files = 2;
        let out = render_app(&mut app, 100, 20);
        assert!(out.contains("2 unreadable"), "{out}");
    }

    #[test]
    fn confirm_dialog_names_task() {
        let mut app = app_with_tasks(sample_tasks());
        app.confirm = Some(ConfirmAction::Delete {
            id: 4,
            title: "Ship release".into(),
        });
        app.mode = Mode::Confirm;
        let out = render_app(&mut app, 80, 24);
        assert!(out.contains("Delete #4 Ship release?"), "{out}");
        assert!(out.contains("y delete"), "{out}");
        assert!(out.ends_with("y confirm \u{00B7} n cancel"), "{out}");
    }

    #[test]
    fn hints_per_mode() {
        assert!(key_hints(Mode::Detail).contains("esc back"));
        assert!(key_hints(Mode::Wizard).contains("enter save"));
    }
}
