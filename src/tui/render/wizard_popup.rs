use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::tui::wizard::{TextField, Wizard, WizardStep};
use crate::util::unicode::{byte_offset_to_display_col, display_width, next_grapheme_boundary};

use super::helpers::centered_box;

const LABEL_WIDTH: u16 = 10;
const BODY_ROWS: usize = 4;

/// The slice of `line` to show in `width` cells so the cursor stays in
/// view, and the cursor's column within it.
fn scrolled(line: &str, cursor: usize, width: usize) -> (&str, usize) {
    let col = byte_offset_to_display_col(line, cursor);
    let skip = (col + 1).saturating_sub(width.max(1));
    let mut start = 0;
    let mut skipped = 0;
    while skipped < skip {
        match next_grapheme_boundary(line, start) {
            Some(next) => {
                skipped += display_width(&line[start..next]);
                start = next;
            }
            None => break,
        }
    }
    (&line[start..], col - skipped)
}

/// Render the create/edit wizard centered over the board
pub fn render_wizard(frame: &mut Frame, app: &App, area: Rect) {
    let Some(wizard) = app.wizard.as_ref() else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;
    let popup = centered_box(72, 12, area);
    frame.render_widget(Clear, popup);

    let title = match wizard.editing {
        Some(id) => format!(" Edit #{id} "),
        None => " New task ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.selection_border).bg(bg))
        .title(Span::styled(title, Style::default().fg(theme.text_bright).bg(bg).add_modifier(Modifier::BOLD)))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let field_w = inner.width.saturating_sub(LABEL_WIDTH + 1) as usize;
    let label = |step: WizardStep| {
        let style = if wizard.step == step {
            Style::default().fg(theme.highlight).bg(bg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim).bg(bg)
        };
        Span::styled(format!(" {:<width$}", step.label(), width = LABEL_WIDTH as usize), style)
    };
    let value_style = Style::default().fg(theme.text).bg(bg);

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor: Option<(usize, usize)> = None;

    // title
    let (shown, cx) = scrolled(&wizard.title.text, wizard.title.cursor, field_w);
    if wizard.step == WizardStep::Title {
        cursor = Some((cx, lines.len()));
    }
    lines.push(Line::from(vec![label(WizardStep::Title), Span::styled(shown.to_string(), value_style)]));

    // body: a window of lines around the cursor
    lines.push(Line::from(label(WizardStep::Body)));
    let (body_lines, body_cursor) = body_window(&wizard.body, field_w);
    if wizard.step == WizardStep::Body {
        let (row, col) = body_cursor;
        cursor = Some((col, lines.len() + row));
    }
    for text in body_lines {
        lines.push(Line::from(vec![
            Span::styled(" ".repeat(LABEL_WIDTH as usize + 1), value_style),
            Span::styled(text, value_style),
        ]));
    }

    lines.push(priority_line(wizard, label(WizardStep::Priority), app));

    let (shown, cx) = scrolled(&wizard.tags.text, wizard.tags.cursor, field_w);
    if wizard.step == WizardStep::Tags {
        cursor = Some((cx, lines.len()));
    }
    lines.push(Line::from(vec![label(WizardStep::Tags), Span::styled(shown.to_string(), value_style)]));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " tab next \u{00B7} enter save \u{00B7} alt+enter newline \u{00B7} esc cancel",
        Style::default().fg(theme.dim).bg(bg),
    )));

    frame.render_widget(Paragraph::new(lines), inner);

    if let Some((col, row)) = cursor {
        let x = inner.x + LABEL_WIDTH + 1 + col as u16;
        let y = inner.y + row as u16;
        if x < inner.x + inner.width && y < inner.y + inner.height {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

/// Up to `BODY_ROWS` body lines ending at the cursor line, plus the
/// cursor position within that window.
fn body_window(field: &TextField, width: usize) -> (Vec<String>, (usize, usize)) {
    let all: Vec<&str> = field.text.split('\n').collect();
    let (line_idx, byte_in_line) = field.cursor_line();
    let first = (line_idx + 1).saturating_sub(BODY_ROWS);
    let mut shown = Vec::with_capacity(BODY_ROWS);
    let mut cursor = (0, 0);
    for (i, line) in all.iter().enumerate().skip(first).take(BODY_ROWS) {
        if i == line_idx {
            let (text, col) = scrolled(line, byte_in_line, width);
            cursor = (i - first, col);
            shown.push(text.to_string());
        } else {
            shown.push(line.to_string());
        }
    }
    while shown.len() < BODY_ROWS {
        shown.push(String::new());
    }
    (shown, cursor)
}

fn priority_line<'a>(wizard: &Wizard, label: Span<'a>, app: &App) -> Line<'a> {
    let theme = &app.theme;
    let bg = theme.background;
    let color = theme.priority_color(Some(wizard.priority), wizard.priorities.len());
    Line::from(vec![
        label,
        Span::styled("\u{25C0} ", Style::default().fg(theme.dim).bg(bg)),
        Span::styled(wizard.priority_name().to_string(), Style::default().fg(color).bg(bg)),
        Span::styled(" \u{25B6}", Style::default().fg(theme.dim).bg(bg)),
    ])
}
