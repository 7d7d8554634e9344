use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::cli::output::format_task_detail;
use crate::model::task::Task;
use crate::tui::app::App;
use crate::tui::layout::clamp_detail_scroll;
use crate::tui::theme::Theme;

/// Label column width used by the field lines
const LABEL_WIDTH: usize = 12;

fn detail_lines(task: &Task, theme: &Theme) -> Vec<Line<'static>> {
    let bg = theme.background;
    let mut raw = format_task_detail(task).into_iter();
    let mut lines = Vec::new();

    if let Some(title) = raw.next() {
        lines.push(Line::from(Span::styled(
            format!(" {title}"),
            Style::default().fg(theme.text_bright).bg(bg).add_modifier(Modifier::BOLD),
        )));
    }
    let mut in_body = false;
    for line in raw {
        if in_body || line.is_empty() {
            in_body = true;
            lines.push(Line::from(Span::styled(format!(" {line}"), Style::default().fg(theme.text).bg(bg))));
            continue;
        }
        let split = line.char_indices().nth(LABEL_WIDTH).map_or(line.len(), |(i, _)| i);
        let (label, value) = line.split_at(split);
        let value_color = match label.trim_end() {
            "blocked:" => theme.red,
            "claimed by:" => theme.purple,
            "tags:" => theme.cyan,
            _ => theme.text,
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {label}"), Style::default().fg(theme.dim).bg(bg)),
            Span::styled(value.to_string(), Style::default().fg(value_color).bg(bg)),
        ]));
    }
    lines
}

/// Render the selected task in full. The scroll offset is clamped here
/// and written back so the next `k` moves up from the real bottom.
pub fn render_detail_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(task) = app.selected_task() else {
        let empty = Paragraph::new(" Task not found")
            .style(Style::default().fg(app.theme.dim).bg(app.theme.background));
        frame.render_widget(empty, area);
        return;
    };
    let lines = detail_lines(task, &app.theme);
    let scroll = clamp_detail_scroll(app.detail_scroll, lines.len(), area.height as usize);
    app.detail_scroll = scroll;

    let visible: Vec<Line> = lines.into_iter().skip(scroll).take(area.height as usize).collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().bg(app.theme.background)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::Mode;
    use crate::tui::render::test_helpers::{app_with_tasks, render_app, sample_tasks};

    #[test]
    fn shows_fields_and_body() {
        let mut tasks = sample_tasks();
        for t in &mut tasks {
            if t.id == 2 {
                t.body = "Users get logged out.\n\nRepro: wait 5 minutes.\n".into();
                t.tags = vec!["auth".into(), "bug".into()];
            }
        }
        let mut app = app_with_tasks(tasks);
        app.select_id(2);
        app.mode = Mode::Detail;
        let out = render_app(&mut app, 80, 24);
        assert!(out.starts_with(" #2 Fix login"), "{out}");
        assert!(out.contains("status:     todo"), "{out}");
        assert!(out.contains("assignee:   alice"), "{out}");
        assert!(out.contains("tags:       auth, bug"), "{out}");
        assert!(out.contains("Repro: wait 5 minutes."), "{out}");
    }

    #[test]
    fn scrolled_detail_hides_title() {
        let mut tasks = sample_tasks();
        for t in &mut tasks {
            if t.id == 2 {
                t.body = (1..=60).map(|i| format!("line {i}\n")).collect();
            }
        }
        let mut app = app_with_tasks(tasks);
        app.select_id(2);
        app.mode = Mode::Detail;
        app.detail_scroll = 3;
        let out = render_app(&mut app, 80, 24);
        assert!(!out.contains("#2 Fix login"), "{out}");
        assert_eq!(app.detail_scroll, 3);
    }
}
