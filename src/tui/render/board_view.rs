use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::task::Task;
use crate::tui::app::{App, Column};
use crate::tui::layout;
use crate::util::unicode::truncate_to_width;

use super::helpers::truncate_spans;

/// Render every column side by side
pub fn render_board(frame: &mut Frame, app: &App, area: Rect) {
    if app.columns.is_empty() {
        let empty = Paragraph::new(" No statuses configured")
            .style(Style::default().fg(app.theme.dim).bg(app.theme.background));
        frame.render_widget(empty, area);
        return;
    }

    let col_w = layout::column_width(area.width, app.columns.len());
    for (ci, column) in app.columns.iter().enumerate() {
        let x = area.x as usize + ci * col_w;
        if x >= (area.x + area.width) as usize {
            break;
        }
        let width = col_w.min((area.x + area.width) as usize - x);
        let rect = Rect::new(x as u16, area.y, width as u16, area.height);
        render_column(frame, app, ci, column, rect);
    }
}

/// "todo (3/5)" or "todo (3)" without a limit
pub fn column_header(column: &Column, limit: Option<usize>) -> String {
    match limit {
        Some(limit) => format!("{} ({}/{})", column.status, column.tasks.len(), limit),
        None => format!("{} ({})", column.status, column.tasks.len()),
    }
}

fn render_column(frame: &mut Frame, app: &App, ci: usize, column: &Column, area: Rect) {
    let bg = app.theme.background;
    let is_active = ci == app.active_col;
    let text_w = layout::card_text_width(area.width as usize);
    let limit = app.board.config.wip_limit(&column.status);

    let mut lines: Vec<Line> = Vec::new();

    let header_color = if limit.is_some_and(|l| column.tasks.len() > l) {
        app.theme.red
    } else if is_active {
        app.theme.highlight
    } else {
        app.theme.text_bright
    };
    let mut header_style = Style::default().fg(header_color).bg(bg);
    if is_active {
        header_style = header_style.add_modifier(Modifier::BOLD);
    }
    lines.push(Line::from(Span::styled(
        format!(" {}", truncate_to_width(&column_header(column, limit), text_w)),
        header_style,
    )));

    let heights = app.card_heights(ci);
    let area_height = area.height as usize;
    let state = column.state;
    let n = layout::visible_count(&heights, state.scroll_off, area_height);
    let (above, below) = state.hidden(&heights, area_height);
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    if above > 0 {
        lines.push(Line::from(Span::styled(format!(" \u{2191} {above} more"), dim)));
    }
    for (row, task) in column.tasks.iter().enumerate().skip(state.scroll_off).take(n) {
        let selected = is_active && row == state.active_row;
        lines.extend(card_lines(app, task, selected, text_w));
    }
    if below > 0 {
        lines.push(Line::from(Span::styled(format!(" \u{2193} {below} more"), dim)));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

/// Lines of one card; always `layout::card_height` lines long.
fn card_lines<'a>(app: &App, task: &Task, selected: bool, width: usize) -> Vec<Line<'a>> {
    let theme = &app.theme;
    let cfg = &app.board.config;
    let row_bg = if selected { theme.selection_bg } else { theme.background };
    let gutter = if selected {
        Span::styled("\u{258E}", Style::default().fg(theme.selection_border).bg(row_bg))
    } else {
        Span::styled(" ", Style::default().bg(row_bg))
    };

    let title_fg = if task.blocked {
        theme.red
    } else if selected {
        theme.text_bright
    } else {
        theme.text
    };
    let title_style = Style::default().fg(title_fg).bg(row_bg);
    let mut lines: Vec<Line> = layout::card_title(task, cfg.tui.title_lines, width)
        .into_iter()
        .map(|text| Line::from(vec![gutter.clone(), Span::styled(text, title_style)]))
        .collect();

    // metadata: age dot, priority, class, assignee, blocked flag, age
    let days = (app.now - task.updated).num_days().max(0);
    let age_color = theme.age_color(days, &cfg.tui.age_thresholds);
    let dim = Style::default().fg(theme.dim).bg(row_bg);
    let mut meta = vec![
        Span::styled("\u{25CF} ", Style::default().fg(age_color).bg(row_bg)),
        Span::styled(
            task.priority.clone(),
            Style::default()
                .fg(theme.priority_color(cfg.priority_index(&task.priority), cfg.priorities.len()))
                .bg(row_bg),
        ),
    ];
    let class = cfg.resolve_class(&task.class);
    if !class.is_empty() && class != cfg.defaults.class {
        meta.push(Span::styled(format!(" {class}"), Style::default().fg(theme.purple).bg(row_bg)));
    }
    if !task.assignee.is_empty() {
        meta.push(Span::styled(format!(" @{}", task.assignee), Style::default().fg(theme.cyan).bg(row_bg)));
    }
    if task.blocked {
        meta.push(Span::styled(" blocked", Style::default().fg(theme.red).bg(row_bg)));
    }
    if cfg.tui.show_duration.get(&task.status).copied().unwrap_or(false) {
        meta.push(Span::styled(format!(" {days}d"), Style::default().fg(age_color).bg(row_bg)));
    }
    truncate_spans(&mut meta, width);
    meta.insert(0, gutter.clone());
    lines.push(Line::from(meta));

    if task.is_claimed() {
        let (text, style) = if task.has_active_claim(app.board.claim_timeout, app.now) {
            (format!("\u{2691} {}", task.claimed_by), Style::default().fg(theme.purple).bg(row_bg))
        } else {
            (format!("\u{2691} {} (expired)", task.claimed_by), dim)
        };
        lines.push(Line::from(vec![gutter, Span::styled(truncate_to_width(&text, width), style)]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::{app_with_tasks, render_app, sample_tasks, task};

    #[test]
    fn headers_show_counts_and_limits() {
        let mut app = app_with_tasks(sample_tasks());
        app.board.config.wip_limits.insert("todo".into(), 5);
        let out = render_app(&mut app, 120, 20);
        let header = out.lines().next().unwrap_or_default();
        assert!(header.contains("backlog (1)"), "{header}");
        assert!(header.contains("todo (3/5)"), "{header}");
        assert!(header.contains("in-progress (0)"), "{header}");
    }

    #[test]
    fn cards_show_id_title_and_meta() {
        let mut app = app_with_tasks(sample_tasks());
        let out = render_app(&mut app, 120, 20);
        assert!(out.contains("#4 Ship release"), "{out}");
        assert!(out.contains("high"), "{out}");
        assert!(out.contains("@alice"), "{out}");
    }

    #[test]
    fn claim_line_and_expiry() {
        let mut tasks = sample_tasks();
        let mut claimed = task(8, "Refactor", "todo", "low");
        claimed.claim("bot-7", claimed.created);
        tasks.push(claimed);
        let mut app = app_with_tasks(tasks);
        let out = render_app(&mut app, 120, 24);
        assert!(out.contains("\u{2691} bot-7"), "{out}");
        assert!(!out.contains("(expired)"));

        app.board.claim_timeout = Some(std::time::Duration::from_secs(3600));
        let out = render_app(&mut app, 120, 24);
        assert!(out.contains("bot-7 (expired)"), "{out}");
    }

    #[test]
    fn scroll_indicators_in_short_terminal() {
        let tasks: Vec<_> = (1..=12).map(|i| task(i, &format!("Task {i}"), "todo", "medium")).collect();
        let mut app = app_with_tasks(tasks);
        app.active_col = 1;
        let out = render_app(&mut app, 120, 12);
        assert!(out.contains("\u{2193}"), "{out}");
        assert!(!out.contains("\u{2191}"), "{out}");

        app.select_last();
        let out = render_app(&mut app, 120, 12);
        assert!(out.contains("\u{2191}"), "{out}");
        assert!(out.contains("#12 Task 12"), "{out}");
        assert!(!out.contains("\u{2193}"), "{out}");
    }

    #[test]
    fn show_duration_adds_age() {
        let mut app = app_with_tasks(sample_tasks());
        app.board.config.tui.show_duration.insert("done".into(), true);
        let out = render_app(&mut app, 120, 20);
        // sample tasks were updated four days before the render clock
        assert!(out.contains("low 4d"), "{out}");
    }

    #[test]
    fn header_text() {
        let app = app_with_tasks(sample_tasks());
        assert_eq!(column_header(&app.columns[1], Some(2)), "todo (3/2)");
        assert_eq!(column_header(&app.columns[0], None), "backlog (1)");
    }
}
