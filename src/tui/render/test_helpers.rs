use chrono::{DateTime, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::io::config_io::{init_board, load_board};
use crate::model::board::Board;
use crate::model::config::BoardConfig;
use crate::model::task::Task;
use crate::ops::task_ops::{NewTask, create_task};
use crate::tui::app::App;
use crate::tui::input::handle_key;
use crate::tui::render;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Render the whole app at `w`×`h`.
pub fn render_app(app: &mut App, w: u16, h: u16) -> String {
    render_to_string(w, h, |frame, _| render::render(frame, app))
}

/// Fixed clock: sample tasks were all touched on this day
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, d, 9, 0, 0).unwrap()
}

pub fn task(id: u32, title: &str, status: &str, priority: &str) -> Task {
    Task::new(id, title.into(), status.into(), priority.into(), day(1))
}

/// backlog: #1 · todo: #2 #3 #4(high) · done: #5
pub fn sample_tasks() -> Vec<Task> {
    let mut login = task(2, "Fix login", "todo", "medium");
    login.assignee = "alice".into();
    vec![
        task(1, "Plan roadmap", "backlog", "medium"),
        login,
        task(3, "Write tests", "todo", "medium"),
        task(4, "Ship release", "todo", "high"),
        task(5, "Set up CI", "done", "low"),
    ]
}

/// An in-memory app on the default five-status board, rendered at 80×24
/// with the clock four days after the tasks were written.
pub fn app_with_tasks(tasks: Vec<Task>) -> App {
    let board = Board::new("/tmp/kanban-test/.kanban", BoardConfig::new_default("Test"));
    let mut app = App::new(board);
    app.now = day(5);
    app.set_tasks(tasks);
    app
}

/// The sample tasks written to a real board in a temp dir.
pub fn app_on_disk() -> (TempDir, App) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".kanban");
    init_board(&dir, &BoardConfig::new_default("Test")).unwrap();
    let mut board = load_board(&dir).unwrap();
    for t in sample_tasks() {
        let created = create_task(
            &mut board,
            NewTask {
                title: t.title.clone(),
                status: Some(t.status.clone()),
                priority: Some(t.priority.clone()),
                assignee: t.assignee.clone(),
                ..NewTask::default()
            },
        )
        .unwrap();
        assert_eq!(created.id, t.id);
    }
    let mut app = App::new(board);
    app.reload().unwrap();
    (tmp, app)
}

pub fn key(c: char) -> KeyEvent {
    KeyEvent::from(KeyCode::Char(c))
}

pub fn type_str(app: &mut App, text: &str) {
    for c in text.chars() {
        handle_key(app, key(c));
    }
}
