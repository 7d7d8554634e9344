use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, warn};

use crate::error::{KanbanError, Result};
use crate::io::config_io::{load_config, open_board};
use crate::io::task_io::read_all_lenient;
use crate::io::watcher::{BoardWatcher, CancelToken};
use crate::model::board::Board;
use crate::model::now;
use crate::model::task::Task;

use super::input;
use super::layout::{self, ColumnState};
use super::render;
use super::theme::Theme;
use super::wizard::Wizard;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Full view of the selected task
    Detail,
    /// Create or edit wizard
    Wizard,
    Confirm,
}

/// Action waiting for a y/n answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Delete { id: u32, title: String },
}

/// One status column and the tasks in it, in display order
#[derive(Debug, Clone)]
pub struct Column {
    pub status: String,
    pub tasks: Vec<Task>,
    pub state: ColumnState,
}

/// Main application state
pub struct App {
    pub board: Board,
    pub columns: Vec<Column>,
    pub active_col: usize,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    /// Scroll offset of the detail view; may hold `SCROLL_BOTTOM` until
    /// the next render clamps it
    pub detail_scroll: usize,
    pub wizard: Option<Wizard>,
    pub confirm: Option<ConfirmAction>,
    pub show_help: bool,
    /// Last error, shown until dismissed or until a mutation succeeds
    pub banner: Option<String>,
    /// Task files skipped by the last reload
    pub skipped_files: usize,
    /// Terminal size from the last draw
    pub width: u16,
    pub height: u16,
    /// Clock used for card ages; refreshed on reload
    pub now: DateTime<Utc>,
}

impl App {
    pub fn new(board: Board) -> Self {
        let theme = Theme::from_config(&board.config.tui);
        App {
            board,
            columns: Vec::new(),
            active_col: 0,
            mode: Mode::Navigate,
            should_quit: false,
            theme,
            detail_scroll: 0,
            wizard: None,
            confirm: None,
            show_help: false,
            banner: None,
            skipped_files: 0,
            width: 80,
            height: 24,
            now: now(),
        }
    }

    /// Build columns from a task list, keeping the selection on the same
    /// task id when it is still on the board.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        let keep_id = self.selected_task().map(|t| t.id);
        let keep_status = self.columns.get(self.active_col).map(|c| c.status.clone());
        let old_states: Vec<(String, ColumnState)> =
            self.columns.iter().map(|c| (c.status.clone(), c.state)).collect();

        let cfg = &self.board.config;
        let mut columns: Vec<Column> = cfg
            .statuses
            .iter()
            .map(|status| Column {
                status: status.clone(),
                tasks: Vec::new(),
                state: old_states
                    .iter()
                    .find(|(s, _)| s == status)
                    .map(|(_, st)| *st)
                    .unwrap_or_default(),
            })
            .collect();
        for task in tasks {
            if let Some(col) = columns.iter_mut().find(|c| c.status == task.status) {
                col.tasks.push(task);
            }
        }
        for col in &mut columns {
            // class of service first, then highest priority, then oldest id
            col.tasks.sort_by(|a, b| {
                cfg.class_rank(&a.class)
                    .cmp(&cfg.class_rank(&b.class))
                    .then_with(|| cfg.priority_index(&b.priority).cmp(&cfg.priority_index(&a.priority)))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        if cfg.tui.hide_empty_columns && columns.iter().any(|c| !c.tasks.is_empty()) {
            columns.retain(|c| !c.tasks.is_empty());
        }
        self.columns = columns;

        let located = keep_id.and_then(|id| {
            self.columns.iter().enumerate().find_map(|(ci, col)| {
                col.tasks.iter().position(|t| t.id == id).map(|row| (ci, row))
            })
        });
        if let Some((ci, row)) = located {
            self.active_col = ci;
            self.columns[ci].state.active_row = row;
        } else if let Some(ci) = keep_status.and_then(|s| self.columns.iter().position(|c| c.status == s)) {
            self.active_col = ci;
        }
        self.active_col = self.active_col.min(self.columns.len().saturating_sub(1));
        for ci in 0..self.columns.len() {
            self.fit_column(ci);
        }
    }

    /// Re-read config.yml and every task file.
    pub fn reload(&mut self) -> Result<()> {
        let config = load_config(&self.board.dir)?;
        self.board.config = config;
        self.theme = Theme::from_config(&self.board.config.tui);
        let (tasks, warnings) = read_all_lenient(&self.board.tasks_dir())?;
        for w in &warnings {
            warn!(file = %w.file.display(), error = %w.error, "skipping malformed task file");
        }
        self.skipped_files = warnings.len();
        self.now = now();
        debug!(tasks = tasks.len(), "board reloaded");
        self.set_tasks(tasks);
        if self.mode == Mode::Detail && self.selected_task().is_none() {
            self.mode = Mode::Navigate;
        }
        Ok(())
    }

    /// Reload, reporting a failure in the banner.
    pub fn refresh(&mut self) {
        if let Err(err) = self.reload() {
            self.set_banner(Some(err.to_string()));
        }
    }

    /// Record the result of a mutation: success clears the banner and
    /// reloads, failure shows the message and leaves the selection alone.
    pub fn apply<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.banner = None;
                self.refresh();
                Some(value)
            }
            Err(err) => {
                self.show_error(&err);
                None
            }
        }
    }

    pub fn show_error(&mut self, err: &KanbanError) {
        debug!(code = err.code(), "mutation failed");
        self.set_banner(Some(err.to_string()));
    }

    // -----------------------------------------------------------------------
    // Selection and geometry
    // -----------------------------------------------------------------------

    pub fn active_column(&self) -> Option<&Column> {
        self.columns.get(self.active_col)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let col = self.active_column()?;
        col.tasks.get(col.state.active_row)
    }

    /// Lines available to a column, header included
    pub fn column_area_height(&self) -> usize {
        (self.height as usize).saturating_sub(layout::chrome_height(self.banner.is_some()))
    }

    pub fn card_width(&self) -> usize {
        layout::card_text_width(layout::column_width(self.width, self.columns.len()))
    }

    pub fn card_heights(&self, ci: usize) -> Vec<usize> {
        let title_lines = self.board.config.tui.title_lines;
        let width = self.card_width();
        self.columns
            .get(ci)
            .map(|col| {
                col.tasks
                    .iter()
                    .map(|t| layout::card_height(t, title_lines, width))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Re-run selection tracking for one column after its contents or
    /// the terminal size changed.
    pub fn fit_column(&mut self, ci: usize) {
        let heights = self.card_heights(ci);
        let area = self.column_area_height();
        if let Some(col) = self.columns.get_mut(ci) {
            col.state.ensure_visible(&heights, area);
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        for ci in 0..self.columns.len() {
            self.fit_column(ci);
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let heights = self.card_heights(self.active_col);
        let area = self.column_area_height();
        if let Some(col) = self.columns.get_mut(self.active_col) {
            col.state.move_by(delta, &heights, area);
        }
    }

    pub fn select_first(&mut self) {
        let heights = self.card_heights(self.active_col);
        let area = self.column_area_height();
        if let Some(col) = self.columns.get_mut(self.active_col) {
            col.state.first(&heights, area);
        }
    }

    pub fn select_last(&mut self) {
        let heights = self.card_heights(self.active_col);
        let area = self.column_area_height();
        if let Some(col) = self.columns.get_mut(self.active_col) {
            col.state.last(&heights, area);
        }
    }

    /// Select the task with `id` if it is on the board.
    pub fn select_id(&mut self, id: u32) {
        let found = self.columns.iter().enumerate().find_map(|(ci, col)| {
            col.tasks.iter().position(|t| t.id == id).map(|row| (ci, row))
        });
        if let Some((ci, row)) = found {
            self.active_col = ci;
            self.columns[ci].state.active_row = row;
            self.fit_column(ci);
        }
    }

    pub fn move_column(&mut self, delta: isize) {
        if self.columns.is_empty() {
            return;
        }
        let last = self.columns.len() - 1;
        self.active_col = self.active_col.saturating_add_signed(delta).min(last);
        self.fit_column(self.active_col);
    }

    /// Show or hide the banner line, keeping selections on screen.
    pub fn set_banner(&mut self, banner: Option<String>) {
        self.banner = banner;
        for ci in 0..self.columns.len() {
            self.fit_column(ci);
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal loop
// ---------------------------------------------------------------------------

/// Run the TUI against the board found from `dir` (or the working directory).
pub fn run(dir: Option<&str>, claim_timeout: Option<&str>) -> Result<()> {
    let board = open_board(dir.map(Path::new), claim_timeout)?;
    let board_dir = board.dir.clone();
    let mut app = App::new(board);
    app.reload()?;

    let cancel = CancelToken::new();
    let watcher = match BoardWatcher::start(&board_dir, cancel.clone()) {
        Ok(w) => Some(w),
        Err(err) => {
            warn!(error = %err, "file watching unavailable; press r to reload");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    cancel.cancel();
    drop(watcher);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&BoardWatcher>,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        app.resize(size.width, size.height);
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }

        if watcher.is_some_and(BoardWatcher::poll) {
            app.refresh();
        }
    }
    Ok(())
}
