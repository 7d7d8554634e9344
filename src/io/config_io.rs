use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{KanbanError, Result};
use crate::io::atomic::atomic_write;
use crate::model::board::Board;
use crate::model::config::{BoardConfig, CONFIG_FILE, DEFAULT_BOARD_DIR, parse_duration};

/// Board directory for `dir`: `dir` itself when it holds config.yml,
/// otherwise `dir/.kanban` when that holds one.
fn board_dir_at(dir: &Path) -> Option<PathBuf> {
    if dir.join(CONFIG_FILE).is_file() {
        return Some(dir.to_path_buf());
    }
    let nested = dir.join(DEFAULT_BOARD_DIR);
    if nested.join(CONFIG_FILE).is_file() {
        return Some(nested);
    }
    None
}

/// Walk upward from `start` until a board directory is found.
pub fn find_board(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if let Some(dir) = board_dir_at(&current) {
            debug!(board = %dir.display(), "found board");
            return Ok(dir);
        }
        if !current.pop() {
            return Err(KanbanError::BoardNotFound(start.to_path_buf()));
        }
    }
}

/// Resolve the board directory from an explicit `--dir` or by discovery
/// from the working directory.
pub fn resolve_board_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => board_dir_at(dir).ok_or_else(|| KanbanError::BoardNotFound(dir.to_path_buf())),
        None => {
            let cwd = std::env::current_dir()?;
            find_board(&cwd)
        }
    }
}

/// Read and validate `<dir>/config.yml`.
pub fn load_config(dir: &Path) -> Result<BoardConfig> {
    let path = dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| KanbanError::Read {
        path: path.clone(),
        source: e,
    })?;
    let config: BoardConfig =
        serde_yaml::from_str(&text).map_err(|e| KanbanError::Config { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// Serialize the config atomically.
pub fn save_config(dir: &Path, config: &BoardConfig) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    let text = serde_yaml::to_string(config)?;
    atomic_write(&path, text.as_bytes()).map_err(|e| KanbanError::Write { path, source: e })
}

/// Load the board at `dir` (which must contain config.yml).
pub fn load_board(dir: &Path) -> Result<Board> {
    let config = load_config(dir)?;
    Ok(Board::new(dir, config))
}

/// Locate and load a board for a front-end: explicit `dir` or discovery,
/// then an optional claim-timeout override such as `30m`.
pub fn open_board(dir: Option<&Path>, claim_timeout: Option<&str>) -> Result<Board> {
    let board = load_board(&resolve_board_dir(dir)?)?;
    let timeout = match claim_timeout.map(str::trim) {
        Some(s) if !s.is_empty() => Some(parse_duration(s)?),
        _ => None,
    };
    Ok(board.with_claim_timeout(timeout))
}

/// Create a new board directory with config.yml and an empty tasks dir.
pub fn init_board(dir: &Path, config: &BoardConfig) -> Result<Board> {
    if dir.join(CONFIG_FILE).exists() {
        return Err(KanbanError::InvalidInput(format!(
            "board already exists at {}",
            dir.display()
        )));
    }
    config.validate()?;
    let tasks_dir = dir.join(&config.tasks_dir);
    fs::create_dir_all(&tasks_dir).map_err(|e| KanbanError::Write {
        path: tasks_dir.clone(),
        source: e,
    })?;
    save_config(dir, config)?;
    Ok(Board::new(dir, config.clone()))
}
