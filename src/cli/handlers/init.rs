use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::commands::InitArgs;
use crate::cli::output::{OutputFormat, to_json};
use crate::error::{KanbanError, Result};
use crate::io::config_io::init_board;
use crate::model::config::{BoardConfig, DEFAULT_BOARD_DIR};

#[derive(Serialize)]
struct InitJson<'a> {
    board: &'a str,
    dir: PathBuf,
    statuses: &'a [String],
}

/// Parse `status=N`.
fn parse_wip_limit(raw: &str) -> Result<(String, usize)> {
    let invalid = || KanbanError::InvalidInput(format!("invalid --wip-limit {raw:?} (expected STATUS=N)"));
    let (status, limit) = raw.split_once('=').ok_or_else(invalid)?;
    let status = status.trim();
    if status.is_empty() {
        return Err(invalid());
    }
    let limit: usize = limit.trim().parse().map_err(|_| invalid())?;
    Ok((status.to_string(), limit))
}

fn default_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "board".to_string())
}

/// Build the config for a fresh board from `init` flags.
pub(crate) fn build_config(args: &InitArgs, root: &Path) -> Result<BoardConfig> {
    let name = match args.name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => default_name(root),
    };
    let mut config = BoardConfig::new_default(&name);

    let statuses: Vec<String> = args
        .statuses
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !statuses.is_empty() {
        config.statuses = statuses;
    }
    for raw in &args.wip_limits {
        let (status, limit) = parse_wip_limit(raw)?;
        config.wip_limits.insert(status, limit);
    }
    config.validate()?;
    Ok(config)
}

pub fn cmd_init(args: InitArgs, dir: Option<&str>, format: OutputFormat) -> Result<()> {
    let root = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    let config = build_config(&args, &root)?;
    let board_dir = root.join(DEFAULT_BOARD_DIR);
    let board = init_board(&board_dir, &config)?;

    if format.is_json() {
        let out = InitJson {
            board: &board.config.board.name,
            dir: board.dir.clone(),
            statuses: &board.config.statuses,
        };
        println!("{}", to_json(&out)?);
    } else {
        println!(
            "Initialized board {:?} in {}",
            board.config.board.name,
            board.dir.display()
        );
    }
    Ok(())
}
