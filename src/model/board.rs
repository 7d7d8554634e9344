use std::path::{Path, PathBuf};
use std::time::Duration;

use super::config::{BoardConfig, CONFIG_FILE};

/// Activity log file inside the board directory
pub const ACTIVITY_FILE: &str = "activity.jsonl";
/// Advisory lock sibling inside the board directory
pub const LOCK_FILE: &str = ".lock";

/// A board: its directory plus the parsed config.yml.
/// Tasks are loaded separately so reads can choose strict or lenient parsing.
#[derive(Debug, Clone)]
pub struct Board {
    /// Directory holding config.yml (usually `.kanban/`)
    pub dir: PathBuf,
    pub config: BoardConfig,
    /// Effective claim timeout: the config value unless overridden
    pub claim_timeout: Option<Duration>,
}

impl Board {
    pub fn new(dir: impl Into<PathBuf>, config: BoardConfig) -> Self {
        // config.yml is validated on load, so a bad timeout never gets here
        let claim_timeout = config.claim_timeout().ok().flatten();
        Board {
            dir: dir.into(),
            config,
            claim_timeout,
        }
    }

    pub fn with_claim_timeout(mut self, timeout: Option<Duration>) -> Self {
        if timeout.is_some() {
            self.claim_timeout = timeout;
        }
        self
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.dir.join(&self.config.tasks_dir)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn activity_path(&self) -> PathBuf {
        self.dir.join(ACTIVITY_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
