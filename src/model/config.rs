use std::collections::HashSet;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::task::ARCHIVED;
use crate::error::KanbanError;

/// Name of the config file inside the board directory
pub const CONFIG_FILE: &str = "config.yml";
/// Default board directory name created by `init`
pub const DEFAULT_BOARD_DIR: &str = ".kanban";
/// Class used when a task has no class and no default is configured
pub const STANDARD_CLASS: &str = "standard";

/// Board configuration from config.yml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default = "default_tasks_dir")]
    pub tasks_dir: String,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassConfig>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub wip_limits: IndexMap<String, usize>,
    /// Statuses that need an active claim to enter. Absent means every
    /// active status (see [`BoardConfig::active_statuses`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_claim_for: Option<Vec<String>>,
    /// Claims older than this are treated as expired, e.g. `1h`, `30m`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub claim_timeout: String,
    #[serde(default = "default_next_id")]
    pub next_id: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A class of service: an ordering slot plus three independent capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bypass_column_wip: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require_claim_for: Vec<String>,
}

impl ClassConfig {
    pub fn named(name: &str) -> Self {
        ClassConfig {
            name: name.to_string(),
            wip_limit: None,
            bypass_column_wip: false,
            require_claim_for: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Initial status for new tasks; empty means the first configured status
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Wrapped title lines shown per card
    #[serde(default = "default_title_lines")]
    pub title_lines: usize,
    #[serde(default)]
    pub hide_empty_columns: bool,
    /// Card age (days since last update) at which the age colour steps
    /// from fresh → aging → stale → old
    #[serde(default = "default_age_thresholds")]
    pub age_thresholds: Vec<u32>,
    /// Per-status flag: show time spent in that status on cards
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub show_duration: IndexMap<String, bool>,
    /// Theme overrides, e.g. `highlight: "#FB4196"`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub colors: IndexMap<String, String>,
}

impl Default for TuiConfig {
    fn default() -> Self {
        TuiConfig {
            title_lines: default_title_lines(),
            hide_empty_columns: false,
            age_thresholds: default_age_thresholds(),
            show_duration: IndexMap::new(),
            colors: IndexMap::new(),
        }
    }
}

fn default_tasks_dir() -> String {
    "tasks".to_string()
}

fn default_next_id() -> u32 {
    1
}

fn default_title_lines() -> usize {
    1
}

fn default_age_thresholds() -> Vec<u32> {
    vec![1, 3, 7]
}

impl BoardConfig {
    /// Defaults written by `init`
    pub fn new_default(name: &str) -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        BoardConfig {
            board: BoardInfo {
                name: name.to_string(),
                description: String::new(),
            },
            tasks_dir: default_tasks_dir(),
            statuses: strings(&["backlog", "todo", "in-progress", "review", "done"]),
            priorities: strings(&["low", "medium", "high", "critical"]),
            classes: vec![
                ClassConfig {
                    wip_limit: Some(1),
                    bypass_column_wip: true,
                    ..ClassConfig::named("expedite")
                },
                ClassConfig::named("fixed-date"),
                ClassConfig::named(STANDARD_CLASS),
                ClassConfig::named("intangible"),
            ],
            wip_limits: IndexMap::new(),
            // Claims are opt-in for fresh boards
            require_claim_for: Some(Vec::new()),
            claim_timeout: String::new(),
            next_id: 1,
            defaults: Defaults {
                status: String::new(),
                priority: "medium".to_string(),
                class: STANDARD_CLASS.to_string(),
            },
            tui: TuiConfig::default(),
        }
    }

    /// Check structural invariants after loading.
    pub fn validate(&self) -> Result<(), KanbanError> {
        let invalid = |msg: String| Err(KanbanError::InvalidInput(msg));
        if self.statuses.is_empty() {
            return invalid("config: statuses must not be empty".into());
        }
        if self.priorities.is_empty() {
            return invalid("config: priorities must not be empty".into());
        }
        if let Some(dup) = first_duplicate(self.statuses.iter().map(String::as_str)) {
            return invalid(format!("config: duplicate status {dup:?}"));
        }
        if let Some(dup) = first_duplicate(self.priorities.iter().map(String::as_str)) {
            return invalid(format!("config: duplicate priority {dup:?}"));
        }
        if let Some(dup) = first_duplicate(self.classes.iter().map(|c| c.name.as_str())) {
            return invalid(format!("config: duplicate class {dup:?}"));
        }
        if self.statuses.iter().any(|s| s == ARCHIVED) {
            return invalid(format!("config: {ARCHIVED:?} is reserved and cannot be configured"));
        }
        for (status, limit) in &self.wip_limits {
            if self.status_index(status).is_none() {
                return invalid(format!("config: wip_limits names unknown status {status:?}"));
            }
            if *limit == 0 {
                return invalid(format!("config: wip limit for {status:?} must be positive"));
            }
        }
        for class in &self.classes {
            if class.wip_limit == Some(0) {
                return invalid(format!("config: wip limit for class {:?} must be positive", class.name));
            }
        }
        if !self.defaults.status.is_empty() && self.status_index(&self.defaults.status).is_none() {
            return invalid(format!("config: default status {:?} is not configured", self.defaults.status));
        }
        if !self.defaults.priority.is_empty() && self.priority_index(&self.defaults.priority).is_none() {
            return invalid(format!(
                "config: default priority {:?} is not configured",
                self.defaults.priority
            ));
        }
        if !self.defaults.class.is_empty() && self.class_index(&self.defaults.class).is_none() {
            return invalid(format!("config: default class {:?} is not configured", self.defaults.class));
        }
        self.claim_timeout()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Status helpers
    // -----------------------------------------------------------------------

    pub fn status_index(&self, status: &str) -> Option<usize> {
        self.statuses.iter().position(|s| s == status)
    }

    pub fn first_status(&self) -> &str {
        self.statuses.first().map(String::as_str).unwrap_or("")
    }

    pub fn terminal_status(&self) -> &str {
        self.statuses.last().map(String::as_str).unwrap_or("")
    }

    /// Status given to new tasks
    pub fn initial_status(&self) -> &str {
        if self.defaults.status.is_empty() {
            self.first_status()
        } else {
            &self.defaults.status
        }
    }

    pub fn is_terminal_status(&self, status: &str) -> bool {
        !self.statuses.is_empty() && status == self.terminal_status()
    }

    pub fn is_archived_status(&self, status: &str) -> bool {
        status == ARCHIVED
    }

    /// Configured statuses plus the reserved archived status
    pub fn is_valid_status(&self, status: &str) -> bool {
        self.status_index(status).is_some() || self.is_archived_status(status)
    }

    /// Non-first, non-terminal statuses
    pub fn active_statuses(&self) -> Vec<String> {
        let n = self.statuses.len();
        if n <= 2 {
            return Vec::new();
        }
        self.statuses[1..n - 1].to_vec()
    }

    pub fn allowed_statuses(&self) -> Vec<String> {
        let mut all = self.statuses.clone();
        all.push(ARCHIVED.to_string());
        all
    }

    pub fn wip_limit(&self, status: &str) -> Option<usize> {
        self.wip_limits.get(status).copied().filter(|l| *l > 0)
    }

    /// Whether entering `status` needs an active claim for a task of `class`
    pub fn requires_claim(&self, status: &str, class: &str) -> bool {
        let board_level = match &self.require_claim_for {
            Some(list) => list.iter().any(|s| s == status),
            None => self.active_statuses().iter().any(|s| s == status),
        };
        board_level
            || self
                .class_config(class)
                .is_some_and(|c| c.require_claim_for.iter().any(|s| s == status))
    }

    // -----------------------------------------------------------------------
    // Priority helpers
    // -----------------------------------------------------------------------

    pub fn priority_index(&self, priority: &str) -> Option<usize> {
        self.priorities.iter().position(|p| p == priority)
    }

    pub fn default_priority(&self) -> &str {
        if !self.defaults.priority.is_empty() {
            return &self.defaults.priority;
        }
        // Middle of the list reads as "normal" for most boards
        self.priorities
            .get(self.priorities.len().saturating_sub(1) / 2)
            .map(String::as_str)
            .unwrap_or("")
    }

    // -----------------------------------------------------------------------
    // Class helpers
    // -----------------------------------------------------------------------

    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == class)
    }

    pub fn class_config(&self, class: &str) -> Option<&ClassConfig> {
        let name = self.resolve_class(class);
        self.classes.iter().find(|c| c.name == name)
    }

    /// Class a task belongs to once an empty value is resolved
    pub fn resolve_class<'a>(&'a self, class: &'a str) -> &'a str {
        if !class.is_empty() {
            class
        } else if !self.defaults.class.is_empty() {
            &self.defaults.class
        } else {
            STANDARD_CLASS
        }
    }

    /// Ordering key for the pick engine; unknown or empty classes sort as standard
    pub fn class_rank(&self, class: &str) -> usize {
        if let Some(idx) = self.class_index(class) {
            return idx;
        }
        self.class_index(STANDARD_CLASS)
            .or_else(|| self.class_index(&self.defaults.class))
            .unwrap_or(self.classes.len())
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }

    // -----------------------------------------------------------------------
    // Validation helpers used by the mutation paths
    // -----------------------------------------------------------------------

    pub fn check_status(&self, status: &str) -> Result<(), KanbanError> {
        if self.is_valid_status(status) {
            Ok(())
        } else {
            Err(KanbanError::InvalidStatus {
                status: status.to_string(),
                allowed: self.allowed_statuses(),
            })
        }
    }

    pub fn check_priority(&self, priority: &str) -> Result<(), KanbanError> {
        if self.priority_index(priority).is_some() {
            Ok(())
        } else {
            Err(KanbanError::InvalidPriority {
                priority: priority.to_string(),
                allowed: self.priorities.clone(),
            })
        }
    }

    /// Empty is always accepted (it means the default class)
    pub fn check_class(&self, class: &str) -> Result<(), KanbanError> {
        if class.is_empty() || self.class_index(class).is_some() {
            Ok(())
        } else {
            Err(KanbanError::InvalidClass {
                class: class.to_string(),
                allowed: self.class_names(),
            })
        }
    }

    pub fn claim_timeout(&self) -> Result<Option<Duration>, KanbanError> {
        if self.claim_timeout.trim().is_empty() {
            return Ok(None);
        }
        parse_duration(&self.claim_timeout).map(Some)
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|n| !seen.insert(*n))
}

/// Parse `1h`, `30m`, `2h30m`, `1d`, `45s`. A bare number is minutes.
pub fn parse_duration(s: &str) -> Result<Duration, KanbanError> {
    let invalid = || KanbanError::InvalidInput(format!("invalid duration {s:?} (try 30m, 1h, 2h30m, 1d)"));
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if let Ok(minutes) = s.parse::<u64>() {
        let secs = minutes.checked_mul(60).ok_or_else(invalid)?;
        return Ok(Duration::from_secs(secs));
    }
    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let n: u64 = digits.parse().map_err(|_| invalid())?;
        digits.clear();
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return Err(invalid()),
        };
        total = n
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
    }
    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(Duration::from_secs(total))
}
