use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutation recorded in the activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Move,
    Edit,
    Delete,
    Priority,
    Claim,
    Release,
    Block,
    Unblock,
    Repair,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Move => "move",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Priority => "priority",
            Action::Claim => "claim",
            Action::Release => "release",
            Action::Block => "block",
            Action::Unblock => "unblock",
            Action::Repair => "repair",
        }
    }

    pub fn parse_action(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Action::Create),
            "move" => Some(Action::Move),
            "edit" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            "priority" => Some(Action::Priority),
            "claim" => Some(Action::Claim),
            "release" => Some(Action::Release),
            "block" => Some(Action::Block),
            "unblock" => Some(Action::Unblock),
            "repair" => Some(Action::Repair),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of `activity.jsonl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub task_id: u32,
    #[serde(default)]
    pub detail: String,
}

impl ActivityEntry {
    pub fn new(action: Action, task_id: u32, detail: impl Into<String>) -> Self {
        ActivityEntry {
            timestamp: crate::model::now(),
            action,
            task_id,
            detail: detail.into(),
        }
    }
}
