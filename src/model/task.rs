use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date::Date;

/// Reserved status for soft-deleted tasks
pub const ARCHIVED: &str = "archived";

/// A task with all its preamble fields and its body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub status: String,
    pub priority: String,
    /// Class of service; empty means the default class
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assignee: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<Date>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub estimate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u32>,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub block_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub claimed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub worktree: String,
    #[serde(default)]
    pub body: String,

    /// Path the task was read from; never persisted
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

impl Task {
    /// A fresh task with required fields set and everything else empty
    pub fn new(id: u32, title: String, status: String, priority: String, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title,
            status,
            priority,
            class: String::new(),
            assignee: String::new(),
            tags: Vec::new(),
            due: None,
            estimate: String::new(),
            parent: None,
            depends_on: Vec::new(),
            blocked: false,
            block_reason: String::new(),
            claimed_by: String::new(),
            claimed_at: None,
            created: now,
            updated: now,
            started: None,
            completed: None,
            branch: String::new(),
            worktree: String::new(),
            body: String::new(),
            file: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == ARCHIVED
    }

    pub fn is_claimed(&self) -> bool {
        !self.claimed_by.is_empty()
    }

    /// A claim is active when present and not older than `timeout`.
    /// Without a timeout a claim never expires.
    pub fn has_active_claim(&self, timeout: Option<Duration>, now: DateTime<Utc>) -> bool {
        if !self.is_claimed() {
            return false;
        }
        match (timeout, self.claimed_at) {
            (Some(timeout), Some(at)) => match chrono::Duration::from_std(timeout) {
                Ok(timeout) => at.checked_add_signed(timeout).is_none_or(|expiry| expiry >= now),
                Err(_) => true,
            },
            _ => true,
        }
    }

    pub fn claim(&mut self, agent: &str, now: DateTime<Utc>) {
        self.claimed_by = agent.to_string();
        self.claimed_at = Some(now);
    }

    pub fn release(&mut self) {
        self.claimed_by.clear();
        self.claimed_at = None;
    }

    pub fn block(&mut self, reason: &str) {
        self.blocked = true;
        self.block_reason = reason.to_string();
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
        self.block_reason.clear();
    }

    /// Tasks compare equal on every persisted field; `file` is ignored
    fn persisted_eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.status == other.status
            && self.priority == other.priority
            && self.class == other.class
            && self.assignee == other.assignee
            && self.tags == other.tags
            && self.due == other.due
            && self.estimate == other.estimate
            && self.parent == other.parent
            && self.depends_on == other.depends_on
            && self.blocked == other.blocked
            && self.block_reason == other.block_reason
            && self.claimed_by == other.claimed_by
            && self.claimed_at == other.claimed_at
            && self.created == other.created
            && self.updated == other.updated
            && self.started == other.started
            && self.completed == other.completed
            && self.branch == other.branch
            && self.worktree == other.worktree
            && self.body == other.body
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.persisted_eq(other)
    }
}

impl Eq for Task {}
