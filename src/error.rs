//! Classified errors shared by the CLI and the TUI.
//!
//! Every failure a user can cause maps to a stable code string (see
//! [`KanbanError::code`]) and a `details` object. Filesystem and
//! serialization failures are internal errors and exit with code 2.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};

use crate::io::lock::LockError;
use crate::parse::TaskFileError;

/// Process exit codes for the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 1;
    pub const INTERNAL_ERROR: i32 = 2;
}

#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    // --- classified user errors -------------------------------------------
    #[error("task not found: #{0}")]
    TaskNotFound(u32),

    #[error("invalid status {status:?} (allowed: {})", allowed.join(", "))]
    InvalidStatus { status: String, allowed: Vec<String> },

    #[error("invalid priority {priority:?} (allowed: {})", allowed.join(", "))]
    InvalidPriority {
        priority: String,
        allowed: Vec<String>,
    },

    #[error("invalid class {class:?} (allowed: {})", allowed.join(", "))]
    InvalidClass { class: String, allowed: Vec<String> },

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid task id {0:?}")]
    InvalidTaskId(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("task #{id} must be claimed before moving to {status} (use --claim)")]
    ClaimRequired { id: u32, status: String },

    #[error("task #{id} is claimed by {claimed_by}")]
    TaskClaimed { id: u32, claimed_by: String },

    #[error("WIP limit reached for {status} ({current}/{limit})")]
    WipLimitExceeded {
        status: String,
        limit: usize,
        current: usize,
    },

    #[error("class WIP limit reached for {class} ({current}/{limit})")]
    ClassWipExceeded {
        class: String,
        limit: usize,
        current: usize,
    },

    #[error("task #{id} is already at the {direction} {what} ({value})")]
    Boundary {
        id: u32,
        what: &'static str,
        direction: &'static str,
        value: String,
    },

    #[error("task #{0} cannot depend on itself")]
    SelfReference(u32),

    #[error("task #{id}: dependency #{dependency} not found")]
    DependencyNotFound { id: u32, dependency: u32 },

    #[error("no board found (searched upward from {})", .0.display())]
    BoardNotFound(PathBuf),

    #[error("nothing to pick")]
    NothingToPick,

    // --- internal errors ---------------------------------------------------
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    TaskFile {
        path: PathBuf,
        source: TaskFileError,
    },

    #[error("could not parse {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KanbanError>;

impl KanbanError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            KanbanError::TaskNotFound(_) => "TASK_NOT_FOUND",
            KanbanError::InvalidStatus { .. } => "INVALID_STATUS",
            KanbanError::InvalidPriority { .. } => "INVALID_PRIORITY",
            KanbanError::InvalidClass { .. } => "INVALID_CLASS",
            KanbanError::InvalidDate(_) => "INVALID_DATE",
            KanbanError::InvalidTaskId(_) => "INVALID_TASK_ID",
            KanbanError::InvalidInput(_) => "INVALID_INPUT",
            KanbanError::ClaimRequired { .. } => "CLAIM_REQUIRED",
            KanbanError::TaskClaimed { .. } => "TASK_CLAIMED",
            KanbanError::WipLimitExceeded { .. } => "WIP_LIMIT_EXCEEDED",
            KanbanError::ClassWipExceeded { .. } => "CLASS_WIP_EXCEEDED",
            KanbanError::Boundary { .. } => "BOUNDARY_ERROR",
            KanbanError::SelfReference(_) => "SELF_REFERENCE",
            KanbanError::DependencyNotFound { .. } => "DEPENDENCY_NOT_FOUND",
            KanbanError::BoardNotFound(_) => "BOARD_NOT_FOUND",
            KanbanError::NothingToPick => "NOTHING_TO_PICK",
            KanbanError::Read { .. }
            | KanbanError::Write { .. }
            | KanbanError::TaskFile { .. }
            | KanbanError::Config { .. }
            | KanbanError::Yaml(_)
            | KanbanError::Json(_)
            | KanbanError::Lock(_)
            | KanbanError::Io(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors the user caused (bad input, rule violations).
    pub fn is_classified(&self) -> bool {
        self.code() != "INTERNAL_ERROR"
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_classified() {
            exit_codes::USER_ERROR
        } else {
            exit_codes::INTERNAL_ERROR
        }
    }

    /// Per-kind detail object for the JSON envelope.
    pub fn details(&self) -> Value {
        match self {
            KanbanError::TaskNotFound(id) => json!({ "id": id }),
            KanbanError::InvalidStatus { status, allowed } => {
                json!({ "status": status, "allowed": allowed })
            }
            KanbanError::InvalidPriority { priority, allowed } => {
                json!({ "priority": priority, "allowed": allowed })
            }
            KanbanError::InvalidClass { class, allowed } => {
                json!({ "class": class, "allowed": allowed })
            }
            KanbanError::InvalidDate(value) | KanbanError::InvalidTaskId(value) => {
                json!({ "value": value })
            }
            KanbanError::InvalidInput(message) => json!({ "message": message }),
            KanbanError::ClaimRequired { id, status } => json!({ "id": id, "status": status }),
            KanbanError::TaskClaimed { id, claimed_by } => {
                json!({ "id": id, "claimed_by": claimed_by })
            }
            KanbanError::WipLimitExceeded {
                status,
                limit,
                current,
            } => json!({ "status": status, "limit": limit, "current": current }),
            KanbanError::ClassWipExceeded {
                class,
                limit,
                current,
            } => json!({ "class": class, "limit": limit, "current": current }),
            KanbanError::Boundary {
                id,
                what,
                direction,
                value,
            } => {
                let mut details = json!({ "id": id, "direction": direction });
                details[*what] = Value::String(value.clone());
                details
            }
            KanbanError::SelfReference(id) => json!({ "id": id }),
            KanbanError::DependencyNotFound { id, dependency } => {
                json!({ "id": id, "dependency": dependency })
            }
            KanbanError::BoardNotFound(start) => json!({ "start": start.display().to_string() }),
            KanbanError::NothingToPick => json!({}),
            KanbanError::Read { path, .. }
            | KanbanError::Write { path, .. }
            | KanbanError::TaskFile { path, .. }
            | KanbanError::Config { path, .. } => json!({ "path": path.display().to_string() }),
            KanbanError::Yaml(_)
            | KanbanError::Json(_)
            | KanbanError::Lock(_)
            | KanbanError::Io(_) => json!({}),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        }
    }
}

/// `{"error": ..., "code": ..., "details": {...}}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: &'static str,
    pub details: Value,
}
