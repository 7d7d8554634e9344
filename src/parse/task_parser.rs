use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::date::Date;
use crate::model::task::Task;

/// Why a task file could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskFileError {
    #[error("missing opening '---' fence")]
    MissingOpeningFence,
    #[error("missing closing '---' fence")]
    MissingClosingFence,
    #[error("invalid preamble: {0}")]
    InvalidYaml(String),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid value for '{field}': {message}")]
    InvalidField { field: &'static str, message: String },
}

/// Preamble as it appears on disk. Required fields are optional here so a
/// missing one is reported by name; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPreamble {
    id: Option<u32>,
    title: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    class: Option<String>,
    assignee: Option<String>,
    tags: Option<Vec<String>>,
    due: Option<Date>,
    estimate: Option<String>,
    parent: Option<u32>,
    depends_on: Option<Vec<u32>>,
    blocked: Option<bool>,
    block_reason: Option<String>,
    claimed_by: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    started: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
    branch: Option<String>,
    worktree: Option<String>,
}

/// Split a task file into `(preamble, body)`.
///
/// The file must open with a `---` line. The preamble runs up to the next
/// line that is exactly `---`; the body is every byte after that line.
pub fn split_preamble(content: &str) -> Result<(&str, &str), TaskFileError> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or(TaskFileError::MissingOpeningFence)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n').trim_end_matches('\r');
        if bare == "---" {
            let preamble = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((preamble, body));
        }
        offset += line.len();
    }
    Err(TaskFileError::MissingClosingFence)
}

/// Parse the contents of a task file. `file` is left unset.
pub fn parse_task(content: &str) -> Result<Task, TaskFileError> {
    let (yaml, body) = split_preamble(content)?;

    let raw: RawPreamble = if yaml.trim().is_empty() {
        RawPreamble::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| TaskFileError::InvalidYaml(e.to_string()))?
    };

    let id = raw.id.ok_or(TaskFileError::MissingField("id"))?;
    if id == 0 {
        return Err(TaskFileError::InvalidField {
            field: "id",
            message: "must be positive".into(),
        });
    }
    let title = raw.title.ok_or(TaskFileError::MissingField("title"))?;
    let status = raw.status.ok_or(TaskFileError::MissingField("status"))?;
    let priority = raw.priority.ok_or(TaskFileError::MissingField("priority"))?;
    let created = raw.created.ok_or(TaskFileError::MissingField("created"))?;
    let updated = raw.updated.ok_or(TaskFileError::MissingField("updated"))?;

    Ok(Task {
        id,
        title,
        status,
        priority,
        class: raw.class.unwrap_or_default(),
        assignee: raw.assignee.unwrap_or_default(),
        tags: raw.tags.unwrap_or_default(),
        due: raw.due,
        estimate: raw.estimate.unwrap_or_default(),
        parent: raw.parent,
        depends_on: raw.depends_on.unwrap_or_default(),
        blocked: raw.blocked.unwrap_or(false),
        block_reason: raw.block_reason.unwrap_or_default(),
        claimed_by: raw.claimed_by.unwrap_or_default(),
        claimed_at: raw.claimed_at,
        created,
        updated,
        started: raw.started,
        completed: raw.completed,
        branch: raw.branch.unwrap_or_default(),
        worktree: raw.worktree.unwrap_or_default(),
        body: body.to_string(),
        file: None,
    })
}
