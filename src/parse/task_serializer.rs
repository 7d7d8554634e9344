use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::date::Date;
use crate::model::task::Task;

/// Canonical on-disk preamble. Field order here is the order written.
#[derive(Serialize)]
struct Preamble<'a> {
    id: u32,
    title: &'a str,
    status: &'a str,
    priority: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    class: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    assignee: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<Date>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
    #[serde(skip_serializing_if = "<[u32]>::is_empty")]
    depends_on: &'a [u32],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    blocked: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    block_reason: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    claimed_by: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    claimed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    estimate: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    branch: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    worktree: &'a str,
}

impl<'a> From<&'a Task> for Preamble<'a> {
    fn from(t: &'a Task) -> Self {
        Preamble {
            id: t.id,
            title: &t.title,
            status: &t.status,
            priority: &t.priority,
            class: &t.class,
            assignee: &t.assignee,
            tags: &t.tags,
            due: t.due,
            created: t.created,
            updated: t.updated,
            started: t.started,
            completed: t.completed,
            parent: t.parent,
            depends_on: &t.depends_on,
            blocked: t.blocked,
            block_reason: &t.block_reason,
            claimed_by: &t.claimed_by,
            claimed_at: t.claimed_at,
            estimate: &t.estimate,
            branch: &t.branch,
            worktree: &t.worktree,
        }
    }
}

/// Serialize a task to file contents: `---\n<yaml>---\n<body>`.
/// The body is emitted verbatim.
pub fn serialize_task(task: &Task) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(&Preamble::from(task))?;
    let mut out = String::with_capacity(yaml.len() + task.body.len() + 8);
    out.push_str("---\n");
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(&task.body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_task;
    use chrono::TimeZone;

    fn sample() -> Task {
        let at = Utc.with_ymd_and_hms(2026, 2, 8, 14, 30, 0).unwrap();
        let mut t = Task::new(42, "Fix: the parser".into(), "todo".into(), "high".into(), at);
        t.tags = vec!["backend".into(), "api".into()];
        t.due = Date::parse("2026-03-15").ok();
        t.depends_on = vec![3, 5];
        t.parent = Some(7);
        t.block("waiting on review");
        t.claim("agent-1", at);
        t.body = "Body text\n\nwith blank lines\n\n".into();
        t
    }

    #[test]
    fn round_trips() {
        let t = sample();
        let text = serialize_task(&t).unwrap();
        let back = parse_task(&text).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn zero_values_are_omitted() {
        let at = Utc.with_ymd_and_hms(2026, 2, 8, 14, 30, 0).unwrap();
        let t = Task::new(1, "Plain".into(), "backlog".into(), "low".into(), at);
        let text = serialize_task(&t).unwrap();
        assert!(text.starts_with("---\nid: 1\ntitle: Plain\n"));
        assert!(!text.contains("blocked"));
        assert!(!text.contains("claimed_by"));
        assert!(text.ends_with("---\n"));
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let text = serialize_task(&sample()).unwrap();
        assert!(text.contains("2026-02-08T14:30:00Z"), "{text}");
        assert!(text.contains("2026-03-15"), "{text}");
    }
}
