//! Context extraction: a compact snapshot of what matters on the board
//! right now, for pasting into a chat or handing to an agent.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::KanbanError;
use crate::model::config::BoardConfig;
use crate::model::date::Date;
use crate::model::task::Task;
use crate::ops::filter::{dependencies_satisfied, index_by_id};
use crate::ops::summary::is_overdue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    InProgress,
    Blocked,
    Ready,
    Overdue,
    RecentlyCompleted,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::InProgress,
        Section::Blocked,
        Section::Ready,
        Section::Overdue,
        Section::RecentlyCompleted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::InProgress => "in-progress",
            Section::Blocked => "blocked",
            Section::Ready => "ready",
            Section::Overdue => "overdue",
            Section::RecentlyCompleted => "recently-completed",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Section::InProgress => "In progress",
            Section::Blocked => "Blocked",
            Section::Ready => "Ready",
            Section::Overdue => "Overdue",
            Section::RecentlyCompleted => "Recently completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, KanbanError> {
        Section::ALL
            .into_iter()
            .find(|sec| sec.name() == s.trim())
            .ok_or_else(|| {
                let names: Vec<&str> = Section::ALL.iter().map(|s| s.name()).collect();
                KanbanError::InvalidInput(format!(
                    "unknown context section {s:?} (expected one of: {})",
                    names.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Empty means every section
    pub sections: Vec<Section>,
    /// Window for recently completed tasks
    pub days: i64,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            sections: Vec::new(),
            days: 7,
        }
    }
}

/// The per-task subset carried by a context document
#[derive(Debug, Clone, Serialize)]
pub struct ContextTask {
    pub id: u32,
    pub title: String,
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub assignee: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub claimed_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub block_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u32>,
}

impl From<&Task> for ContextTask {
    fn from(t: &Task) -> Self {
        ContextTask {
            id: t.id,
            title: t.title.clone(),
            status: t.status.clone(),
            priority: t.priority.clone(),
            class: t.class.clone(),
            assignee: t.assignee.clone(),
            claimed_by: t.claimed_by.clone(),
            block_reason: t.block_reason.clone(),
            due: t.due,
            completed: t.completed,
            depends_on: t.depends_on.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextSection {
    pub section: Section,
    pub tasks: Vec<ContextTask>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextDoc {
    pub board: String,
    pub generated: DateTime<Utc>,
    pub sections: Vec<ContextSection>,
}

/// Status ready work waits in: the second configured status
fn ready_status(cfg: &BoardConfig) -> Option<&str> {
    cfg.statuses.get(1).map(String::as_str)
}

fn select<'a>(
    section: Section,
    cfg: &BoardConfig,
    tasks: &'a [Task],
    days: i64,
    now: DateTime<Utc>,
) -> Vec<&'a Task> {
    let by_id = index_by_id(tasks);
    let live = tasks.iter().filter(|t| !t.is_archived());
    match section {
        // Active work past the ready column
        Section::InProgress => {
            let active = cfg.active_statuses();
            let ready = ready_status(cfg);
            live.filter(|t| {
                active.contains(&t.status) && Some(t.status.as_str()) != ready && !t.blocked
            })
            .collect()
        }
        Section::Blocked => live
            .filter(|t| t.blocked && !cfg.is_terminal_status(&t.status))
            .collect(),
        Section::Ready => {
            let Some(ready) = ready_status(cfg) else {
                return Vec::new();
            };
            live.filter(|t| {
                t.status == ready && !t.blocked && dependencies_satisfied(t, &by_id, cfg)
            })
            .collect()
        }
        Section::Overdue => live.filter(|t| is_overdue(t, cfg, now)).collect(),
        Section::RecentlyCompleted => {
            // A window reaching past the calendar keeps everything
            let cutoff = Duration::try_days(days.max(0)).and_then(|d| now.checked_sub_signed(d));
            live.filter(|t| {
                cfg.is_terminal_status(&t.status)
                    && t.completed.is_some_and(|c| cutoff.is_none_or(|cutoff| c >= cutoff))
            })
            .collect()
        }
    }
}

pub fn extract(
    cfg: &BoardConfig,
    tasks: &[Task],
    opts: &ContextOptions,
    now: DateTime<Utc>,
) -> ContextDoc {
    let wanted: &[Section] = if opts.sections.is_empty() {
        &Section::ALL
    } else {
        &opts.sections
    };
    let sections = wanted
        .iter()
        .map(|&section| ContextSection {
            section,
            tasks: select(section, cfg, tasks, opts.days, now)
                .into_iter()
                .map(ContextTask::from)
                .collect(),
        })
        .collect();
    ContextDoc {
        board: cfg.board.name.clone(),
        generated: now,
        sections,
    }
}

pub fn render_markdown(doc: &ContextDoc) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", doc.board);
    for section in &doc.sections {
        let _ = writeln!(out, "\n## {} ({})\n", section.section.heading(), section.tasks.len());
        if section.tasks.is_empty() {
            out.push_str("_none_\n");
            continue;
        }
        for t in &section.tasks {
            let _ = write!(out, "- #{} {} [{}, {}]", t.id, t.title, t.status, t.priority);
            if !t.claimed_by.is_empty() {
                let _ = write!(out, " claimed by {}", t.claimed_by);
            }
            if let Some(due) = t.due {
                let _ = write!(out, " due {due}");
            }
            if !t.block_reason.is_empty() {
                let _ = write!(out, " (blocked: {})", t.block_reason);
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    fn task(id: u32, status: &str) -> Task {
        Task::new(id, format!("Task {id}"), status.into(), "medium".into(), now())
    }

    fn section_ids(doc: &ContextDoc, section: Section) -> Vec<u32> {
        doc.sections
            .iter()
            .find(|s| s.section == section)
            .map(|s| s.tasks.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    #[test]
    fn sections_select_expected_tasks() {
        let cfg = BoardConfig::new_default("demo");
        let at = now();
        let mut blocked = task(2, "in-progress");
        blocked.block("vendor");
        let mut waiting = task(4, "todo");
        waiting.depends_on = vec![1];
        let mut finished = task(5, "done");
        finished.completed = Some(at - Duration::days(2));
        let mut old = task(6, "done");
        old.completed = Some(at - Duration::days(30));
        let mut late = task(7, "backlog");
        late.due = Date::new(2001, 1, 1);

        let tasks = vec![
            task(1, "in-progress"),
            blocked,
            task(3, "todo"),
            waiting,
            finished,
            old,
            late,
        ];
        let doc = extract(&cfg, &tasks, &ContextOptions::default(), at);

        assert_eq!(section_ids(&doc, Section::InProgress), vec![1]);
        assert_eq!(section_ids(&doc, Section::Blocked), vec![2]);
        assert_eq!(section_ids(&doc, Section::Ready), vec![3]);
        assert_eq!(section_ids(&doc, Section::Overdue), vec![7]);
        assert_eq!(section_ids(&doc, Section::RecentlyCompleted), vec![5]);
    }

    #[test]
    fn requested_sections_only() {
        let cfg = BoardConfig::new_default("demo");
        let opts = ContextOptions {
            sections: vec![Section::Ready],
            days: 7,
        };
        let doc = extract(&cfg, &[task(1, "todo")], &opts, now());
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(Section::parse("recently-completed").unwrap(), Section::RecentlyCompleted);
        assert_eq!(Section::parse("soon").unwrap_err().code(), "INVALID_INPUT");
    }

    #[test]
    fn huge_completion_window_keeps_every_finished_task() {
        let cfg = BoardConfig::new_default("demo");
        let mut finished = task(1, "done");
        finished.completed = Some(now() - Duration::days(3650));
        let opts = ContextOptions {
            sections: vec![Section::RecentlyCompleted],
            days: 9_999_999_999_999,
        };
        let doc = extract(&cfg, &[finished, task(2, "todo")], &opts, now());
        assert_eq!(section_ids(&doc, Section::RecentlyCompleted), vec![1]);
    }

    #[test]
    fn markdown_lists_tasks() {
        let cfg = BoardConfig::new_default("demo");
        let mut t = task(3, "todo");
        t.title = "Write docs".into();
        let doc = extract(
            &cfg,
            &[t],
            &ContextOptions {
                sections: vec![Section::Ready, Section::Blocked],
                days: 7,
            },
            now(),
        );
        let md = render_markdown(&doc);
        assert!(md.starts_with("# demo\n"));
        assert!(md.contains("## Ready (1)"));
        assert!(md.contains("- #3 Write docs [todo, medium]"));
        assert!(md.contains("## Blocked (0)\n\n_none_"));
    }
}
