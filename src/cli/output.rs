use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::activity::ActivityEntry;
use crate::model::config::BoardConfig;
use crate::model::task::Task;
use crate::ops::check::{CheckReport, CheckWarning, Repair};
use crate::ops::group::Group;
use crate::ops::metrics::FlowMetrics;
use crate::ops::summary::BoardSummary;
use crate::ops::task_ops::BatchResult;
use crate::util::unicode::{display_width, pad_to_width, strip_ansi, truncate_to_width};

// ---------------------------------------------------------------------------
// Format selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Compact,
    Json,
}

impl OutputFormat {
    /// Explicit flags win; otherwise a table on a terminal, compact lines
    /// when piped.
    pub fn from_flags(json: bool, table: bool, compact: bool) -> Self {
        Self::resolve(json, table, compact, std::io::stdout().is_terminal())
    }

    fn resolve(json: bool, table: bool, compact: bool, tty: bool) -> Self {
        if json {
            OutputFormat::Json
        } else if table {
            OutputFormat::Table
        } else if compact || !tty {
            OutputFormat::Compact
        } else {
            OutputFormat::Table
        }
    }

    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Serialize)]
pub struct MoveJson<'a> {
    pub id: u32,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<&'a str>,
    pub status: &'a str,
}

#[derive(Serialize)]
pub struct MutationJson<'a> {
    pub changed: bool,
    pub task: TaskJson<'a>,
}

#[derive(Serialize)]
pub struct GroupJson<'a> {
    pub key: &'a str,
    pub counts: &'a indexmap::IndexMap<String, usize>,
    pub tasks: Vec<TaskJson<'a>>,
}

pub fn task_to_json(task: &Task) -> TaskJson<'_> {
    TaskJson {
        task,
        file: task
            .file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned()),
    }
}

pub fn group_to_json(group: &Group) -> GroupJson<'_> {
    GroupJson {
        key: &group.key,
        counts: &group.counts,
        tasks: group.tasks.iter().map(task_to_json).collect(),
    }
}

/// Pretty JSON for anything serializable
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Title as it should reach a terminal: escapes removed, newlines folded
fn clean(s: &str) -> String {
    strip_ansi(s).replace(['\n', '\r'], " ")
}

fn flags(task: &Task, now: DateTime<Utc>, timeout: Option<std::time::Duration>) -> String {
    let mut out = String::new();
    if task.blocked {
        out.push('!');
    }
    if task.has_active_claim(timeout, now) {
        out.push('*');
    }
    out
}

/// `#3 [todo] high Fix login @alice +api` on one line
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!("#{} [{}] {} {}", task.id, task.status, task.priority, clean(&task.title));
    if !task.assignee.is_empty() {
        line.push_str(&format!(" @{}", task.assignee));
    }
    for tag in &task.tags {
        line.push_str(&format!(" +{tag}"));
    }
    if task.blocked {
        line.push_str(" (blocked)");
    }
    if task.is_claimed() {
        line.push_str(&format!(" [claimed by {}]", task.claimed_by));
    }
    line
}

const TABLE_HEADERS: [&str; 7] = ["ID", "STATUS", "PRIORITY", "CLASS", "ASSIGNEE", "", "TITLE"];
const MAX_TITLE_CELLS: usize = 60;

/// Aligned table with a header row. Column 6 is the blocked/claimed marker.
pub fn format_task_table(
    tasks: &[Task],
    cfg: &BoardConfig,
    now: DateTime<Utc>,
    timeout: Option<std::time::Duration>,
) -> Vec<String> {
    let rows: Vec<[String; 7]> = tasks
        .iter()
        .map(|t| {
            [
                t.id.to_string(),
                t.status.clone(),
                t.priority.clone(),
                cfg.resolve_class(&t.class).to_string(),
                t.assignee.clone(),
                flags(t, now, timeout),
                truncate_to_width(&clean(&t.title), MAX_TITLE_CELLS),
            ]
        })
        .collect();
    format_table(&TABLE_HEADERS, &rows)
}

/// Left-aligned columns separated by two spaces; the last column is not padded.
pub fn format_table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> Vec<String> {
    let mut widths = [0usize; N];
    for (i, h) in headers.iter().enumerate() {
        widths[i] = display_width(h);
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }
    let render = |cells: Vec<&str>| -> String {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 == N {
                line.push_str(cell);
            } else {
                line.push_str(&pad_to_width(cell, widths[i]));
                line.push_str("  ");
            }
        }
        line.trim_end().to_string()
    };
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(headers.to_vec()));
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Every field of a task followed by its body
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = vec![format!("#{} {}", task.id, clean(&task.title))];
    let mut field = |name: &str, value: String| {
        if !value.is_empty() {
            lines.push(format!("{name:<12}{value}"));
        }
    };
    field("status:", task.status.clone());
    field("priority:", task.priority.clone());
    field("class:", task.class.clone());
    field("assignee:", task.assignee.clone());
    field("tags:", task.tags.join(", "));
    field("due:", task.due.map(|d| d.to_string()).unwrap_or_default());
    field("estimate:", task.estimate.clone());
    field("parent:", task.parent.map(|p| format!("#{p}")).unwrap_or_default());
    field(
        "depends on:",
        task.depends_on
            .iter()
            .map(|d| format!("#{d}"))
            .collect::<Vec<_>>()
            .join(", "),
    );
    if task.blocked {
        field("blocked:", if task.block_reason.is_empty() { "yes".into() } else { task.block_reason.clone() });
    }
    if task.is_claimed() {
        let since = task.claimed_at.map(|t| format!(" since {}", t.to_rfc3339())).unwrap_or_default();
        field("claimed by:", format!("{}{since}", task.claimed_by));
    }
    field("branch:", task.branch.clone());
    field("worktree:", task.worktree.clone());
    field("created:", task.created.to_rfc3339());
    field("updated:", task.updated.to_rfc3339());
    field("started:", task.started.map(|t| t.to_rfc3339()).unwrap_or_default());
    field("completed:", task.completed.map(|t| t.to_rfc3339()).unwrap_or_default());
    if let Some(file) = task.file.as_ref() {
        field("file:", file.display().to_string());
    }
    if !task.body.trim().is_empty() {
        lines.push(String::new());
        lines.extend(task.body.trim_end().lines().map(strip_ansi));
    }
    lines
}

pub fn format_groups(
    groups: &[Group],
    format: OutputFormat,
    cfg: &BoardConfig,
    now: DateTime<Utc>,
    timeout: Option<std::time::Duration>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        let counts: Vec<String> = group.counts.iter().map(|(s, n)| format!("{s}: {n}")).collect();
        lines.push(format!("== {} ({}) ==", group.key, counts.join(", ")));
        match format {
            OutputFormat::Table => lines.extend(format_task_table(&group.tasks, cfg, now, timeout)),
            _ => lines.extend(group.tasks.iter().map(format_task_line)),
        }
    }
    lines
}

pub fn format_summary(summary: &BoardSummary) -> Vec<String> {
    let rows: Vec<[String; 5]> = summary
        .statuses
        .iter()
        .map(|s| {
            [
                s.status.clone(),
                s.count.to_string(),
                s.wip_limit.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
                s.blocked.to_string(),
                s.overdue.to_string(),
            ]
        })
        .collect();
    let mut lines = vec![format!("{} ({} tasks)", summary.board, summary.total), String::new()];
    lines.extend(format_table(&["STATUS", "COUNT", "WIP", "BLOCKED", "OVERDUE"], &rows));

    let counts = |items: &[crate::ops::summary::NamedCount]| {
        items
            .iter()
            .map(|c| format!("{} {}", c.name, c.count))
            .collect::<Vec<_>>()
            .join(", ")
    };
    lines.push(String::new());
    lines.push(format!("priorities: {}", counts(&summary.priorities)));
    if !summary.classes.is_empty() {
        lines.push(format!("classes:    {}", counts(&summary.classes)));
    }
    for warning in &summary.wip_warnings {
        lines.push(format!("warning: WIP {warning}"));
    }
    lines
}

fn hours(h: Option<f64>) -> String {
    match h {
        Some(h) if h >= 48.0 => format!("{:.1}d", h / 24.0),
        Some(h) => format!("{h:.1}h"),
        None => "-".into(),
    }
}

pub fn format_metrics(m: &FlowMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("throughput (7d):   {}", m.throughput_7d),
        format!("throughput (30d):  {}", m.throughput_30d),
        format!("avg lead time:     {}", hours(m.avg_lead_time_hours)),
        format!("avg cycle time:    {}", hours(m.avg_cycle_time_hours)),
        format!("wip:               {}", m.wip),
        format!("blocked:           {}", m.blocked),
    ];
    if !m.aging.is_empty() {
        lines.push(String::new());
        let rows: Vec<[String; 4]> = m
            .aging
            .iter()
            .map(|a| {
                [
                    a.id.to_string(),
                    a.status.clone(),
                    hours(Some(a.age_hours)),
                    truncate_to_width(&clean(&a.title), MAX_TITLE_CELLS),
                ]
            })
            .collect();
        lines.extend(format_table(&["ID", "STATUS", "AGE", "TITLE"], &rows));
    }
    lines
}

pub fn format_log_entry(entry: &ActivityEntry) -> String {
    let mut line = format!(
        "{}  {:<8} #{}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.action.as_str(),
        entry.task_id
    );
    if !entry.detail.is_empty() {
        line.push_str("  ");
        line.push_str(&clean(&entry.detail));
    }
    line
}

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    if report.is_clean() {
        return vec!["board is consistent".to_string()];
    }
    let name = |p: &std::path::Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| p.display().to_string())
    };
    let mut lines = Vec::new();
    for repair in &report.repairs {
        lines.push(match repair {
            Repair::ReassignedId { file, from, to } => {
                format!("repaired: {} duplicate id #{from} -> #{to}", name(file))
            }
            Repair::RenamedFile { from, to, .. } => {
                format!("repaired: renamed {} -> {}", name(from), name(to))
            }
            Repair::NextId { from, to } => format!("repaired: next_id {from} -> {to}"),
        });
    }
    for warning in &report.warnings {
        lines.push(match warning {
            CheckWarning::Unreadable { file, error } => {
                format!("warning: {} unreadable: {error}", name(file))
            }
            CheckWarning::DanglingDependency { id, dependency } => {
                format!("warning: #{id} depends on missing #{dependency}")
            }
            CheckWarning::MissingParent { id, parent } => {
                format!("warning: #{id} has missing parent #{parent}")
            }
            CheckWarning::BlockedWithoutReason { id } => {
                format!("warning: #{id} is blocked without a reason")
            }
            CheckWarning::HalfClaim { id } => {
                format!("warning: #{id} has claimed_by or claimed_at but not both")
            }
        });
    }
    lines
}

pub fn format_batch(results: &[BatchResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| match (&r.status, &r.error) {
            (Some(status), _) if r.ok => format!("#{} -> {status}", r.id),
            (_, Some(error)) => format!("#{} failed: {error}", r.id),
            _ => format!("#{} failed", r.id),
        })
        .collect()
}
