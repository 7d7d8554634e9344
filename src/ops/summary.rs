use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::config::BoardConfig;
use crate::model::task::Task;

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub status: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
    pub blocked: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

/// Aggregate view of the board, archived tasks excluded
#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    pub board: String,
    pub total: usize,
    pub statuses: Vec<StatusSummary>,
    pub priorities: Vec<NamedCount>,
    pub classes: Vec<NamedCount>,
    pub wip_warnings: Vec<String>,
}

/// Due before now and not finished.
pub fn is_overdue(task: &Task, cfg: &BoardConfig, now: DateTime<Utc>) -> bool {
    match task.due {
        Some(due) => {
            due.before(now) && !cfg.is_terminal_status(&task.status) && !task.is_archived()
        }
        None => false,
    }
}

pub fn summarize(cfg: &BoardConfig, tasks: &[Task], now: DateTime<Utc>) -> BoardSummary {
    let live: Vec<&Task> = tasks.iter().filter(|t| !t.is_archived()).collect();

    let mut statuses = Vec::with_capacity(cfg.statuses.len());
    let mut wip_warnings = Vec::new();
    for status in &cfg.statuses {
        let in_status: Vec<&&Task> = live.iter().filter(|t| &t.status == status).collect();
        let count = in_status.len();
        let wip_limit = cfg.wip_limit(status);
        if let Some(limit) = wip_limit
            && count >= limit
        {
            let state = if count > limit { "over limit" } else { "at limit" };
            wip_warnings.push(format!("{status}: {count}/{limit} ({state})"));
        }
        statuses.push(StatusSummary {
            status: status.clone(),
            count,
            wip_limit,
            blocked: in_status.iter().filter(|t| t.blocked).count(),
            overdue: in_status.iter().filter(|t| is_overdue(t, cfg, now)).count(),
        });
    }

    let priorities = cfg
        .priorities
        .iter()
        .map(|p| NamedCount {
            name: p.clone(),
            count: live.iter().filter(|t| &t.priority == p).count(),
        })
        .collect();

    let classes = cfg
        .classes
        .iter()
        .map(|c| NamedCount {
            name: c.name.clone(),
            count: live
                .iter()
                .filter(|t| cfg.resolve_class(&t.class) == c.name)
                .count(),
        })
        .collect();

    BoardSummary {
        board: cfg.board.name.clone(),
        total: live.len(),
        statuses,
        priorities,
        classes,
        wip_warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::ARCHIVED;
    use crate::model::{Date, now};

    fn task(id: u32, status: &str, priority: &str) -> Task {
        Task::new(id, format!("t{id}"), status.into(), priority.into(), now())
    }

    #[test]
    fn counts_and_warnings() {
        let mut cfg = BoardConfig::new_default("demo");
        cfg.wip_limits.insert("in-progress".into(), 2);

        let mut blocked = task(3, "in-progress", "high");
        blocked.block("waiting");
        let mut urgent = task(4, "todo", "critical");
        urgent.class = "expedite".into();
        let tasks = vec![
            task(1, "in-progress", "low"),
            task(2, "in-progress", "low"),
            blocked,
            urgent,
            task(5, ARCHIVED, "low"),
        ];

        let s = summarize(&cfg, &tasks, now());
        assert_eq!(s.total, 4);
        let ip = s.statuses.iter().find(|x| x.status == "in-progress").unwrap();
        assert_eq!(ip.count, 3);
        assert_eq!(ip.blocked, 1);
        assert_eq!(ip.wip_limit, Some(2));
        assert_eq!(s.wip_warnings, vec!["in-progress: 3/2 (over limit)"]);
        assert_eq!(s.priorities[0].count, 2);
        assert_eq!(s.classes[0].count, 1);
        assert_eq!(s.classes[2].count, 3);
    }

    #[test]
    fn overdue_ignores_finished_tasks() {
        let cfg = BoardConfig::new_default("demo");
        let mut late = task(1, "todo", "low");
        late.due = Date::new(2000, 1, 1);
        let mut finished = task(2, "done", "low");
        finished.due = Date::new(2000, 1, 1);
        let mut future = task(3, "todo", "low");
        future.due = Date::new(2999, 1, 1);

        assert!(is_overdue(&late, &cfg, now()));
        assert!(!is_overdue(&finished, &cfg, now()));
        assert!(!is_overdue(&future, &cfg, now()));

        let s = summarize(&cfg, &[late, finished, future], now());
        let todo = s.statuses.iter().find(|x| x.status == "todo").unwrap();
        assert_eq!(todo.overdue, 1);
    }
}
