use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::config::BoardConfig;
use crate::model::task::{ARCHIVED, Task};

/// AND-combined task filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub assignee: Option<String>,
    pub tag: Option<String>,
    /// Case-insensitive substring over title, body and tags
    pub search: Option<String>,
    /// `Some(true)` only blocked, `Some(false)` only not blocked
    pub blocked: Option<bool>,
    pub parent: Option<u32>,
    /// Only tasks without an active claim
    pub unclaimed: bool,
    pub claimed_by: Option<String>,
    pub class: Option<String>,
    /// Claims older than this count as expired for `unclaimed`
    pub claim_timeout: Option<Duration>,
    /// Show archived tasks even without an explicit `archived` status filter
    pub include_archived: bool,
}

impl TaskFilter {
    fn shows_archived(&self) -> bool {
        self.include_archived || self.statuses.iter().any(|s| s == ARCHIVED)
    }

    pub fn matches(&self, task: &Task, cfg: &BoardConfig, now: DateTime<Utc>) -> bool {
        if task.is_archived() && !self.shows_archived() {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if let Some(assignee) = &self.assignee
            && &task.assignee != assignee
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !task.tags.contains(tag)
        {
            return false;
        }
        if let Some(query) = &self.search
            && !search_matches(task, query)
        {
            return false;
        }
        if let Some(blocked) = self.blocked
            && task.blocked != blocked
        {
            return false;
        }
        if let Some(parent) = self.parent
            && task.parent != Some(parent)
        {
            return false;
        }
        if self.unclaimed && task.has_active_claim(self.claim_timeout, now) {
            return false;
        }
        if let Some(agent) = &self.claimed_by
            && &task.claimed_by != agent
        {
            return false;
        }
        if let Some(class) = &self.class
            && cfg.resolve_class(&task.class) != cfg.resolve_class(class)
        {
            return false;
        }
        true
    }

    /// Keep the matching tasks, preserving order.
    pub fn apply(&self, tasks: Vec<Task>, cfg: &BoardConfig, now: DateTime<Utc>) -> Vec<Task> {
        tasks
            .into_iter()
            .filter(|t| self.matches(t, cfg, now))
            .collect()
    }
}

fn search_matches(task: &Task, query: &str) -> bool {
    let needle = query.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task.body.to_lowercase().contains(&needle)
        || task.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// id → task lookup built once per query
pub fn index_by_id(tasks: &[Task]) -> HashMap<u32, &Task> {
    tasks.iter().map(|t| (t.id, t)).collect()
}

/// Every dependency resolves to a task in the terminal status. A missing
/// dependency is unsatisfied.
pub fn dependencies_satisfied(task: &Task, by_id: &HashMap<u32, &Task>, cfg: &BoardConfig) -> bool {
    task.depends_on.iter().all(|dep| {
        by_id
            .get(dep)
            .is_some_and(|d| cfg.is_terminal_status(&d.status))
    })
}

/// Tasks from `tasks` whose dependencies are all satisfied, judged against
/// the full task set `all`.
pub fn unblocked(tasks: Vec<Task>, all: &[Task], cfg: &BoardConfig) -> Vec<Task> {
    let by_id = index_by_id(all);
    tasks
        .into_iter()
        .filter(|t| dependencies_satisfied(t, &by_id, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    fn task(id: u32, status: &str) -> Task {
        Task::new(id, format!("Task {id}"), status.into(), "medium".into(), now())
    }

    fn ids(tasks: &[Task]) -> Vec<u32> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn archived_hidden_by_default() {
        let cfg = BoardConfig::new_default("t");
        let tasks = vec![task(1, "todo"), task(2, ARCHIVED)];

        let shown = TaskFilter::default().apply(tasks.clone(), &cfg, now());
        assert_eq!(ids(&shown), vec![1]);

        let explicit = TaskFilter {
            statuses: vec![ARCHIVED.into()],
            ..Default::default()
        };
        assert_eq!(ids(&explicit.apply(tasks.clone(), &cfg, now())), vec![2]);

        let all = TaskFilter {
            include_archived: true,
            ..Default::default()
        };
        assert_eq!(ids(&all.apply(tasks, &cfg, now())), vec![1, 2]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_body_tags() {
        let cfg = BoardConfig::new_default("t");
        let mut a = task(1, "todo");
        a.title = "Fix Parser".into();
        let mut b = task(2, "todo");
        b.body = "the PARSER is slow".into();
        let mut c = task(3, "todo");
        c.tags = vec!["parser-v2".into()];
        let d = task(4, "todo");

        let f = TaskFilter {
            search: Some("parser".into()),
            ..Default::default()
        };
        assert_eq!(ids(&f.apply(vec![a, b, c, d], &cfg, now())), vec![1, 2, 3]);
    }

    #[test]
    fn blocked_tri_state() {
        let cfg = BoardConfig::new_default("t");
        let mut a = task(1, "todo");
        a.block("waiting");
        let b = task(2, "todo");

        let only_blocked = TaskFilter {
            blocked: Some(true),
            ..Default::default()
        };
        let not_blocked = TaskFilter {
            blocked: Some(false),
            ..Default::default()
        };
        assert_eq!(ids(&only_blocked.apply(vec![a.clone(), b.clone()], &cfg, now())), vec![1]);
        assert_eq!(ids(&not_blocked.apply(vec![a, b], &cfg, now())), vec![2]);
    }

    #[test]
    fn unclaimed_respects_timeout() {
        let cfg = BoardConfig::new_default("t");
        let at = now();
        let mut a = task(1, "todo");
        a.claim("agent-a", at - chrono::Duration::hours(2));

        let strict = TaskFilter {
            unclaimed: true,
            ..Default::default()
        };
        assert!(strict.apply(vec![a.clone()], &cfg, at).is_empty());

        let expiring = TaskFilter {
            unclaimed: true,
            claim_timeout: Some(Duration::from_secs(3600)),
            ..Default::default()
        };
        assert_eq!(ids(&expiring.apply(vec![a], &cfg, at)), vec![1]);
    }

    #[test]
    fn class_filter_resolves_empty_to_default() {
        let cfg = BoardConfig::new_default("t");
        let plain = task(1, "todo");
        let mut urgent = task(2, "todo");
        urgent.class = "expedite".into();

        let f = TaskFilter {
            class: Some("standard".into()),
            ..Default::default()
        };
        assert_eq!(ids(&f.apply(vec![plain, urgent], &cfg, now())), vec![1]);
    }

    #[test]
    fn unblocked_requires_terminal_dependencies() {
        let cfg = BoardConfig::new_default("t");
        let mut a = task(1, "todo");
        a.depends_on = vec![10];
        let mut b = task(2, "todo");
        b.depends_on = vec![99];
        let c = task(3, "todo");
        let dep = task(10, "in-progress");

        let all = vec![a.clone(), b.clone(), c.clone(), dep.clone()];
        assert_eq!(ids(&unblocked(vec![a.clone(), b.clone(), c.clone()], &all, &cfg)), vec![3]);

        let mut done = dep;
        done.status = "done".into();
        let all = vec![a.clone(), b.clone(), c.clone(), done];
        assert_eq!(ids(&unblocked(vec![a, b, c], &all, &cfg)), vec![1, 3]);
    }
}
