//! Pick engine: choose the next task to work on.
//!
//! Candidates are unclaimed, unblocked tasks in the requested statuses
//! whose dependencies are done. They are ranked by class of service,
//! then by priority.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::config::BoardConfig;
use crate::model::task::Task;
use crate::ops::filter::{dependencies_satisfied, index_by_id};

/// Class whose tasks are ordered by due date within the class
pub const FIXED_DATE_CLASS: &str = "fixed-date";

#[derive(Debug, Clone, Default)]
pub struct PickOptions {
    /// Empty means the active statuses
    pub statuses: Vec<String>,
    pub claim_timeout: Option<Duration>,
    /// When set, a candidate must carry at least one of these tags
    pub tags: Vec<String>,
}

fn is_candidate(
    task: &Task,
    statuses: &[String],
    opts: &PickOptions,
    now: DateTime<Utc>,
) -> bool {
    statuses.contains(&task.status)
        && !task.has_active_claim(opts.claim_timeout, now)
        && !task.blocked
        && (opts.tags.is_empty() || task.tags.iter().any(|t| opts.tags.contains(t)))
}

fn rank(a: &Task, b: &Task, cfg: &BoardConfig) -> Ordering {
    let class_a = cfg.class_rank(&a.class);
    let class_b = cfg.class_rank(&b.class);
    class_a
        .cmp(&class_b)
        .then_with(|| {
            let fixed_date = cfg.class_rank(FIXED_DATE_CLASS);
            if class_a != fixed_date || cfg.class_index(FIXED_DATE_CLASS).is_none() {
                return Ordering::Equal;
            }
            match (a.due, b.due) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| {
            // higher priority index wins
            let pa = cfg.priority_index(&a.priority);
            let pb = cfg.priority_index(&b.priority);
            pb.cmp(&pa)
        })
}

/// All candidates in pick order.
pub fn ranked<'a>(
    cfg: &BoardConfig,
    tasks: &'a [Task],
    opts: &PickOptions,
    now: DateTime<Utc>,
) -> Vec<&'a Task> {
    let statuses = if opts.statuses.is_empty() {
        cfg.active_statuses()
    } else {
        opts.statuses.clone()
    };

    let mut candidates: Vec<&Task> = tasks
        .iter()
        .filter(|t| is_candidate(t, &statuses, opts, now))
        .collect();

    if !cfg.statuses.is_empty() {
        let by_id = index_by_id(tasks);
        candidates.retain(|t| dependencies_satisfied(t, &by_id, cfg));
    }

    candidates.sort_by(|a, b| rank(a, b, cfg));
    candidates
}

/// The task to work on next, if any.
pub fn pick<'a>(
    cfg: &BoardConfig,
    tasks: &'a [Task],
    opts: &PickOptions,
    now: DateTime<Utc>,
) -> Option<&'a Task> {
    ranked(cfg, tasks, opts, now).into_iter().next()
}
