//! The single status-transition function and the rules every move obeys:
//! claim requirements, column and class WIP limits, boundary moves and
//! timestamp side effects.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{KanbanError, Result};
use crate::model::config::BoardConfig;
use crate::model::task::Task;

/// Relative move through the configured status order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// What a transition did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved { from: String, to: String },
    /// Target equals the current status; nothing changed
    Unchanged,
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }

    /// `from -> to` detail for the activity log
    pub fn detail(&self) -> Option<String> {
        match self {
            Transition::Moved { from, to } => Some(format!("{from} -> {to}")),
            Transition::Unchanged => None,
        }
    }
}

/// Status one step from the task's current one.
pub fn relative_status(cfg: &BoardConfig, task: &Task, direction: Direction) -> Result<String> {
    let boundary = |dir: &'static str| KanbanError::Boundary {
        id: task.id,
        what: "status",
        direction: dir,
        value: task.status.clone(),
    };
    // archived sits past the terminal status
    let index = match cfg.status_index(&task.status) {
        Some(i) => i,
        None if task.is_archived() => cfg.statuses.len(),
        None => {
            return Err(KanbanError::InvalidStatus {
                status: task.status.clone(),
                allowed: cfg.allowed_statuses(),
            });
        }
    };
    match direction {
        Direction::Next => {
            if index + 1 >= cfg.statuses.len() {
                return Err(boundary("last"));
            }
            Ok(cfg.statuses[index + 1].clone())
        }
        Direction::Prev => {
            if index == 0 {
                return Err(boundary("first"));
            }
            Ok(cfg.statuses[index - 1].clone())
        }
    }
}

/// Fail with `TASK_CLAIMED` when someone other than `agent` holds an
/// active claim on `task`.
pub fn ensure_claim_owner(
    task: &Task,
    agent: Option<&str>,
    timeout: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<()> {
    if task.has_active_claim(timeout, now) && agent != Some(task.claimed_by.as_str()) {
        return Err(KanbanError::TaskClaimed {
            id: task.id,
            claimed_by: task.claimed_by.clone(),
        });
    }
    Ok(())
}

/// Checks for `task` entering status `to`: claim requirement, column WIP
/// (unless the class bypasses it) and class WIP. `all` is the board's task
/// set; the task itself is never counted.
pub fn check_entry(
    cfg: &BoardConfig,
    all: &[Task],
    task: &Task,
    to: &str,
    timeout: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<()> {
    cfg.check_status(to)?;

    if cfg.requires_claim(to, &task.class) && !task.has_active_claim(timeout, now) {
        return Err(KanbanError::ClaimRequired {
            id: task.id,
            status: to.to_string(),
        });
    }

    let class = cfg.class_config(&task.class);
    let bypass = class.is_some_and(|c| c.bypass_column_wip);
    if !bypass
        && !cfg.is_archived_status(to)
        && let Some(limit) = cfg.wip_limit(to)
    {
        let current = all
            .iter()
            .filter(|t| t.id != task.id && t.status == to)
            .count();
        if current >= limit {
            return Err(KanbanError::WipLimitExceeded {
                status: to.to_string(),
                limit,
                current,
            });
        }
    }

    if let Some(class) = class
        && let Some(limit) = class.wip_limit
        && !cfg.is_terminal_status(to)
        && !cfg.is_archived_status(to)
    {
        let current = all
            .iter()
            .filter(|t| {
                t.id != task.id
                    && cfg.resolve_class(&t.class) == class.name
                    && !cfg.is_terminal_status(&t.status)
                    && !t.is_archived()
            })
            .count();
        if current >= limit {
            return Err(KanbanError::ClassWipExceeded {
                class: class.name.clone(),
                limit,
                current,
            });
        }
    }
    Ok(())
}

/// Move `task` to `to`. Same status is a no-op with no validation;
/// otherwise every rule is checked before the task is touched.
pub fn apply_transition(
    cfg: &BoardConfig,
    all: &[Task],
    task: &mut Task,
    to: &str,
    timeout: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<Transition> {
    if task.status == to {
        return Ok(Transition::Unchanged);
    }
    check_entry(cfg, all, task, to, timeout, now)?;

    let from = std::mem::replace(&mut task.status, to.to_string());
    apply_timestamps(cfg, task, &from, to, now);
    Ok(Transition::Moved {
        from,
        to: to.to_string(),
    })
}

/// Leaving the first status, or any forward move, starts the clock.
fn apply_timestamps(cfg: &BoardConfig, task: &mut Task, from: &str, to: &str, now: DateTime<Utc>) {
    let forward = matches!(
        (cfg.status_index(from), cfg.status_index(to)),
        (Some(f), Some(t)) if t > f
    );
    if task.started.is_none() && (from == cfg.first_status() || forward) {
        task.started = Some(now);
    }
    let leaving_done = cfg.is_terminal_status(from) || cfg.is_archived_status(from);
    if cfg.is_terminal_status(to) {
        task.completed = Some(now);
        if task.started.is_none() {
            task.started = Some(now);
        }
    } else if leaving_done && !cfg.is_archived_status(to) {
        task.completed = None;
    }
    task.updated = now;
}
