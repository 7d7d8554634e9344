use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::config::BoardConfig;
use crate::model::task::Task;

/// A task sitting in an active status, with how long it has been there
#[derive(Debug, Clone, Serialize)]
pub struct AgingItem {
    pub id: u32,
    pub title: String,
    pub status: String,
    pub age_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowMetrics {
    pub throughput_7d: usize,
    pub throughput_30d: usize,
    /// created → completed, averaged over completed tasks
    pub avg_lead_time_hours: Option<f64>,
    /// started → completed, averaged over completed tasks with a start
    pub avg_cycle_time_hours: Option<f64>,
    pub wip: usize,
    pub blocked: usize,
    /// Oldest first
    pub aging: Vec<AgingItem>,
}

fn hours(d: Duration) -> f64 {
    d.num_seconds() as f64 / 3600.0
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Flow metrics over `tasks`. `since` limits which completed tasks feed the
/// lead and cycle time averages.
pub fn compute(
    cfg: &BoardConfig,
    tasks: &[Task],
    since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> FlowMetrics {
    let completed: Vec<(&Task, DateTime<Utc>)> = tasks
        .iter()
        .filter(|t| cfg.is_terminal_status(&t.status))
        .filter_map(|t| t.completed.map(|c| (t, c)))
        .collect();

    let completed_within = |days: i64| {
        let cutoff = Duration::try_days(days).and_then(|d| now.checked_sub_signed(d));
        completed
            .iter()
            .filter(|(_, c)| cutoff.is_none_or(|cutoff| *c >= cutoff))
            .count()
    };

    let window: Vec<&(&Task, DateTime<Utc>)> = completed
        .iter()
        .filter(|(_, c)| since.is_none_or(|s| *c >= s))
        .collect();
    let lead: Vec<f64> = window.iter().map(|(t, c)| hours(*c - t.created)).collect();
    let cycle: Vec<f64> = window
        .iter()
        .filter_map(|(t, c)| t.started.map(|s| hours(*c - s)))
        .collect();

    let active = cfg.active_statuses();
    let in_flight: Vec<&Task> = tasks.iter().filter(|t| active.contains(&t.status)).collect();

    let mut aging: Vec<AgingItem> = in_flight
        .iter()
        .map(|t| AgingItem {
            id: t.id,
            title: t.title.clone(),
            status: t.status.clone(),
            age_hours: hours(now - t.started.unwrap_or(t.created)),
        })
        .collect();
    aging.sort_by(|a, b| b.age_hours.total_cmp(&a.age_hours));

    FlowMetrics {
        throughput_7d: completed_within(7),
        throughput_30d: completed_within(30),
        avg_lead_time_hours: average(&lead),
        avg_cycle_time_hours: average(&cycle),
        wip: in_flight.len(),
        blocked: tasks
            .iter()
            .filter(|t| t.blocked && !t.is_archived() && !cfg.is_terminal_status(&t.status))
            .count(),
        aging,
    }
}
