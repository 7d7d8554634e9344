use std::cmp::Ordering;

use crate::model::config::BoardConfig;
use crate::model::task::Task;

/// Field a task listing is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Status,
    Priority,
    Due,
    Created,
    Updated,
}

impl SortField {
    /// Unknown names fall back to `Id`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "status" => SortField::Status,
            "priority" => SortField::Priority,
            "due" => SortField::Due,
            "created" => SortField::Created,
            "updated" => SortField::Updated,
            _ => SortField::Id,
        }
    }
}

fn compare(a: &Task, b: &Task, field: SortField, cfg: &BoardConfig) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        // archived and unknown values sort after every configured one
        SortField::Status => {
            let key = |t: &Task| cfg.status_index(&t.status).unwrap_or(usize::MAX);
            key(a).cmp(&key(b))
        }
        SortField::Priority => {
            let key = |t: &Task| cfg.priority_index(&t.priority).unwrap_or(usize::MAX);
            key(a).cmp(&key(b))
        }
        SortField::Due => match (a.due, b.due) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortField::Created => a.created.cmp(&b.created),
        SortField::Updated => a.updated.cmp(&b.updated),
    }
}

/// Stable sort; `reverse` inverts the comparison, so ties keep their order.
pub fn sort_tasks(tasks: &mut [Task], field: SortField, reverse: bool, cfg: &BoardConfig) {
    tasks.sort_by(|a, b| {
        let ord = compare(a, b, field, cfg);
        if reverse { ord.reverse() } else { ord }
    });
}
