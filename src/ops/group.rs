use indexmap::IndexMap;
use serde::Serialize;

use crate::model::config::BoardConfig;
use crate::model::task::{ARCHIVED, Task};

pub const UNASSIGNED: &str = "(unassigned)";
pub const UNTAGGED: &str = "(untagged)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Assignee,
    Tag,
    Class,
    Priority,
    Status,
}

impl GroupField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "assignee" => Some(GroupField::Assignee),
            "tag" | "tags" => Some(GroupField::Tag),
            "class" => Some(GroupField::Class),
            "priority" => Some(GroupField::Priority),
            "status" => Some(GroupField::Status),
            _ => None,
        }
    }

    pub const NAMES: &'static [&'static str] = &["assignee", "tag", "class", "priority", "status"];
}

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub key: String,
    /// Task count per status, in configured order; zero counts omitted
    pub counts: IndexMap<String, usize>,
    pub tasks: Vec<Task>,
}

fn keys_for(task: &Task, field: GroupField, cfg: &BoardConfig) -> Vec<String> {
    match field {
        GroupField::Assignee if task.assignee.is_empty() => vec![UNASSIGNED.to_string()],
        GroupField::Assignee => vec![task.assignee.clone()],
        GroupField::Tag if task.tags.is_empty() => vec![UNTAGGED.to_string()],
        GroupField::Tag => {
            // duplicate tags must not put the task in a group twice
            let mut keys: Vec<String> = Vec::new();
            for tag in &task.tags {
                if !keys.contains(tag) {
                    keys.push(tag.clone());
                }
            }
            keys
        }
        GroupField::Class => vec![cfg.resolve_class(&task.class).to_string()],
        GroupField::Priority => vec![task.priority.clone()],
        GroupField::Status => vec![task.status.clone()],
    }
}

/// Ordering key: configured index for ordered fields, else alphabetical
/// with the sentinel group first.
fn order_key(key: &str, field: GroupField, cfg: &BoardConfig) -> (usize, String) {
    let index = match field {
        GroupField::Status if key == ARCHIVED => Some(cfg.statuses.len()),
        GroupField::Status => cfg.status_index(key),
        GroupField::Priority => cfg.priority_index(key),
        GroupField::Class => cfg.class_index(key),
        GroupField::Assignee | GroupField::Tag => {
            let sentinel = key == UNASSIGNED || key == UNTAGGED;
            Some(if sentinel { 0 } else { 1 })
        }
    };
    (index.unwrap_or(usize::MAX), key.to_string())
}

fn status_counts(tasks: &[Task], cfg: &BoardConfig) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for status in cfg.allowed_statuses() {
        let n = tasks.iter().filter(|t| t.status == status).count();
        if n > 0 {
            counts.insert(status, n);
        }
    }
    // statuses no longer in the config still get counted
    for t in tasks {
        if !cfg.is_valid_status(&t.status) {
            *counts.entry(t.status.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Partition tasks by `field`. A task with several tags lands in each
/// tag's group.
pub fn group_by(tasks: &[Task], field: GroupField, cfg: &BoardConfig) -> Vec<Group> {
    let mut buckets: IndexMap<String, Vec<Task>> = IndexMap::new();
    for task in tasks {
        for key in keys_for(task, field, cfg) {
            buckets.entry(key).or_default().push(task.clone());
        }
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .map(|(key, tasks)| Group {
            counts: status_counts(&tasks, cfg),
            key,
            tasks,
        })
        .collect();
    groups.sort_by_key(|g| order_key(&g.key, field, cfg));
    groups
}
