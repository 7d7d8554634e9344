use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::io::activity::log_mutation;
use crate::io::config_io::save_config;
use crate::io::lock::FileLock;
use crate::io::task_io::{read_all_lenient, relocate_task, save_task};
use crate::model::activity::Action;
use crate::model::board::Board;
use crate::model::now;
use crate::model::task::Task;
use crate::parse::extract_id;

/// Structured result from `kanban check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub warnings: Vec<CheckWarning>,
    pub repairs: Vec<Repair>,
}

/// Something worth knowing that the pass does not fix.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckWarning {
    /// Task file could not be parsed
    Unreadable { file: PathBuf, error: String },
    /// `depends_on` names a task that does not exist
    DanglingDependency { id: u32, dependency: u32 },
    /// `parent` names a task that does not exist
    MissingParent { id: u32, parent: u32 },
    /// `blocked: true` without a reason
    BlockedWithoutReason { id: u32 },
    /// Only one of `claimed_by` / `claimed_at` is set
    HalfClaim { id: u32 },
}

/// A change the pass wrote to disk.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Repair {
    /// Duplicate preamble id replaced with a fresh one
    ReassignedId { file: PathBuf, from: u32, to: u32 },
    /// File renamed so its numeric prefix matches the preamble id
    RenamedFile { id: u32, from: PathBuf, to: PathBuf },
    /// `next_id` in config.yml raised above every task id
    NextId { from: u32, to: u32 },
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.repairs.is_empty()
    }
}

fn filename_id(path: Option<&Path>) -> Option<u32> {
    path.and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(extract_id)
}

/// Reconcile filename ids, preamble ids and `next_id`, writing repairs.
///
/// Idempotent: running it again on a repaired board reports no repairs.
/// The board lock is held while files are rewritten; other writers that
/// do not take it (plain task edits) must not run concurrently.
pub fn run_check(board: &mut Board) -> Result<CheckReport> {
    let mut report = CheckReport::default();
    let tasks_dir = board.tasks_dir();

    let lock = FileLock::acquire_default(&board.dir)?;
    let (mut tasks, read_warnings) = read_all_lenient(&tasks_dir)?;
    report.warnings.extend(
        read_warnings
            .into_iter()
            .map(|w| CheckWarning::Unreadable {
                file: w.file,
                error: w.error,
            }),
    );
    // lenient reads come back in path order already; keep that explicit
    tasks.sort_by(|a, b| a.file.cmp(&b.file));

    let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
    let mut candidate_next = board.config.next_id.max(max_id + 1);

    // Duplicate preamble ids: the task whose filename agrees keeps the id,
    // first by path otherwise.
    let mut by_id: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, t) in tasks.iter().enumerate() {
        by_id.entry(t.id).or_default().push(i);
    }
    let mut reassigned: Vec<usize> = Vec::new();
    for (id, indices) in &by_id {
        if indices.len() < 2 {
            continue;
        }
        let keeper = indices
            .iter()
            .copied()
            .find(|&i| filename_id(tasks[i].file.as_deref()) == Some(*id))
            .unwrap_or(indices[0]);
        for &i in indices.iter().filter(|&&i| i != keeper) {
            let fresh = candidate_next;
            candidate_next += 1;
            debug!(from = *id, to = fresh, "reassigning duplicate id");
            report.repairs.push(Repair::ReassignedId {
                file: tasks[i].file.clone().unwrap_or_default(),
                from: *id,
                to: fresh,
            });
            tasks[i].id = fresh;
            reassigned.push(i);
        }
    }

    let at = now();
    let mut log: Vec<(u32, String)> = Vec::new();
    for (i, task) in tasks.iter_mut().enumerate() {
        let was_reassigned = reassigned.contains(&i);
        if was_reassigned {
            task.updated = at;
        }
        let old_path = task.file.clone();
        if filename_id(old_path.as_deref()) != Some(task.id) {
            let new_path = relocate_task(&tasks_dir, task)?;
            log.push((task.id, format!("renamed to {}", display_name(&new_path))));
            report.repairs.push(Repair::RenamedFile {
                id: task.id,
                from: old_path.unwrap_or_default(),
                to: new_path,
            });
        } else if was_reassigned {
            save_task(&tasks_dir, task)?;
            log.push((task.id, "reassigned duplicate id".to_string()));
        }
    }

    let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
    let next_id = candidate_next.max(max_id + 1);
    if next_id != board.config.next_id {
        report.repairs.push(Repair::NextId {
            from: board.config.next_id,
            to: next_id,
        });
        board.config.next_id = next_id;
        save_config(&board.dir, &board.config)?;
    }
    drop(lock);

    report.warnings.extend(reference_warnings(&tasks));
    for (id, detail) in log {
        log_mutation(&board.dir, Action::Repair, id, detail);
    }
    Ok(report)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn reference_warnings(tasks: &[Task]) -> Vec<CheckWarning> {
    let ids: HashSet<u32> = tasks.iter().map(|t| t.id).collect();
    let mut warnings = Vec::new();
    for t in tasks {
        for &dep in &t.depends_on {
            if !ids.contains(&dep) {
                warnings.push(CheckWarning::DanglingDependency {
                    id: t.id,
                    dependency: dep,
                });
            }
        }
        if let Some(parent) = t.parent
            && !ids.contains(&parent)
        {
            warnings.push(CheckWarning::MissingParent { id: t.id, parent });
        }
        if t.blocked && t.block_reason.trim().is_empty() {
            warnings.push(CheckWarning::BlockedWithoutReason { id: t.id });
        }
        if t.claimed_by.is_empty() != t.claimed_at.is_none() {
            warnings.push(CheckWarning::HalfClaim { id: t.id });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config_io::{init_board, load_config};
    use crate::io::task_io::{read_all, write_task_to};
    use crate::model::config::BoardConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, id: u32, title: &str) {
        let t = Task::new(id, title.into(), "todo".into(), "low".into(), now());
        write_task_to(&t, &dir.join(name)).unwrap();
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn repairs_duplicates_and_mismatched_names() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = BoardConfig::new_default("t");
        cfg.next_id = 2;
        let mut board = init_board(tmp.path(), &cfg).unwrap();
        let tasks_dir = board.tasks_dir();
        write(&tasks_dir, "001-a.md", 1, "a");
        write(&tasks_dir, "002-b.md", 1, "b");
        write(&tasks_dir, "099-c.md", 3, "c");

        let report = run_check(&mut board).unwrap();
        assert_eq!(report.repairs.len(), 4);

        assert_eq!(file_names(&tasks_dir), vec!["001-a.md", "003-c.md", "004-b.md"]);
        let mut ids: Vec<u32> = read_all(&tasks_dir).unwrap().iter().map(|t| t.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(load_config(tmp.path()).unwrap().next_id, 5);

        let again = run_check(&mut board).unwrap();
        assert!(again.repairs.is_empty(), "{:?}", again.repairs);
    }

    #[test]
    fn rename_avoids_occupied_canonical_name() {
        let tmp = TempDir::new().unwrap();
        let mut board = init_board(tmp.path(), &BoardConfig::new_default("t")).unwrap();
        let tasks_dir = board.tasks_dir();
        fs::write(tasks_dir.join("005-x.md"), "not a task").unwrap();
        write(&tasks_dir, "050-x.md", 5, "x");

        let report = run_check(&mut board).unwrap();
        assert!(tasks_dir.join("005-x-2.md").exists());
        assert!(!tasks_dir.join("050-x.md").exists());
        assert!(matches!(report.warnings[0], CheckWarning::Unreadable { .. }));
    }

    #[test]
    fn reports_reference_warnings() {
        let tmp = TempDir::new().unwrap();
        let mut board = init_board(tmp.path(), &BoardConfig::new_default("t")).unwrap();
        let mut t = Task::new(1, "a".into(), "todo".into(), "low".into(), now());
        t.depends_on = vec![9];
        t.parent = Some(8);
        t.blocked = true;
        write_task_to(&t, &board.tasks_dir().join("001-a.md")).unwrap();

        let report = run_check(&mut board).unwrap();
        assert_eq!(report.warnings.len(), 3);
        // next_id 1 -> 2 is the only repair
        assert_eq!(report.repairs.len(), 1);
    }
}
