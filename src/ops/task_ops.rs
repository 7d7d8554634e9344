//! Mutation paths shared by the CLI and the TUI.
//!
//! Every mutation follows the same order: validate the inputs, load the
//! board leniently, apply the change to an in-memory copy, write the task
//! file, save config.yml only when `next_id` moved, then append to the
//! activity log. A task file is never written unless every check passed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{KanbanError, Result};
use crate::io::activity::log_mutation;
use crate::io::config_io::{load_config, save_config};
use crate::io::lock::FileLock;
use crate::io::task_io::{find_by_id, read_all_lenient, relocate_task, save_task};
use crate::model::activity::Action;
use crate::model::board::Board;
use crate::model::date::Date;
use crate::model::task::{ARCHIVED, Task};
use crate::model::now;
use crate::ops::pick::{PickOptions, pick};
use crate::ops::transition::{
    Direction, Transition, apply_transition, check_entry, ensure_claim_owner, relative_status,
};

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Claim flags accepted by every mutation. `release` is processed first.
#[derive(Debug, Clone, Default)]
pub struct MutationOptions {
    pub claim: Option<String>,
    pub release: bool,
}

impl MutationOptions {
    pub fn claiming(agent: impl Into<String>) -> Self {
        MutationOptions {
            claim: Some(agent.into()),
            release: false,
        }
    }

    fn touches_claim(&self) -> bool {
        self.claim.is_some() || self.release
    }
}

/// Result of a mutation that may turn out to be a no-op
#[derive(Debug, Clone)]
pub struct Outcome {
    pub task: Task,
    pub changed: bool,
}

/// Result of a status change
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub task: Task,
    pub transition: Transition,
}

/// A task loaded for mutation, plus the board it lives on and the log
/// entries owed once it is written
struct Staged {
    all: Vec<Task>,
    task: Task,
    log: Vec<(Action, String)>,
    now: DateTime<Utc>,
}

fn load_all(board: &Board) -> Result<Vec<Task>> {
    let (tasks, warnings) = read_all_lenient(&board.tasks_dir())?;
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "mutation proceeding past unreadable task files");
    }
    Ok(tasks)
}

fn check_agent(agent: &str) -> Result<()> {
    if agent.trim().is_empty() {
        return Err(KanbanError::InvalidInput("agent name must not be empty".into()));
    }
    Ok(())
}

/// Load `id` for mutation without touching its claim.
fn load_staged(board: &Board, id: u32) -> Result<Staged> {
    let all = load_all(board)?;
    let task = find_by_id(&board.tasks_dir(), id)?;
    Ok(Staged {
        all,
        task,
        log: Vec::new(),
        now: now(),
    })
}

/// Apply `--release` then `--claim`, rejecting a claim held by someone else.
fn apply_claim_flags(board: &Board, staged: &mut Staged, opts: &MutationOptions) -> Result<()> {
    if let Some(agent) = &opts.claim {
        check_agent(agent)?;
    }
    let task = &mut staged.task;
    if opts.release && task.is_claimed() {
        staged.log.push((Action::Release, task.claimed_by.clone()));
        task.release();
    }
    ensure_claim_owner(task, opts.claim.as_deref(), board.claim_timeout, staged.now)?;
    if let Some(agent) = &opts.claim {
        task.claim(agent, staged.now);
        staged.log.push((Action::Claim, agent.clone()));
    }
    Ok(())
}

/// Load `id` for mutation and apply the claim flags.
fn stage(board: &Board, id: u32, opts: &MutationOptions) -> Result<Staged> {
    let mut staged = load_staged(board, id)?;
    apply_claim_flags(board, &mut staged, opts)?;
    Ok(staged)
}

/// Write a staged task and flush its log entries.
fn commit(board: &Board, staged: &mut Staged, rename: bool) -> Result<()> {
    staged.task.updated = staged.now;
    let tasks_dir = board.tasks_dir();
    if rename {
        relocate_task(&tasks_dir, &mut staged.task)?;
    } else {
        save_task(&tasks_dir, &mut staged.task)?;
    }
    for (action, detail) in staged.log.drain(..) {
        log_mutation(&board.dir, action, staged.task.id, detail);
    }
    Ok(())
}

fn ensure_exists(all: &[Task], id: u32, dependency: u32) -> Result<()> {
    if all.iter().any(|t| t.id == dependency) {
        Ok(())
    } else {
        Err(KanbanError::DependencyNotFound { id, dependency })
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub class: Option<String>,
    pub assignee: String,
    pub tags: Vec<String>,
    pub due: Option<Date>,
    pub estimate: String,
    pub parent: Option<u32>,
    pub depends_on: Vec<u32>,
    pub body: String,
    pub claim: Option<String>,
}

/// Create a task at its canonical path and advance `next_id`.
pub fn create_task(board: &mut Board, input: NewTask) -> Result<Task> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(KanbanError::InvalidInput("title must not be empty".into()));
    }
    if let Some(agent) = &input.claim {
        check_agent(agent)?;
    }

    let lock = FileLock::acquire_default(&board.dir)?;
    // another process may have advanced next_id since this board was loaded
    board.config = load_config(&board.dir)?;
    let cfg = &board.config;

    let status = input
        .status
        .unwrap_or_else(|| cfg.initial_status().to_string());
    cfg.check_status(&status)?;
    let priority = input
        .priority
        .unwrap_or_else(|| cfg.default_priority().to_string());
    cfg.check_priority(&priority)?;
    let class = input.class.unwrap_or_else(|| cfg.defaults.class.clone());
    cfg.check_class(&class)?;

    let all = load_all(board)?;
    let max_id = all.iter().map(|t| t.id).max().unwrap_or(0);
    let id = cfg.next_id.max(max_id + 1);

    if let Some(parent) = input.parent
        && !all.iter().any(|t| t.id == parent)
    {
        return Err(KanbanError::TaskNotFound(parent));
    }
    for &dep in &input.depends_on {
        if dep == id {
            return Err(KanbanError::SelfReference(id));
        }
        ensure_exists(&all, id, dep)?;
    }

    let at = now();
    let mut task = Task::new(id, title, status.clone(), priority, at);
    task.class = class;
    task.assignee = input.assignee;
    task.tags = input.tags;
    task.due = input.due;
    task.estimate = input.estimate;
    task.parent = input.parent;
    task.depends_on = input.depends_on;
    task.body = input.body;
    if let Some(agent) = &input.claim {
        task.claim(agent, at);
    }
    check_entry(cfg, &all, &task, &status, board.claim_timeout, at)?;
    if cfg.is_terminal_status(&status) {
        task.started = Some(at);
        task.completed = Some(at);
    }

    save_task(&board.tasks_dir(), &mut task)?;
    if board.config.next_id != id + 1 {
        board.config.next_id = id + 1;
        save_config(&board.dir, &board.config)?;
    }
    drop(lock);

    log_mutation(&board.dir, Action::Create, id, task.title.clone());
    if let Some(agent) = &input.claim {
        log_mutation(&board.dir, Action::Claim, id, agent.clone());
    }
    Ok(task)
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    Status(String),
    Relative(Direction),
}

pub fn move_task(board: &Board, id: u32, target: &MoveTarget, opts: &MutationOptions) -> Result<MoveOutcome> {
    let mut staged = load_staged(board, id)?;
    let to = match target {
        MoveTarget::Status(s) => s.clone(),
        MoveTarget::Relative(dir) => relative_status(&board.config, &staged.task, *dir)?,
    };
    if to == staged.task.status && !opts.touches_claim() {
        return Ok(MoveOutcome {
            task: staged.task,
            transition: Transition::Unchanged,
        });
    }
    apply_claim_flags(board, &mut staged, opts)?;

    let transition = apply_transition(
        &board.config,
        &staged.all,
        &mut staged.task,
        &to,
        board.claim_timeout,
        staged.now,
    )?;
    if let Some(detail) = transition.detail() {
        staged.log.push((Action::Move, detail));
    }
    commit(board, &mut staged, false)?;
    Ok(MoveOutcome {
        task: staged.task,
        transition,
    })
}

/// Per-task result of a batch operation
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub id: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Move several tasks; each succeeds or fails on its own.
pub fn move_batch(board: &Board, ids: &[u32], target: &MoveTarget, opts: &MutationOptions) -> Vec<BatchResult> {
    ids.iter()
        .map(|&id| match move_task(board, id, target, opts) {
            Ok(outcome) => BatchResult {
                id,
                ok: true,
                status: Some(outcome.task.status),
                error_code: None,
                error: None,
            },
            Err(e) => BatchResult {
                id,
                ok: false,
                status: None,
                error_code: Some(e.code()),
                error: Some(e.to_string()),
            },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// Field changes for [`edit_task`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub class: Option<String>,
    pub assignee: Option<String>,
    /// Replace the tag list wholesale
    pub tags: Option<Vec<String>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    /// `Some(None)` clears the due date
    pub due: Option<Option<Date>>,
    pub estimate: Option<String>,
    /// `Some(None)` clears the parent
    pub parent: Option<Option<u32>>,
    pub add_deps: Vec<u32>,
    pub remove_deps: Vec<u32>,
    pub body: Option<String>,
    pub append_body: Option<String>,
    pub branch: Option<String>,
    pub worktree: Option<String>,
    pub block: Option<String>,
    pub unblock: bool,
}

fn validate_edit(board: &Board, id: u32, edit: &TaskEdit) -> Result<()> {
    let cfg = &board.config;
    if let Some(title) = &edit.title
        && title.trim().is_empty()
    {
        return Err(KanbanError::InvalidInput("title must not be empty".into()));
    }
    if let Some(status) = &edit.status {
        cfg.check_status(status)?;
    }
    if let Some(priority) = &edit.priority {
        cfg.check_priority(priority)?;
    }
    if let Some(class) = &edit.class {
        cfg.check_class(class)?;
    }
    if let Some(Some(parent)) = edit.parent
        && parent == id
    {
        return Err(KanbanError::SelfReference(id));
    }
    if edit.add_deps.contains(&id) {
        return Err(KanbanError::SelfReference(id));
    }
    if let Some(reason) = &edit.block
        && reason.trim().is_empty()
    {
        return Err(KanbanError::InvalidInput("block reason must not be empty".into()));
    }
    if edit.block.is_some() && edit.unblock {
        return Err(KanbanError::InvalidInput("cannot block and unblock at once".into()));
    }
    Ok(())
}

fn set_field<T: PartialEq>(slot: &mut T, value: T, name: &'static str, changed: &mut Vec<&'static str>) {
    if *slot != value {
        *slot = value;
        changed.push(name);
    }
}

/// Apply field edits, renaming the file when the title changes.
pub fn edit_task(board: &Board, id: u32, edit: TaskEdit, opts: &MutationOptions) -> Result<Outcome> {
    validate_edit(board, id, &edit)?;
    let mut staged = stage(board, id, opts)?;

    if let Some(Some(parent)) = edit.parent
        && !staged.all.iter().any(|t| t.id == parent)
    {
        return Err(KanbanError::TaskNotFound(parent));
    }
    for &dep in &edit.add_deps {
        ensure_exists(&staged.all, id, dep)?;
    }

    let mut changed: Vec<&'static str> = Vec::new();
    let task = &mut staged.task;
    let old_title = task.title.clone();

    if let Some(title) = edit.title {
        set_field(&mut task.title, title.trim().to_string(), "title", &mut changed);
    }
    if let Some(priority) = edit.priority {
        set_field(&mut task.priority, priority, "priority", &mut changed);
    }
    if let Some(class) = edit.class {
        set_field(&mut task.class, class, "class", &mut changed);
    }
    if let Some(assignee) = edit.assignee {
        set_field(&mut task.assignee, assignee, "assignee", &mut changed);
    }

    let mut tags = edit.tags.unwrap_or_else(|| task.tags.clone());
    for tag in edit.add_tags {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.retain(|t| !edit.remove_tags.contains(t));
    set_field(&mut task.tags, tags, "tags", &mut changed);

    if let Some(due) = edit.due {
        set_field(&mut task.due, due, "due", &mut changed);
    }
    if let Some(estimate) = edit.estimate {
        set_field(&mut task.estimate, estimate, "estimate", &mut changed);
    }
    if let Some(parent) = edit.parent {
        set_field(&mut task.parent, parent, "parent", &mut changed);
    }

    let mut deps = task.depends_on.clone();
    for dep in edit.add_deps {
        if !deps.contains(&dep) {
            deps.push(dep);
        }
    }
    deps.retain(|d| !edit.remove_deps.contains(d));
    set_field(&mut task.depends_on, deps, "depends_on", &mut changed);

    let mut body = edit.body.unwrap_or_else(|| task.body.clone());
    if let Some(extra) = edit.append_body {
        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        body.push_str(&extra);
        if !body.ends_with('\n') {
            body.push('\n');
        }
    }
    set_field(&mut task.body, body, "body", &mut changed);

    if let Some(branch) = edit.branch {
        set_field(&mut task.branch, branch, "branch", &mut changed);
    }
    if let Some(worktree) = edit.worktree {
        set_field(&mut task.worktree, worktree, "worktree", &mut changed);
    }
    if let Some(reason) = edit.block {
        let reason = reason.trim().to_string();
        if !task.blocked || task.block_reason != reason {
            task.block(&reason);
            staged.log.push((Action::Block, reason));
        }
    } else if edit.unblock && task.blocked {
        task.unblock();
        staged.log.push((Action::Unblock, String::new()));
    }

    let mut moved = false;
    if let Some(status) = edit.status {
        let transition = apply_transition(
            &board.config,
            &staged.all,
            &mut staged.task,
            &status,
            board.claim_timeout,
            staged.now,
        )?;
        if let Some(detail) = transition.detail() {
            staged.log.push((Action::Move, detail));
            moved = true;
        }
    }

    if changed.is_empty() && !moved && staged.log.is_empty() {
        return Ok(Outcome {
            task: staged.task,
            changed: false,
        });
    }
    if !changed.is_empty() {
        staged.log.insert(0, (Action::Edit, changed.join(", ")));
    }
    let renamed = staged.task.title != old_title;
    commit(board, &mut staged, renamed)?;
    Ok(Outcome {
        task: staged.task,
        changed: true,
    })
}

// ---------------------------------------------------------------------------
// Claim lifecycle
// ---------------------------------------------------------------------------

/// Claim for `agent`. Re-claiming by the same agent refreshes `claimed_at`.
pub fn claim_task(board: &Board, id: u32, agent: &str) -> Result<Task> {
    let mut staged = stage(board, id, &MutationOptions::claiming(agent))?;
    commit(board, &mut staged, false)?;
    Ok(staged.task)
}

pub fn release_task(board: &Board, id: u32) -> Result<Outcome> {
    let opts = MutationOptions {
        claim: None,
        release: true,
    };
    let mut staged = stage(board, id, &opts)?;
    if staged.log.is_empty() {
        return Ok(Outcome {
            task: staged.task,
            changed: false,
        });
    }
    commit(board, &mut staged, false)?;
    Ok(Outcome {
        task: staged.task,
        changed: true,
    })
}

// ---------------------------------------------------------------------------
// Block / unblock
// ---------------------------------------------------------------------------

pub fn block_task(board: &Board, id: u32, reason: &str, opts: &MutationOptions) -> Result<Task> {
    let edit = TaskEdit {
        block: Some(reason.to_string()),
        ..Default::default()
    };
    edit_task(board, id, edit, opts).map(|o| o.task)
}

pub fn unblock_task(board: &Board, id: u32, opts: &MutationOptions) -> Result<Outcome> {
    let edit = TaskEdit {
        unblock: true,
        ..Default::default()
    };
    edit_task(board, id, edit, opts)
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorityChange {
    Set(String),
    Raise,
    Lower,
}

pub fn change_priority(board: &Board, id: u32, change: &PriorityChange, opts: &MutationOptions) -> Result<Outcome> {
    let cfg = &board.config;
    if let PriorityChange::Set(p) = change {
        cfg.check_priority(p)?;
    }
    let mut staged = load_staged(board, id)?;
    let current = staged.task.priority.clone();

    let target = match change {
        PriorityChange::Set(p) => p.clone(),
        PriorityChange::Raise | PriorityChange::Lower => {
            let index = cfg
                .priority_index(&current)
                .ok_or_else(|| KanbanError::InvalidPriority {
                    priority: current.clone(),
                    allowed: cfg.priorities.clone(),
                })?;
            let boundary = |direction: &'static str| KanbanError::Boundary {
                id,
                what: "priority",
                direction,
                value: current.clone(),
            };
            match change {
                PriorityChange::Raise if index + 1 >= cfg.priorities.len() => {
                    return Err(boundary("highest"));
                }
                PriorityChange::Raise => cfg.priorities[index + 1].clone(),
                _ if index == 0 => return Err(boundary("lowest")),
                _ => cfg.priorities[index - 1].clone(),
            }
        }
    };

    if target == current && !opts.touches_claim() {
        return Ok(Outcome {
            task: staged.task,
            changed: false,
        });
    }
    apply_claim_flags(board, &mut staged, opts)?;
    if target != current {
        staged.log.push((Action::Priority, format!("{current} -> {target}")));
        staged.task.priority = target;
    }
    commit(board, &mut staged, false)?;
    Ok(Outcome {
        task: staged.task,
        changed: true,
    })
}

// ---------------------------------------------------------------------------
// Delete / archive
// ---------------------------------------------------------------------------

fn retire(board: &Board, id: u32, opts: &MutationOptions, action: Action) -> Result<MoveOutcome> {
    let mut staged = load_staged(board, id)?;
    if staged.task.is_archived() && !opts.touches_claim() {
        return Ok(MoveOutcome {
            task: staged.task,
            transition: Transition::Unchanged,
        });
    }
    apply_claim_flags(board, &mut staged, opts)?;
    let transition = apply_transition(
        &board.config,
        &staged.all,
        &mut staged.task,
        ARCHIVED,
        board.claim_timeout,
        staged.now,
    )?;
    if !transition.is_moved() && !opts.touches_claim() {
        return Ok(MoveOutcome {
            task: staged.task,
            transition,
        });
    }
    if let Some(detail) = transition.detail() {
        staged.log.push((action, detail));
    }
    commit(board, &mut staged, false)?;
    Ok(MoveOutcome {
        task: staged.task,
        transition,
    })
}

/// Soft delete: the task moves to `archived` and its file stays.
pub fn delete_task(board: &Board, id: u32, opts: &MutationOptions) -> Result<MoveOutcome> {
    retire(board, id, opts, Action::Delete)
}

pub fn archive_task(board: &Board, id: u32, opts: &MutationOptions) -> Result<MoveOutcome> {
    retire(board, id, opts, Action::Move)
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PickRequest {
    pub statuses: Vec<String>,
    pub tags: Vec<String>,
    pub claim: Option<String>,
    pub move_to: Option<String>,
}

/// Run the pick engine, then claim and move the winner when asked.
pub fn pick_task(board: &Board, req: &PickRequest) -> Result<Outcome> {
    if let Some(agent) = &req.claim {
        check_agent(agent)?;
    }
    for status in &req.statuses {
        board.config.check_status(status)?;
    }
    if let Some(status) = &req.move_to {
        board.config.check_status(status)?;
    }

    let all = load_all(board)?;
    let opts = PickOptions {
        statuses: req.statuses.clone(),
        claim_timeout: board.claim_timeout,
        tags: req.tags.clone(),
    };
    let at = now();
    let task = pick(&board.config, &all, &opts, at)
        .cloned()
        .ok_or(KanbanError::NothingToPick)?;

    let mut staged = Staged {
        all,
        task,
        log: Vec::new(),
        now: at,
    };
    if let Some(agent) = &req.claim {
        staged.task.claim(agent, at);
        staged.log.push((Action::Claim, agent.clone()));
    }
    if let Some(status) = &req.move_to {
        let transition = apply_transition(
            &board.config,
            &staged.all,
            &mut staged.task,
            status,
            board.claim_timeout,
            at,
        )?;
        if let Some(detail) = transition.detail() {
            staged.log.push((Action::Move, detail));
        }
    }

    if staged.log.is_empty() {
        return Ok(Outcome {
            task: staged.task,
            changed: false,
        });
    }
    commit(board, &mut staged, false)?;
    Ok(Outcome {
        task: staged.task,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::activity::{LogFilter, read};
    use crate::io::config_io::{init_board, load_board};
    use crate::io::task_io::read_task;
    use crate::model::config::BoardConfig;
    use std::fs;
    use tempfile::TempDir;

    fn board() -> (TempDir, Board) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".kanban");
        let board = init_board(&dir, &BoardConfig::new_default("test")).unwrap();
        (tmp, board)
    }

    fn add(board: &mut Board, title: &str, status: &str) -> Task {
        create_task(
            board,
            NewTask {
                title: title.into(),
                status: Some(status.into()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn log_actions(board: &Board) -> Vec<(Action, u32, String)> {
        read(&board.dir, &LogFilter::default())
            .unwrap()
            .into_iter()
            .map(|e| (e.action, e.task_id, e.detail))
            .collect()
    }

    #[test]
    fn create_allocates_ids_and_files() {
        let (_tmp, mut b) = board();
        let a = add(&mut b, "First task", "todo");
        let c = add(&mut b, "Second task", "backlog");
        assert_eq!((a.id, c.id), (1, 2));
        assert!(a.file.as_ref().unwrap().ends_with("001-first-task.md"));
        assert_eq!(a.priority, "medium");
        assert_eq!(a.class, "standard");

        let reloaded = load_board(&b.dir).unwrap();
        assert_eq!(reloaded.config.next_id, 3);
        assert_eq!(log_actions(&b)[0], (Action::Create, 1, "First task".into()));
    }

    #[test]
    fn create_validates_inputs() {
        let (_tmp, mut b) = board();
        let bad = |input: NewTask, b: &mut Board| create_task(b, input).unwrap_err().code();
        assert_eq!(
            bad(NewTask { title: "  ".into(), ..Default::default() }, &mut b),
            "INVALID_INPUT"
        );
        assert_eq!(
            bad(NewTask { title: "x".into(), priority: Some("urgent".into()), ..Default::default() }, &mut b),
            "INVALID_PRIORITY"
        );
        assert_eq!(
            bad(NewTask { title: "x".into(), depends_on: vec![9], ..Default::default() }, &mut b),
            "DEPENDENCY_NOT_FOUND"
        );
        assert!(b.tasks_dir().read_dir().unwrap().next().is_none());
    }

    #[test]
    fn create_respects_column_wip() {
        let (_tmp, mut b) = board();
        b.config.wip_limits.insert("todo".into(), 1);
        save_config(&b.dir, &b.config).unwrap();
        add(&mut b, "one", "todo");
        let err = create_task(
            &mut b,
            NewTask {
                title: "two".into(),
                status: Some("todo".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "WIP_LIMIT_EXCEEDED");
    }

    #[test]
    fn move_sets_started_and_logs() {
        let (_tmp, mut b) = board();
        add(&mut b, "Task", "todo");
        let out = move_task(&b, 1, &MoveTarget::Status("in-progress".into()), &MutationOptions::default())
            .unwrap();
        assert!(out.transition.is_moved());
        assert!(out.task.started.is_some());
        let on_disk = find_by_id(&b.tasks_dir(), 1).unwrap();
        assert_eq!(on_disk.status, "in-progress");
        assert_eq!(
            log_actions(&b).last().unwrap(),
            &(Action::Move, 1, "todo -> in-progress".into())
        );
    }

    #[test]
    fn same_status_move_leaves_file_untouched() {
        let (_tmp, mut b) = board();
        let t = add(&mut b, "Task", "todo");
        let path = t.file.unwrap();
        let before = fs::read(&path).unwrap();
        let entries = log_actions(&b).len();

        let out = move_task(&b, 1, &MoveTarget::Status("todo".into()), &MutationOptions::default()).unwrap();
        assert_eq!(out.transition, Transition::Unchanged);
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(log_actions(&b).len(), entries);
    }

    #[test]
    fn same_status_move_skips_the_claim_check() {
        let (_tmp, mut b) = board();
        add(&mut b, "Task", "todo");
        claim_task(&b, 1, "alice").unwrap();
        let entries = log_actions(&b).len();

        let out = move_task(&b, 1, &MoveTarget::Status("todo".into()), &MutationOptions::default()).unwrap();
        assert_eq!(out.transition, Transition::Unchanged);
        assert_eq!(out.task.claimed_by, "alice");
        assert_eq!(log_actions(&b).len(), entries);

        delete_task(&b, 1, &MutationOptions::claiming("alice")).unwrap();
        let entries = log_actions(&b).len();
        let again = delete_task(&b, 1, &MutationOptions::default()).unwrap();
        assert_eq!(again.transition, Transition::Unchanged);
        assert_eq!(log_actions(&b).len(), entries);
    }

    #[test]
    fn claimed_task_needs_matching_agent() {
        let (_tmp, mut b) = board();
        add(&mut b, "Task", "todo");
        claim_task(&b, 1, "alice").unwrap();

        let err = move_task(&b, 1, &MoveTarget::Relative(Direction::Next), &MutationOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), "TASK_CLAIMED");
        assert_eq!(claim_task(&b, 1, "bob").unwrap_err().code(), "TASK_CLAIMED");

        move_task(&b, 1, &MoveTarget::Relative(Direction::Next), &MutationOptions::claiming("alice")).unwrap();

        // --release is processed before the owner check
        let opts = MutationOptions {
            claim: Some("bob".into()),
            release: true,
        };
        let out = move_task(&b, 1, &MoveTarget::Relative(Direction::Next), &opts).unwrap();
        assert_eq!(out.task.claimed_by, "bob");
        assert_eq!(out.task.status, "review");
    }

    #[test]
    fn batch_reports_each_task() {
        let (_tmp, mut b) = board();
        add(&mut b, "a", "todo");
        add(&mut b, "b", "done");
        let results = move_batch(
            &b,
            &[1, 2, 7],
            &MoveTarget::Relative(Direction::Next),
            &MutationOptions::default(),
        );
        assert!(results[0].ok);
        assert_eq!(results[0].status.as_deref(), Some("in-progress"));
        assert_eq!(results[1].error_code, Some("BOUNDARY_ERROR"));
        assert_eq!(results[2].error_code, Some("TASK_NOT_FOUND"));
    }

    #[test]
    fn edit_renames_on_title_change() {
        let (_tmp, mut b) = board();
        let t = add(&mut b, "Old name", "todo");
        let old_path = t.file.unwrap();

        let edit = TaskEdit {
            title: Some("New name".into()),
            add_tags: vec!["docs".into()],
            ..Default::default()
        };
        let out = edit_task(&b, 1, edit, &MutationOptions::default()).unwrap();
        assert!(out.changed);
        let new_path = out.task.file.clone().unwrap();
        assert!(new_path.ends_with("001-new-name.md"));
        assert!(!old_path.exists());
        assert_eq!(read_task(&new_path).unwrap().tags, vec!["docs"]);
        assert_eq!(log_actions(&b).last().unwrap().2, "title, tags");
    }

    #[test]
    fn edit_rejects_bad_references() {
        let (_tmp, mut b) = board();
        add(&mut b, "a", "todo");
        let self_dep = TaskEdit {
            add_deps: vec![1],
            ..Default::default()
        };
        assert_eq!(
            edit_task(&b, 1, self_dep, &MutationOptions::default()).unwrap_err().code(),
            "SELF_REFERENCE"
        );
        let missing = TaskEdit {
            add_deps: vec![42],
            ..Default::default()
        };
        assert_eq!(
            edit_task(&b, 1, missing, &MutationOptions::default()).unwrap_err().code(),
            "DEPENDENCY_NOT_FOUND"
        );
    }

    #[test]
    fn block_requires_reason() {
        let (_tmp, mut b) = board();
        add(&mut b, "a", "todo");
        assert_eq!(
            block_task(&b, 1, " ", &MutationOptions::default()).unwrap_err().code(),
            "INVALID_INPUT"
        );
        let t = block_task(&b, 1, "vendor", &MutationOptions::default()).unwrap();
        assert!(t.blocked);
        let out = unblock_task(&b, 1, &MutationOptions::default()).unwrap();
        assert!(!out.task.blocked);
        assert!(out.task.block_reason.is_empty());
    }

    #[test]
    fn priority_steps_and_boundaries() {
        let (_tmp, mut b) = board();
        add(&mut b, "a", "todo");
        let none = MutationOptions::default();
        let out = change_priority(&b, 1, &PriorityChange::Raise, &none).unwrap();
        assert_eq!(out.task.priority, "high");
        change_priority(&b, 1, &PriorityChange::Set("critical".into()), &none).unwrap();
        let err = change_priority(&b, 1, &PriorityChange::Raise, &none).unwrap_err();
        assert_eq!(err.code(), "BOUNDARY_ERROR");
        assert_eq!(err.details()["priority"], "critical");

        change_priority(&b, 1, &PriorityChange::Set("low".into()), &none).unwrap();
        let err = change_priority(&b, 1, &PriorityChange::Lower, &none).unwrap_err();
        assert_eq!(err.details()["direction"], "lowest");
    }

    #[test]
    fn delete_is_soft_and_reversible() {
        let (_tmp, mut b) = board();
        let t = add(&mut b, "a", "done");
        delete_task(&b, 1, &MutationOptions::default()).unwrap();
        let archived = read_task(t.file.as_ref().unwrap()).unwrap();
        assert_eq!(archived.status, ARCHIVED);
        assert!(archived.completed.is_some());

        let out = move_task(&b, 1, &MoveTarget::Status("todo".into()), &MutationOptions::default()).unwrap();
        assert_eq!(out.task.completed, None);
        assert!(log_actions(&b).iter().any(|(a, _, d)| *a == Action::Delete && d == "done -> archived"));
    }

    #[test]
    fn pick_claims_and_moves() {
        let (_tmp, mut b) = board();
        add(&mut b, "a", "todo");
        let req = PickRequest {
            claim: Some("agent-1".into()),
            move_to: Some("in-progress".into()),
            ..Default::default()
        };
        let out = pick_task(&b, &req).unwrap();
        assert_eq!(out.task.claimed_by, "agent-1");
        assert_eq!(out.task.status, "in-progress");

        // the only candidate is now claimed
        assert_eq!(pick_task(&b, &req).unwrap_err().code(), "NOTHING_TO_PICK");
    }
}
