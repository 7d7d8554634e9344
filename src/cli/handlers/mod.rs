mod init;
pub use init::cmd_init;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::error::{KanbanError, Result, exit_codes};
use crate::io::activity::{self, LogFilter};
use crate::io::config_io::open_board;
use crate::io::task_io::{find_by_id, read_all_lenient};
use crate::model::activity::Action;
use crate::model::board::Board;
use crate::model::date::Date;
use crate::model::now;
use crate::model::task::Task;
use crate::ops::check::run_check;
use crate::ops::context::{ContextOptions, Section, extract, render_markdown};
use crate::ops::filter::{TaskFilter, unblocked};
use crate::ops::group::{GroupField, group_by};
use crate::ops::metrics;
use crate::ops::sort::{SortField, sort_tasks};
use crate::ops::summary::summarize;
use crate::ops::task_ops::{self, MoveTarget, MutationOptions, NewTask, PickRequest, PriorityChange, TaskEdit};
use crate::ops::transition::{Direction, Transition};

/// Board plus the chosen output format, shared by every board command
struct Ctx {
    board: Board,
    format: OutputFormat,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run a subcommand and return the process exit code.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let Cli {
        command,
        dir,
        json,
        table,
        compact,
        claim_timeout,
    } = cli;
    let format = OutputFormat::from_flags(json, table, compact);

    let Some(command) = command else {
        return Err(KanbanError::InvalidInput("no command given".into()));
    };
    let open = || -> Result<Ctx> {
        let board = open_board(dir.as_deref().map(Path::new), claim_timeout.as_deref())?;
        Ok(Ctx { board, format })
    };

    match command {
        // Init runs before any board exists
        Commands::Init(args) => cmd_init(args, dir.as_deref(), format)?,

        // Read commands
        Commands::List(args) => cmd_list(&open()?, args)?,
        Commands::Show(args) => cmd_show(&open()?, args)?,
        Commands::Board => cmd_board(&open()?)?,
        Commands::Log(args) => cmd_log(&open()?, args)?,
        Commands::Metrics(args) => cmd_metrics(&open()?, args)?,
        Commands::Context(args) => cmd_context(&open()?, args)?,

        // Write commands
        Commands::Add(args) => cmd_add(&mut open()?, args)?,
        Commands::Move(args) => return cmd_move(&open()?, args),
        Commands::Pick(args) => cmd_pick(&open()?, args)?,
        Commands::Claim(args) => cmd_claim(&open()?, args)?,
        Commands::Release(args) => cmd_release(&open()?, args)?,
        Commands::Edit(args) => cmd_edit(&open()?, args)?,
        Commands::Block(args) => cmd_block(&open()?, args)?,
        Commands::Unblock(args) => cmd_unblock(&open()?, args)?,
        Commands::Priority(args) => cmd_priority(&open()?, args)?,
        Commands::Delete(args) => cmd_delete(&open()?, args)?,
        Commands::Archive(args) => cmd_archive(&open()?, args)?,

        // Maintenance
        Commands::Check => cmd_check(&mut open()?)?,
    }
    Ok(exit_codes::SUCCESS)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Task id as typed by a user: `12` or `#12`.
pub fn parse_id(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    match digits.parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(KanbanError::InvalidTaskId(s.to_string())),
    }
}

/// Comma-separated ids; empty segments are ignored.
pub fn parse_ids(s: &str) -> Result<Vec<u32>> {
    let ids = s
        .split(',')
        .filter(|p| !p.trim().is_empty())
        .map(parse_id)
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(KanbanError::InvalidTaskId(s.to_string()));
    }
    Ok(ids)
}

fn parse_id_list(values: &[String]) -> Result<Vec<u32>> {
    values.iter().map(|v| parse_id(v)).collect()
}

/// Midnight UTC at the start of a `YYYY-MM-DD` date.
fn parse_since(s: &str) -> Result<DateTime<Utc>> {
    let date = Date::parse(s)?;
    date.naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| KanbanError::InvalidDate(s.to_string()))
}

fn claim_opts(flags: &ClaimFlags) -> MutationOptions {
    MutationOptions {
        claim: flags.claim.clone(),
        release: flags.release,
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

/// Print a mutated task: JSON document or a one-line confirmation.
fn report_mutation(ctx: &Ctx, task: &Task, changed: bool, message: String) -> Result<()> {
    if ctx.format.is_json() {
        print_json(&MutationJson {
            changed,
            task: task_to_json(task),
        })
    } else {
        println!("{message}");
        Ok(())
    }
}

/// Tasks for display: lenient read, warnings to stderr.
fn load_for_display(board: &Board) -> Result<Vec<Task>> {
    let (tasks, warnings) = read_all_lenient(&board.tasks_dir())?;
    for w in &warnings {
        eprintln!("warning: skipping {}: {}", w.file.display(), w.error);
    }
    Ok(tasks)
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Ctx, args: ListArgs) -> Result<()> {
    let cfg = &ctx.board.config;
    for status in &args.status {
        cfg.check_status(status)?;
    }
    for priority in &args.priority {
        cfg.check_priority(priority)?;
    }
    if let Some(class) = &args.class {
        cfg.check_class(class)?;
    }
    let group_field = match args.group_by.as_deref() {
        Some(g) => Some(GroupField::parse(g).ok_or_else(|| {
            KanbanError::InvalidInput(format!(
                "invalid --group-by {g:?} (expected one of: {})",
                GroupField::NAMES.join(", ")
            ))
        })?),
        None => None,
    };

    let filter = TaskFilter {
        statuses: args.status,
        priorities: args.priority,
        assignee: args.assignee,
        tag: args.tag,
        search: args.search,
        blocked: match (args.blocked, args.not_blocked) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        parent: args.parent.as_deref().map(parse_id).transpose()?,
        unclaimed: args.unclaimed,
        claimed_by: args.claimed_by,
        class: args.class,
        claim_timeout: ctx.board.claim_timeout,
        include_archived: args.archived,
    };

    let all = load_for_display(&ctx.board)?;
    let at = now();
    let mut tasks = filter.apply(all.clone(), cfg, at);
    if args.unblocked {
        tasks = unblocked(tasks, &all, cfg);
    }
    sort_tasks(&mut tasks, SortField::parse(&args.sort), args.reverse, cfg);
    if let Some(limit) = args.limit {
        tasks.truncate(limit);
    }

    if let Some(field) = group_field {
        let groups = group_by(&tasks, field, cfg);
        if ctx.format.is_json() {
            let out: Vec<_> = groups.iter().map(group_to_json).collect();
            return print_json(&out);
        }
        print_lines(&format_groups(&groups, ctx.format, cfg, at, ctx.board.claim_timeout));
        return Ok(());
    }

    match ctx.format {
        OutputFormat::Json => {
            let out: Vec<_> = tasks.iter().map(task_to_json).collect();
            print_json(&out)?;
        }
        OutputFormat::Table => {
            if tasks.is_empty() {
                println!("no tasks");
            } else {
                print_lines(&format_task_table(&tasks, cfg, at, ctx.board.claim_timeout));
            }
        }
        OutputFormat::Compact => {
            for task in &tasks {
                println!("{}", format_task_line(task));
            }
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Ctx, args: IdArg) -> Result<()> {
    let id = parse_id(&args.id)?;
    let task = find_by_id(&ctx.board.tasks_dir(), id)?;
    if ctx.format.is_json() {
        return print_json(&task_to_json(&task));
    }
    print_lines(&format_task_detail(&task));
    Ok(())
}

fn cmd_board(ctx: &Ctx) -> Result<()> {
    let tasks = load_for_display(&ctx.board)?;
    let summary = summarize(&ctx.board.config, &tasks, now());
    if ctx.format.is_json() {
        return print_json(&summary);
    }
    print_lines(&format_summary(&summary));
    Ok(())
}

fn cmd_log(ctx: &Ctx, args: LogArgs) -> Result<()> {
    let action = match args.action.as_deref() {
        Some(a) => Some(Action::parse_action(a).ok_or_else(|| {
            KanbanError::InvalidInput(format!("unknown action {a:?}"))
        })?),
        None => None,
    };
    let filter = LogFilter {
        since: args.since.as_deref().map(parse_since).transpose()?,
        action,
        task_id: args.task.as_deref().map(parse_id).transpose()?,
        limit: args.limit.unwrap_or(0),
    };
    let entries = activity::read(&ctx.board.dir, &filter)?;
    if ctx.format.is_json() {
        return print_json(&entries);
    }
    for entry in &entries {
        println!("{}", format_log_entry(entry));
    }
    Ok(())
}

fn cmd_metrics(ctx: &Ctx, args: MetricsArgs) -> Result<()> {
    let since = args.since.as_deref().map(parse_since).transpose()?;
    let tasks = load_for_display(&ctx.board)?;
    let m = metrics::compute(&ctx.board.config, &tasks, since, now());
    if ctx.format.is_json() {
        return print_json(&m);
    }
    print_lines(&format_metrics(&m));
    Ok(())
}

fn cmd_context(ctx: &Ctx, args: ContextArgs) -> Result<()> {
    let sections = args
        .sections
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| Section::parse(s))
        .collect::<Result<Vec<_>>>()?;
    if args.days < 0 {
        return Err(KanbanError::InvalidInput("--days must not be negative".into()));
    }
    let opts = ContextOptions {
        sections,
        days: args.days,
    };
    let tasks = load_for_display(&ctx.board)?;
    let doc = extract(&ctx.board.config, &tasks, &opts, now());
    if ctx.format.is_json() {
        return print_json(&doc);
    }
    print!("{}", render_markdown(&doc));
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &mut Ctx, args: AddArgs) -> Result<()> {
    let input = NewTask {
        title: args.title,
        status: args.status,
        priority: args.priority,
        class: args.class,
        assignee: args.assignee.unwrap_or_default(),
        tags: args.tags.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect(),
        due: args.due.as_deref().map(Date::parse).transpose()?,
        estimate: args.estimate.unwrap_or_default(),
        parent: args.parent.as_deref().map(parse_id).transpose()?,
        depends_on: parse_id_list(&args.depends_on)?,
        body: args.body.unwrap_or_default(),
        claim: args.claim,
    };
    let task = task_ops::create_task(&mut ctx.board, input)?;
    let message = format!("created #{} {}", task.id, task.title);
    report_mutation(ctx, &task, true, message)
}

fn move_target(args: &MoveArgs) -> Result<MoveTarget> {
    if args.next {
        return Ok(MoveTarget::Relative(Direction::Next));
    }
    if args.prev {
        return Ok(MoveTarget::Relative(Direction::Prev));
    }
    args.status
        .clone()
        .map(MoveTarget::Status)
        .ok_or_else(|| KanbanError::InvalidInput("move needs a status, --next or --prev".into()))
}

/// Single moves report like any mutation; batches print one result per
/// task and exit 1 when any of them failed.
fn cmd_move(ctx: &Ctx, args: MoveArgs) -> Result<i32> {
    let ids = parse_ids(&args.ids)?;
    let target = move_target(&args)?;
    let opts = claim_opts(&args.claim);

    if let &[id] = ids.as_slice() {
        let outcome = task_ops::move_task(&ctx.board, id, &target, &opts)?;
        let task = &outcome.task;
        let (from, changed) = match &outcome.transition {
            Transition::Moved { from, .. } => (Some(from.as_str()), true),
            Transition::Unchanged => (None, false),
        };
        if ctx.format.is_json() {
            print_json(&MoveJson {
                id,
                changed,
                from,
                status: &task.status,
            })?;
        } else if let Some(from) = from {
            println!("#{id} {from} -> {}", task.status);
        } else {
            println!("#{id} already in {}", task.status);
        }
        return Ok(exit_codes::SUCCESS);
    }

    let results = task_ops::move_batch(&ctx.board, &ids, &target, &opts);
    if ctx.format.is_json() {
        print_json(&results)?;
    } else {
        print_lines(&format_batch(&results));
    }
    if results.iter().all(|r| r.ok) {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::USER_ERROR)
    }
}

fn cmd_pick(ctx: &Ctx, args: PickArgs) -> Result<()> {
    let req = PickRequest {
        statuses: args.status,
        tags: args.tags,
        claim: args.claim,
        move_to: args.move_to,
    };
    let outcome = task_ops::pick_task(&ctx.board, &req)?;
    let message = format_task_line(&outcome.task);
    report_mutation(ctx, &outcome.task, outcome.changed, message)
}

fn cmd_claim(ctx: &Ctx, args: ClaimArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let task = task_ops::claim_task(&ctx.board, id, &args.agent)?;
    let message = format!("#{id} claimed by {}", task.claimed_by);
    report_mutation(ctx, &task, true, message)
}

fn cmd_release(ctx: &Ctx, args: IdArg) -> Result<()> {
    let id = parse_id(&args.id)?;
    let outcome = task_ops::release_task(&ctx.board, id)?;
    let message = if outcome.changed {
        format!("#{id} released")
    } else {
        format!("#{id} was not claimed")
    };
    report_mutation(ctx, &outcome.task, outcome.changed, message)
}

fn cmd_edit(ctx: &Ctx, args: EditArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let due = if args.clear_due {
        Some(None)
    } else {
        args.due.as_deref().map(Date::parse).transpose()?.map(Some)
    };
    let parent = if args.clear_parent {
        Some(None)
    } else {
        args.parent.as_deref().map(parse_id).transpose()?.map(Some)
    };
    let edit = TaskEdit {
        title: args.title,
        status: args.status,
        priority: args.priority,
        class: args.class,
        assignee: args.assignee,
        tags: None,
        add_tags: args.add_tag,
        remove_tags: args.remove_tag,
        due,
        estimate: args.estimate,
        parent,
        add_deps: parse_id_list(&args.add_dep)?,
        remove_deps: parse_id_list(&args.remove_dep)?,
        body: args.body,
        append_body: args.append_body,
        branch: args.branch,
        worktree: args.worktree,
        block: args.block,
        unblock: args.unblock,
    };
    let outcome = task_ops::edit_task(&ctx.board, id, edit, &claim_opts(&args.claim))?;
    let message = if outcome.changed {
        format!("updated #{id}")
    } else {
        format!("no changes to #{id}")
    };
    report_mutation(ctx, &outcome.task, outcome.changed, message)
}

fn cmd_block(ctx: &Ctx, args: BlockArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let task = task_ops::block_task(&ctx.board, id, &args.reason, &claim_opts(&args.claim))?;
    let message = format!("#{id} blocked: {}", task.block_reason);
    report_mutation(ctx, &task, true, message)
}

fn cmd_unblock(ctx: &Ctx, args: MutateArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let outcome = task_ops::unblock_task(&ctx.board, id, &claim_opts(&args.claim))?;
    let message = if outcome.changed {
        format!("#{id} unblocked")
    } else {
        format!("#{id} was not blocked")
    };
    report_mutation(ctx, &outcome.task, outcome.changed, message)
}

fn cmd_priority(ctx: &Ctx, args: PriorityArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let change = match (args.raise, args.lower, args.priority) {
        (true, _, _) => PriorityChange::Raise,
        (_, true, _) => PriorityChange::Lower,
        (_, _, Some(p)) => PriorityChange::Set(p),
        _ => {
            return Err(KanbanError::InvalidInput(
                "priority needs a value, --raise or --lower".into(),
            ));
        }
    };
    let outcome = task_ops::change_priority(&ctx.board, id, &change, &claim_opts(&args.claim))?;
    let message = format!("#{id} priority {}", outcome.task.priority);
    report_mutation(ctx, &outcome.task, outcome.changed, message)
}

fn cmd_delete(ctx: &Ctx, args: MutateArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let outcome = task_ops::delete_task(&ctx.board, id, &claim_opts(&args.claim))?;
    let changed = outcome.transition.is_moved();
    let message = if changed {
        format!("deleted #{id} (archived)")
    } else {
        format!("#{id} already archived")
    };
    report_mutation(ctx, &outcome.task, changed, message)
}

fn cmd_archive(ctx: &Ctx, args: MutateArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let outcome = task_ops::archive_task(&ctx.board, id, &claim_opts(&args.claim))?;
    let changed = outcome.transition.is_moved();
    let message = if changed {
        format!("archived #{id}")
    } else {
        format!("#{id} already archived")
    };
    report_mutation(ctx, &outcome.task, changed, message)
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn cmd_check(ctx: &mut Ctx) -> Result<()> {
    let report = run_check(&mut ctx.board)?;
    if ctx.format.is_json() {
        return print_json(&report);
    }
    print_lines(&format_check_report(&report));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_hash_prefix() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert_eq!(parse_id("#7").unwrap(), 7);
        assert_eq!(parse_id(" 3 ").unwrap(), 3);
        assert_eq!(parse_id("0").unwrap_err().code(), "INVALID_TASK_ID");
        assert_eq!(parse_id("abc").unwrap_err().code(), "INVALID_TASK_ID");
        assert_eq!(parse_id("-1").unwrap_err().code(), "INVALID_TASK_ID");
    }

    #[test]
    fn id_lists() {
        assert_eq!(parse_ids("1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_ids("4,").unwrap(), vec![4]);
        assert!(parse_ids(",").is_err());
        assert!(parse_ids("1,x").is_err());
    }

    #[test]
    fn since_is_midnight_utc() {
        let since = parse_since("2026-03-01").unwrap();
        assert_eq!(since.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(parse_since("March").unwrap_err().code(), "INVALID_DATE");
    }
}
