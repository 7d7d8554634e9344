use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kanban", about = concat!("kanban v", env!("CARGO_PKG_VERSION"), " - a board made of markdown files"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Board directory (default: search upward from the working directory)
    #[arg(long, global = true, env = "KANBAN_DIR")]
    pub dir: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, conflicts_with_all = ["table", "compact"])]
    pub json: bool,

    /// Output as an aligned table
    #[arg(long, global = true, conflicts_with = "compact")]
    pub table: bool,

    /// Output one line per task
    #[arg(long, global = true)]
    pub compact: bool,

    /// Treat claims older than this as expired (e.g. 30m, 1h, 1d)
    #[arg(long, global = true, value_name = "DURATION")]
    pub claim_timeout: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new board
    Init(InitArgs),
    /// Create a task
    Add(AddArgs),
    /// List tasks
    List(ListArgs),
    /// Show one task in full
    Show(IdArg),
    /// Move tasks to another status
    Move(MoveArgs),
    /// Pick the next task to work on
    Pick(PickArgs),
    /// Claim a task for an agent
    Claim(ClaimArgs),
    /// Release a claim
    Release(IdArg),
    /// Edit task fields
    Edit(EditArgs),
    /// Mark a task blocked
    Block(BlockArgs),
    /// Clear a task's blocked flag
    Unblock(MutateArgs),
    /// Set, raise or lower a task's priority
    Priority(PriorityArgs),
    /// Soft-delete a task (moves it to archived)
    Delete(MutateArgs),
    /// Archive a task
    Archive(MutateArgs),
    /// Board summary with WIP warnings
    Board,
    /// Show the activity log
    Log(LogArgs),
    /// Flow metrics: throughput, lead and cycle time, aging work
    Metrics(MetricsArgs),
    /// Snapshot of active, blocked, ready and overdue work
    Context(ContextArgs),
    /// Repair id/filename mismatches and next_id
    Check,
}

// ---------------------------------------------------------------------------
// Shared args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: String,
}

/// Claim flags accepted by every mutation
#[derive(Args, Default)]
pub struct ClaimFlags {
    /// Claim the task for AGENT in the same operation
    #[arg(long, value_name = "AGENT")]
    pub claim: Option<String>,
    /// Release any claim first
    #[arg(long)]
    pub release: bool,
}

#[derive(Args)]
pub struct MutateArgs {
    /// Task ID
    pub id: String,
    #[command(flatten)]
    pub claim: ClaimFlags,
}

// ---------------------------------------------------------------------------
// Init / add
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: the directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Comma-separated statuses, first to last
    #[arg(long, value_delimiter = ',')]
    pub statuses: Vec<String>,
    /// WIP limit as STATUS=N (repeatable)
    #[arg(long = "wip-limit", value_name = "STATUS=N")]
    pub wip_limits: Vec<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Class of service
    #[arg(long)]
    pub class: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    /// Comma-separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub estimate: Option<String>,
    /// Parent task ID
    #[arg(long)]
    pub parent: Option<String>,
    /// Comma-separated task IDs this task depends on
    #[arg(long = "depends-on", value_delimiter = ',')]
    pub depends_on: Vec<String>,
    /// Markdown body
    #[arg(long)]
    pub body: Option<String>,
    /// Claim the new task for AGENT
    #[arg(long, value_name = "AGENT")]
    pub claim: Option<String>,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Comma-separated statuses
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<String>,
    /// Comma-separated priorities
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub tag: Option<String>,
    /// Case-insensitive search over title, body and tags
    #[arg(long)]
    pub search: Option<String>,
    /// Only blocked tasks
    #[arg(long, conflicts_with = "not_blocked")]
    pub blocked: bool,
    /// Only tasks that are not blocked
    #[arg(long)]
    pub not_blocked: bool,
    /// Only children of this task
    #[arg(long)]
    pub parent: Option<String>,
    /// Only tasks without an active claim
    #[arg(long)]
    pub unclaimed: bool,
    #[arg(long, value_name = "AGENT")]
    pub claimed_by: Option<String>,
    #[arg(long)]
    pub class: Option<String>,
    /// Only tasks whose dependencies are all done
    #[arg(long)]
    pub unblocked: bool,
    /// Include archived tasks
    #[arg(long)]
    pub archived: bool,
    /// Sort by id, status, priority, due, created or updated
    #[arg(long, default_value = "id")]
    pub sort: String,
    #[arg(long)]
    pub reverse: bool,
    /// Show at most N tasks
    #[arg(long)]
    pub limit: Option<usize>,
    /// Group by assignee, tag, class, priority or status
    #[arg(long = "group-by")]
    pub group_by: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    /// Only entries at or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
    /// Only entries for this task
    #[arg(long)]
    pub task: Option<String>,
    /// Show the newest N entries
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct MetricsArgs {
    /// Only tasks completed at or after this date feed lead/cycle times
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Args)]
pub struct ContextArgs {
    /// Comma-separated sections: in-progress, blocked, ready, overdue, recently-completed
    #[arg(long, value_delimiter = ',')]
    pub sections: Vec<String>,
    /// Window for recently completed tasks
    #[arg(long, default_value_t = 7)]
    pub days: i64,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MoveArgs {
    /// Task ID, or comma-separated IDs
    pub ids: String,
    /// Target status
    #[arg(required_unless_present_any = ["next", "prev"])]
    pub status: Option<String>,
    /// Move to the next status
    #[arg(long, conflicts_with_all = ["status", "prev"])]
    pub next: bool,
    /// Move to the previous status
    #[arg(long, conflicts_with = "status")]
    pub prev: bool,
    #[command(flatten)]
    pub claim: ClaimFlags,
}

#[derive(Args)]
pub struct PickArgs {
    /// Claim the picked task for AGENT
    #[arg(long, value_name = "AGENT")]
    pub claim: Option<String>,
    /// Comma-separated statuses to pick from (default: active statuses)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<String>,
    /// Comma-separated tags; the task must carry one of them
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Move the picked task to STATUS
    #[arg(long = "move", value_name = "STATUS")]
    pub move_to: Option<String>,
}

#[derive(Args)]
pub struct ClaimArgs {
    /// Task ID
    pub id: String,
    /// Agent name
    pub agent: String,
}

#[derive(Args)]
pub struct BlockArgs {
    /// Task ID
    pub id: String,
    /// Why the task is blocked
    pub reason: String,
    #[command(flatten)]
    pub claim: ClaimFlags,
}

#[derive(Args)]
pub struct PriorityArgs {
    /// Task ID
    pub id: String,
    /// New priority
    #[arg(required_unless_present_any = ["raise", "lower"])]
    pub priority: Option<String>,
    /// One step higher
    #[arg(long, conflicts_with_all = ["priority", "lower"])]
    pub raise: bool,
    /// One step lower
    #[arg(long, conflicts_with = "priority")]
    pub lower: bool,
    #[command(flatten)]
    pub claim: ClaimFlags,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub class: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    /// Add a tag (repeatable)
    #[arg(long = "add-tag")]
    pub add_tag: Vec<String>,
    /// Remove a tag (repeatable)
    #[arg(long = "remove-tag")]
    pub remove_tag: Vec<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long)]
    pub estimate: Option<String>,
    #[arg(long, conflicts_with = "clear_parent")]
    pub parent: Option<String>,
    #[arg(long)]
    pub clear_parent: bool,
    /// Add a dependency (repeatable)
    #[arg(long = "add-dep")]
    pub add_dep: Vec<String>,
    /// Remove a dependency (repeatable)
    #[arg(long = "remove-dep")]
    pub remove_dep: Vec<String>,
    /// Replace the body
    #[arg(long, conflicts_with = "append_body")]
    pub body: Option<String>,
    /// Append a paragraph to the body
    #[arg(long)]
    pub append_body: Option<String>,
    #[arg(long)]
    pub branch: Option<String>,
    #[arg(long)]
    pub worktree: Option<String>,
    /// Mark blocked with REASON
    #[arg(long, value_name = "REASON", conflicts_with = "unblock")]
    pub block: Option<String>,
    #[arg(long)]
    pub unblock: bool,
    #[command(flatten)]
    pub claim: ClaimFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kanban").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_subcommand_means_tui() {
        assert!(parse(&[]).command.is_none());
    }

    #[test]
    fn move_accepts_status_or_direction() {
        match parse(&["move", "1,2", "done", "--claim", "a"]).command {
            Some(Commands::Move(m)) => {
                assert_eq!(m.ids, "1,2");
                assert_eq!(m.status.as_deref(), Some("done"));
                assert_eq!(m.claim.claim.as_deref(), Some("a"));
            }
            _ => panic!("expected move"),
        }
        match parse(&["move", "3", "--next"]).command {
            Some(Commands::Move(m)) => assert!(m.next && m.status.is_none()),
            _ => panic!("expected move"),
        }
        assert!(Cli::try_parse_from(["kanban", "move", "3"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["list", "--status", "todo,review", "--json"]);
        assert!(cli.json);
        match cli.command {
            Some(Commands::List(l)) => assert_eq!(l.status, vec!["todo", "review"]),
            _ => panic!("expected list"),
        }
        assert!(Cli::try_parse_from(["kanban", "list", "--json", "--table"]).is_err());
    }
}
