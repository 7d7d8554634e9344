use clap::Parser;
use kanban::cli::commands::Cli;
use kanban::cli::handlers;
use kanban::error::{KanbanError, exit_codes};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Diagnostics are opt-in via KANBAN_LOG and always go to stderr.
/// Empty, invalid or oversized filters fall back to `off`.
fn init_tracing() {
    let filter = std::env::var("KANBAN_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn report(err: &KanbanError, json: bool) {
    if json {
        match serde_json::to_string_pretty(&err.envelope()) {
            Ok(text) => println!("{text}"),
            Err(_) => eprintln!("error: {err}"),
        }
    } else {
        eprintln!("error: {err}");
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    let result = match cli.command {
        // No subcommand → launch TUI
        None => kanban::tui::run(cli.dir.as_deref(), cli.claim_timeout.as_deref()).map(|()| exit_codes::SUCCESS),
        Some(_) => handlers::dispatch(cli),
    };

    match result {
        Ok(exit_codes::SUCCESS) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            report(&err, json);
            std::process::exit(err.exit_code());
        }
    }
}
