#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::resolve_output_mode;
use questlog_core::Config;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "questlog: shared quest ledger for agent hierarchies",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Session id of the calling agent (falls back to QUESTLOG_SESSION,
    /// then "default"). Descendant sessions share their root's ledger.
    #[arg(long, global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Resolve the caller's session identity.
    fn session_id(&self) -> String {
        self.session
            .clone()
            .or_else(|| env::var("QUESTLOG_SESSION").ok())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a new quest",
        long_about = "Create a new quest in the shared ledger. The description must carry the complete task brief: assignee agents see only the quest, never the conversation that created it.",
        after_help = "EXAMPLES:\n    # Create a quest\n    ql create --subject \"Implement login\" --description \"## Goal\\n...\"\n\n    # With a display label for in-progress listings\n    ql create --subject \"Implement login\" --description \"...\" --active-form \"Implementing login\"\n\n    # Emit machine-readable output\n    ql create --subject \"Implement login\" --description \"...\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Update a quest",
        long_about = "Update status, subject, description, activeForm, or the blocker set of an existing quest. Advancing a quest with unresolved blockers is rejected.",
        after_help = "EXAMPLES:\n    # Start work\n    ql update quest-001 --status in_progress\n\n    # Wire dependencies after creating all quests\n    ql update quest-004 --blocked-by quest-001 --blocked-by quest-002\n\n    # Complete and see what got unblocked\n    ql update quest-001 --status completed"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Read",
        about = "List quests",
        long_about = "List the shared ledger, optionally only quests eligible to start, optionally in an ultra-compact form for large ledgers.",
        after_help = "EXAMPLES:\n    # Everything, with summary\n    ql list\n\n    # Only quests ready to start\n    ql list --available\n\n    # Compact codes, 15 per line\n    ql list --compact"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one quest's full detail",
        long_about = "Show full details for a single quest by id, including its complete task brief.",
        after_help = "EXAMPLES:\n    # Show a quest\n    ql get quest-001\n\n    # Emit machine-readable output\n    ql get quest-001 --json"
    )]
    Get(cmd::get::GetArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    ql completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUESTLOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "questlog=debug,info"
        } else {
            "questlog=info,warn"
        })
    });

    let format = env::var("QUESTLOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cfg = Config::resolve();
    let output = resolve_output_mode(cli.json);
    let session = cli.session_id();

    match cli.command {
        Commands::Create(ref args) => cmd::create::run_create(args, &session, output, &cfg),
        Commands::Update(ref args) => cmd::update::run_update(args, &session, output, &cfg),
        Commands::List(ref args) => cmd::list::run_list(args, &session, output, &cfg),
        Commands::Get(ref args) => cmd::get::run_get(args, &session, output, &cfg),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}
