mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    commit::CommitArgs, config::ConfigSubcommand, logs::LogsSubcommand,
    snippet::SnippetSubcommand,
};
use devkit_core::history::DEFAULT_LIMIT;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devkit",
    about = "Terminal assistant: saved snippets, command history, danger checks and AI help",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data directory (default: ~/.devkit)
    #[arg(long, global = true, env = "DEVKIT_HOME")]
    data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save, find and run named commands
    Snippet {
        #[command(subcommand)]
        subcommand: SnippetSubcommand,
    },

    /// Run a command through the shell and record it in history
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show recent command history
    Rewind {
        /// Number of commands to show (0 for all)
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
        /// Only failed commands
        #[arg(long)]
        failures: bool,
        /// Ask the AI what went wrong in the last commands
        #[arg(long)]
        analyze: bool,
    },

    /// Find recent dangerous commands and show how to roll them back
    Panic {
        /// Show counts per danger category over the whole history
        #[arg(long)]
        stats: bool,
        /// How many recent commands to scan
        #[arg(long, default_value_t = cmd::panic::DEFAULT_WINDOW)]
        window: usize,
        /// Ask the AI for rollback steps
        #[arg(long)]
        ai: bool,
    },

    /// Ask the AI for a command
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
        /// Save the suggested command as a snippet with this name
        #[arg(long, value_name = "NAME")]
        save: Option<String>,
    },

    /// Ask the AI to explain a command
    Explain {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Commit staged changes with a conventional message
    Commit {
        /// Generate the message from the staged diff
        #[arg(long)]
        ai: bool,
        /// Commit message
        #[arg(short = 'm', long)]
        message: Option<String>,
        /// Open the message in $EDITOR before committing
        #[arg(short = 'e', long)]
        edit: bool,
        /// Show the message and staged files without committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Log analysis
    Logs {
        #[command(subcommand)]
        subcommand: LogsSubcommand,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Summarize snippets, history, AI setup and the current project
    Status,

    /// Create a .devkit workspace in the current project
    Init {
        /// Reinitialize an existing workspace
        #[arg(long)]
        force: bool,
    },

    /// Delete the whole command history
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = root::resolve_data_dir(cli.data_dir.as_deref()).and_then(|data_dir| {
        let data_dir = data_dir.as_path();
        match cli.command {
            Commands::Snippet { subcommand } => cmd::snippet::run(data_dir, subcommand, cli.json),
            Commands::Run { command } => cmd::run::run(data_dir, &command, cli.json),
            Commands::Rewind {
                limit,
                failures,
                analyze,
            } => cmd::rewind::run(data_dir, limit, failures, analyze, cli.json),
            Commands::Panic { stats, window, ai } => {
                cmd::panic::run(data_dir, stats, window, ai, cli.json)
            }
            Commands::Ask { query, save } => {
                cmd::ai::ask(data_dir, &query, save.as_deref(), cli.json)
            }
            Commands::Explain { command } => cmd::ai::explain(data_dir, &command, cli.json),
            Commands::Commit {
                ai,
                message,
                edit,
                dry_run,
            } => cmd::commit::run(
                data_dir,
                CommitArgs {
                    ai,
                    message,
                    edit,
                    dry_run,
                },
                cli.json,
            ),
            Commands::Logs { subcommand } => {
                cmd::logs::run(data_dir, &root::resolve_project_root(), subcommand, cli.json)
            }
            Commands::Config { subcommand } => cmd::config::run(data_dir, subcommand, cli.json),
            Commands::Status => cmd::status::run(data_dir, &root::resolve_project_root(), cli.json),
            Commands::Init { force } => {
                cmd::init::run(&root::resolve_project_root(), force, cli.json)
            }
            Commands::Clear { yes } => cmd::clear::run(data_dir, yes, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
