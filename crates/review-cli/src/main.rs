mod clients;
mod cmd;
mod escalate;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, queue::QueueSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "review-bot",
    about = "Design review cron jobs: senior reviewer rotation and in-person review scheduling",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root holding .review/ (default: auto-detect from cwd)
    #[arg(long, global = true, env = "REVIEW_BOT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .review/config.yaml
    Init,

    /// Assign a senior reviewer to every ticket waiting for one
    Assign,

    /// Match tickets waiting for an in-person review to open meeting slots
    Schedule,

    /// Inspect or reset the persisted reviewer rotation
    Queue {
        #[command(subcommand)]
        subcommand: QueueSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Assign | Commands::Schedule => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Assign => cmd::assign::run(&root, cli.json),
        Commands::Schedule => cmd::schedule::run(&root, cli.json),
        Commands::Queue { subcommand } => cmd::queue::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
