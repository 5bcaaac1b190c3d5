//! Retention CLI - retention command

use anyhow::Result;
use clap::{Parser, Subcommand};
use retention_core::TimeUnit;
use std::num::NonZeroU32;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Retention - tag-based file retention rules
#[derive(Parser)]
#[command(name = "retention")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: <config dir>/retention/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the expiry and warning cutoffs for a retention window
    Cutoffs {
        /// Time unit (day, week, month, year)
        #[arg(short, long)]
        unit: TimeUnit,
        /// Number of units
        #[arg(short, long)]
        amount: NonZeroU32,
        /// Reference time as RFC 3339 (default: now)
        #[arg(long)]
        now: Option<String>,
    },
    /// Validate a file of retention rule rows
    Check {
        /// TOML file with [[rule]] entries
        rules: PathBuf,
    },
    /// View retention settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all settings
    List,
    /// Show the settings file path
    Path {
        /// Create the file with defaults if it doesn't exist
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example settings file
    Example,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cutoffs { unit, amount, now } => cmd::cutoffs::run(unit, amount, now.as_deref()),
        Commands::Check { rules } => cmd::check::run(&rules),
        Commands::Config(config_cmd) => {
            let path = cmd::config::resolve_path(cli.config)?;
            match config_cmd {
                ConfigCommands::List => cmd::config::run_list(&path),
                ConfigCommands::Path { create } => cmd::config::run_path(&path, create),
                ConfigCommands::Example => cmd::config::run_example(),
            }
        }
    }
}
