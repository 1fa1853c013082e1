//! Binary entry point for buzzword.
//!
//! This binary runs the ranking bot, or ranks a batch of posts from stdin.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use buzzword::config::BuzzwordConfig;
use buzzword::observability::{self, ObservabilityConfig};
use buzzword::{Error, cli};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Buzzword - trending-phrase ranking bot for Nostr.
#[derive(Parser)]
#[command(name = "buzzword")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ignore list of npub author identities [default: ignores.txt].
    #[arg(long, env = "IGNORES", global = true)]
    ignores: Option<PathBuf>,

    /// Custom dictionary (surface,segmentation,reading,category) [default: userdic.txt].
    #[arg(long, env = "USERDIC", global = true)]
    userdic: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the bot until interrupted (default).
    Serve,
    /// Rank line-delimited JSON events read from stdin.
    Test,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = observability::init(&ObservabilityConfig::from_env(cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command.unwrap_or(Commands::Serve), &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: &BuzzwordConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve => cli::serve(config).await.context("serve failed"),
        Commands::Test => {
            let pipeline = cli::build_pipeline(config).context("cannot build ingest pipeline")?;
            let stdin = io::stdin().lock();
            let mut stdout = BufWriter::new(io::stdout().lock());
            match cli::replay(&pipeline, &config.ranking, stdin, &mut stdout) {
                Ok(summary) => {
                    stdout.flush().context("cannot flush output")?;
                    tracing::info!(
                        read = summary.read,
                        stored = summary.stored,
                        malformed = summary.malformed,
                        "Replay finished"
                    );
                    Ok(())
                },
                Err(e @ Error::InsufficientData { .. }) => {
                    Err(anyhow::Error::new(e).context("not enough posts to rank"))
                },
                Err(e) => Err(e.into()),
            }
        },
    }
}

/// Layers defaults, the config file, the environment, and CLI flags.
fn load_config(cli: &Cli) -> anyhow::Result<BuzzwordConfig> {
    let config = match &cli.config {
        Some(path) => BuzzwordConfig::load_from_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => BuzzwordConfig::load_default(),
    };

    let mut config = config.with_env();
    if let Some(path) = &cli.ignores {
        config = config.with_ignores_path(path.clone());
    }
    if let Some(path) = &cli.userdic {
        config = config.with_userdic_path(path.clone());
    }
    Ok(config)
}
