//! uiforge - session persistence and generation service for a UI component builder.
//!
//! Main entry point for the uiforge CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// uiforge - session persistence and generation service
#[derive(Parser)]
#[command(name = "uiforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long, global = true, env = "UIFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the uiforge server
    Start(start::StartArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load(cli.config.as_deref())?;
    let logging = loaded.config.logging();

    // Console (human-readable) + rolling JSON file
    let console_filter = if cli.verbose {
        "uiforge=debug,uiforge_session=debug,uiforge_store=debug,uiforge_llm=debug,uiforge_server=debug,tower_http=debug,info".to_string()
    } else {
        logging.level.clone()
    };

    use tracing_subscriber::prelude::*;
    let console = tracing_subscriber::fmt::layer().with_target(true).with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&console_filter)),
    );

    // The guard must live until exit so buffered lines are flushed.
    let _guard = match logging.file.then(|| log_dir(&logging)) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, "uiforge.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_filter(tracing_subscriber::EnvFilter::new(
                            "uiforge=trace,uiforge_session=trace,uiforge_store=trace,uiforge_llm=trace,uiforge_server=trace,info",
                        )),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            None
        }
    };

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

fn log_dir(logging: &uiforge_config::LoggingConfig) -> PathBuf {
    logging
        .dir
        .clone()
        .or_else(uiforge_config::default_log_dir)
        .unwrap_or_else(|| PathBuf::from("logs"))
}
