//! Cutline CLI - session client for the Cutline workshop backend

mod commands;
mod config;
mod logging;
mod prompt;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use cutline_core::config::default_data_dir;
use std::path::PathBuf;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "cutline")]
#[command(about = "Command-line client for the Cutline backend")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Configuration file (defaults to DATA_DIR/config.toml when present)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for tokens and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;
    debug!(data_dir = %data_dir.display(), "Starting Cutline CLI");

    if let Err(e) = cli.command.execute(cli.config, data_dir).await {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
