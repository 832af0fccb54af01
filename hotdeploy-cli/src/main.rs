//! Hotdeploy CLI - Command-line interface
//!
//! Runs the development server or syncs individual resources by hand.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use hotdeploy_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "hotdeploy")]
#[command(about = "Keeps a deployed web application in step with its sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Console log level
    #[arg(long, global = true, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    /// Directory for the full-trace log file
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    commands::handle_command(cli.command).await.map_err(|err| {
        let message = err.user_message();
        anyhow::Error::new(err).context(message)
    })?;

    Ok(())
}
