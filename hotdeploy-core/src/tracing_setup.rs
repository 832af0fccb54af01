//! Tracing setup for Hotdeploy
//!
//! Console output at the level the developer picks, plus a full trace of the
//! last run on disk for digging into which files were copied and why.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Hotdeploy crates whose log level follows `--log-level`.
const HOTDEPLOY_TARGETS: [&str; 3] = ["hotdeploy", "hotdeploy_core", "hotdeploy_web"];

/// Everything in the trace file, minus hyper's per-frame chatter.
const FILE_DIRECTIVES: &str = "trace,hyper=debug,hyper_util=debug";

/// Console filter for `level`.
///
/// Hotdeploy's own targets log at `level`. Per-request `tower_http` spans
/// only show up from `debug` on. Everything else is capped at `warn`.
fn console_directives(level: Level) -> String {
    let quiet = level.min(Level::WARN);
    let http = if level >= Level::DEBUG { level } else { quiet };

    let mut directives = vec![quiet.to_string(), format!("tower_http={http}")];
    directives.extend(HOTDEPLOY_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",").to_lowercase()
}

/// Initialize tracing with console output and a trace-level log file
///
/// # Arguments
/// * `console_level` - Log level for console output; `RUST_LOG` overrides it
/// * `logs_dir` - Directory for `hotdeploy-last-run.log` (defaults to "./logs")
///
/// # Errors
///
/// - `std::io::Error` - If the logs directory or log file cannot be created
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> Result<(), std::io::Error> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;

    let log_file_path = logs_path.join("hotdeploy-last-run.log");
    let log_file = File::create(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directives(console_level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new(FILE_DIRECTIVES));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Tracing initialized: console={}, debug_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(())
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Adds every copy and skip decision
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use hotdeploy_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_levels_map_to_tracing() {
        assert_eq!(CliLogLevel::Error.as_tracing_level(), Level::ERROR);
        assert_eq!(CliLogLevel::Debug.as_tracing_level(), Level::DEBUG);
        assert_eq!(CliLogLevel::Trace.to_string(), "trace");
    }

    #[test]
    fn test_console_quiets_request_spans_at_info() {
        assert_eq!(
            console_directives(Level::INFO),
            "warn,tower_http=warn,hotdeploy=info,hotdeploy_core=info,hotdeploy_web=info"
        );
    }

    #[test]
    fn test_console_shows_request_spans_at_debug() {
        assert_eq!(
            console_directives(Level::DEBUG),
            "warn,tower_http=debug,hotdeploy=debug,hotdeploy_core=debug,hotdeploy_web=debug"
        );
    }

    #[test]
    fn test_console_error_level_stays_error_everywhere() {
        let directives = console_directives(Level::ERROR);

        assert!(directives.starts_with("error,tower_http=error,"));
        assert!(directives.parse::<EnvFilter>().is_ok());
    }
}
