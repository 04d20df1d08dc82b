//! Logging configuration using the tracing ecosystem.
//!
//! This module configures structured logging with:
//! - Human-readable output on stderr, so stdout carries only the summary
//! - A daily rotating log file
//! - Log levels from `-v` flags or the `RUST_LOG` environment variable

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if neither `-v` nor RUST_LOG is given.
const DEFAULT_LOG_FILTER: &str = "jira_export=info,warn";

/// Initialize the logging system.
///
/// `verbosity` is the number of `-v` flags: one enables debug output for
/// this crate, two enable trace output. Without `-v` the `RUST_LOG`
/// environment variable is honoured, e.g. `RUST_LOG=jira_export=debug,reqwest=debug`.
///
/// With `log_to_file`, everything is also written to a daily rotating file
/// in the platform-specific local data directory:
/// - Linux: `~/.local/share/jira-export/logs/`
/// - macOS: `~/Library/Application Support/jira-export/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\jira-export\logs\`
///
/// # Errors
///
/// Returns an error if:
/// - The log directory cannot be determined or created
/// - The tracing subscriber cannot be set
pub fn init(verbosity: u8, log_to_file: bool) -> anyhow::Result<()> {
    let file_layer = if log_to_file {
        let log_dir = get_log_directory()?;
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "jira-export.log");

        Some(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        None
    };

    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0);

    let subscriber = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter_for(verbosity));

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "jira-export starting up");
    if log_to_file {
        tracing::debug!(log_dir = ?log_directory(), "Log directory");
    }

    Ok(())
}

/// Pick the level filter: `-v` flags win over `RUST_LOG`, which wins over the default.
fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        1 => EnvFilter::new("jira_export=debug,info"),
        _ => EnvFilter::new("jira_export=trace,debug"),
    }
}

/// Get the log directory path.
///
/// Returns the platform-specific local data directory with `jira-export/logs` appended.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jira-export").join("logs"))
}

/// Get the path where logs are stored.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}
