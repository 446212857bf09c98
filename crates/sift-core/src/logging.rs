//! Logging setup.
//!
//! The TUI owns the terminal, so logs go to a file under the sift home
//! directory. The returned guard must be kept alive for the process lifetime
//! or buffered lines are dropped.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, paths};

/// Initializes the global tracing subscriber with a non-blocking file writer.
///
/// Filter resolution order: `SIFT_LOG` env var, then `log_filter` from
/// config, then `info`.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let logs_dir = paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "sift.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(config.log_filter.as_deref().unwrap_or("info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::debug!(logs_dir = %logs_dir.display(), "logging initialized");
    Ok(guard)
}
