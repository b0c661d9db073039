//! Tracing setup for the limelight binaries.
//!
//! The TUI logs to a rolling file under the limelight home so the alternate
//! screen stays clean; headless commands log to stderr. Filtering honors the
//! `LIMELIGHT_LOG` environment variable (default `info`).

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "LIMELIGHT_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to a daily-rolling file under `<home>/logs`.
///
/// The returned guard flushes buffered records on drop; keep it alive for
/// the lifetime of the program.
pub fn init_file() -> Result<WorkerGuard> {
    let dir = crate::config::paths::logs_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, "limelight.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// Initializes logging to stderr for headless commands.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
