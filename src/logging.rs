//! File-based logging.
//!
//! The menu owns stdin/stdout, so diagnostics go to a daily rolling file
//! instead of the terminal.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "sound-finder";
const DEFAULT_FILTER: &str = "sound_finder=debug,warn";

/// Initialize the logging system.
///
/// Logs are written to `<log_dir>/sound-finder.YYYY-MM-DD.log`. The level
/// is taken from `RUST_LOG`, falling back to debug for this crate and warn
/// for everything else.
///
/// The returned guard flushes the background writer when dropped; keep it
/// alive until the program exits.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log folder {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}
