//! Logging initialization: a single global subscriber writing to a daily-rotating
//! file, never to the console, so the run loop's stdout stays free for operator
//! prompts.
//!
//! Reads `RUST_LOG` for the level filter (default `info`). The file is placed
//! under the directory passed to [`init`], rotated daily by `tracing-appender`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the subscriber and returns the writer guard. The guard must be kept
/// alive for the process lifetime — dropping it early can lose buffered log lines.
pub fn init(log_dir: &Path) -> Result<WorkerGuard, std::io::Error> {
    std::fs::create_dir_all(log_dir)?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(log_dir, "supervisor.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false).with_filter(filter);

    tracing_subscriber::registry().with(file_layer).init();
    tracing::info!(dir = %log_dir.display(), "supervisor logging initialized");
    Ok(guard)
}
