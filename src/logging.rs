//! File-only logging.
//!
//! Stdout carries the editor protocol and stderr is usually swallowed by the
//! editor, so everything goes to a log file instead.

use crate::config::Config;
use std::fs;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Keep the returned guard alive for the
/// life of the process or buffered lines are lost on exit.
pub fn init_logging(config: &Config) -> io::Result<Option<WorkerGuard>> {
    if config.no_log {
        return Ok(None);
    }

    let path = config.log_path();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    fs::create_dir_all(&dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "macrobug.log".into());

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    tracing::info!(
        log_file = %path.display(),
        version = env!("CARGO_PKG_VERSION"),
        "=== macrobug started ==="
    );
    Ok(Some(guard))
}
