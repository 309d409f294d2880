//! File-based logging under the application-data directory.
//!
//! The library logs through `tracing` macros; this module wires them to a
//! rolling file appender so the interactive terminal stays clean for
//! entity output. Rotation is daily with a bounded number of retained
//! files. `read_log_file` is the read-back side of the contract: the full
//! current log text, or a human-readable error string when the log is
//! unavailable.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "pbi-beacon.log";
const MAX_LOG_FILES: usize = 5;

/// The log directory: `{data_dir}/pbi-beacon/log`, falling back to the
/// system temp directory when no data directory is known.
pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pbi-beacon")
        .join("log")
}

/// Installs the global tracing subscriber writing to the rolling log file.
///
/// Returns a guard that must be held for the lifetime of the application
/// to ensure buffered log lines are flushed. `RUST_LOG` overrides the
/// verbosity-derived filter when set.
pub fn init(verbose: u8) -> std::io::Result<WorkerGuard> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pbi_beacon={level}")));

    let dir = log_dir();
    fs::create_dir_all(&dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(&dir)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

/// Returns the full text of the most recent log file, or a human-readable
/// error string when no log is available. Never fails — diagnosing a
/// broken log setup is exactly when callers reach for this.
pub fn read_log_file() -> String {
    let dir = log_dir();
    let mut logs: Vec<PathBuf> = match fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
            })
            .collect(),
        Err(e) => return format!("Error reading log directory {}: {e}", dir.display()),
    };

    // Rotated files carry a date suffix, so the lexicographic maximum is
    // the current file.
    logs.sort();
    let Some(current) = logs.pop() else {
        return format!("Log file not found under: {}", dir.display());
    };

    match fs::read_to_string(&current) {
        Ok(text) => text,
        Err(e) => format!("Error reading log file {}: {e}", current.display()),
    }
}
