//! Diagnostic logging for the `batch-readline` binary.
//!
//! Logs go to stderr, or to an append-mode file, so they never mix with the lines written to
//! stdout.

use crate::config::DEFAULT_LOG_LEVEL;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing::level_filters;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();
static GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

/// Returns `false` when nothing would be logged: the level is `off` and `RUST_LOG` is unset.
fn logging_enabled(level: &str, env_directives: Option<&OsStr>) -> bool {
    level != "off" || env_directives.is_some_and(|directives| !directives.is_empty())
}

fn init_logger_once(log_level: Option<&str>, log_file: Option<&Path>) {
    let level = log_level.unwrap_or(DEFAULT_LOG_LEVEL);
    let env_directives = std::env::var_os(EnvFilter::DEFAULT_ENV);
    if !logging_enabled(level, env_directives.as_deref()) {
        return;
    }

    let (non_blocking, guard) = if let Some(path) = log_file {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => tracing_appender::non_blocking(file),
            Err(e) => {
                eprintln!(
                    "WARN: Failed to open log file '{}', falling back to stderr. Error: {e}",
                    path.display()
                );
                tracing_appender::non_blocking(std::io::stderr())
            }
        }
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .unwrap_or(level_filters::LevelFilter::OFF.into()),
        )
        .from_env_lossy();

    let layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();

    if let Ok(mut guard_lock) = GUARD.lock() {
        *guard_lock = Some(guard);
    }
}

/// Installs the global subscriber, once.
///
/// `log_level` is a filter directive such as `debug`. `RUST_LOG` overrides it, and with `off`
/// nothing is installed unless `RUST_LOG` is set.
pub fn init_logger(log_level: Option<&str>, log_file: Option<&Path>) {
    INIT.call_once(|| init_logger_once(log_level, log_file));
}

/// Flushes pending log lines and stops the background writer.
pub fn flush_logger() {
    if let Ok(mut guard_lock) = GUARD.lock() {
        *guard_lock = None;
    }
}
