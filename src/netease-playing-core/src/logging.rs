//! Tracing setup for the reference host.
//!
//! Two sinks can be active: the console and a daily-rolling file in the
//! per-user log directory. Either can be switched off from `[logging]`; with
//! both off, warnings and errors still reach stderr.

use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "netease-playing.log";

/// Flushes the file sink when dropped; hold it until exit.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber. `level_override` wins over the configured
/// level (used for `--verbose`).
pub fn init_logging(
    config: &LoggingConfig,
    dirs: &AppDirs,
    level_override: Option<&str>,
) -> Result<LoggingGuard, LoggingError> {
    let directive = level_override.unwrap_or(config.level.as_filter_directive());
    let env_filter = EnvFilter::try_new(directive).map_err(|source| LoggingError::ParseLevel {
        level: directive.to_string(),
        source,
    })?;

    let file = match file_stem(config) {
        Some(stem) => Some(open_log_file(dirs.log_dir(), stem, config.max_log_files)?),
        None => None,
    };
    let (writer, file_guard) = match (config.stdout, file) {
        (true, Some((file, guard))) => (BoxMakeWriter::new(io::stdout.and(file)), Some(guard)),
        (false, Some((file, guard))) => (BoxMakeWriter::new(file), Some(guard)),
        (true, None) => (BoxMakeWriter::new(io::stdout), None),
        (false, None) => (
            BoxMakeWriter::new(io::stderr.with_max_level(tracing::Level::WARN)),
            None,
        ),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(config.stdout)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Name stem of the rolling log file, or `None` when file logging is off
/// (`max_log_files = 0` or a blank `file_name`).
fn file_stem(config: &LoggingConfig) -> Option<&str> {
    if config.max_log_files == 0 {
        return None;
    }
    match config.file_name.as_deref() {
        Some(name) if name.trim().is_empty() => None,
        Some(name) => Some(name),
        None => Some(DEFAULT_LOG_FILE),
    }
}

fn open_log_file(
    log_dir: &Path,
    stem: &str,
    keep: usize,
) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.to_path_buf(),
        source,
    })?;
    prune_logs(log_dir, stem, keep)?;
    Ok(tracing_appender::non_blocking(
        tracing_appender::rolling::daily(log_dir, stem),
    ))
}

/// Deletes all but the `keep` most recently modified files named `stem*`.
fn prune_logs(dir: &Path, stem: &str, keep: usize) -> Result<(), LoggingError> {
    let listing = fs::read_dir(dir).map_err(|source| LoggingError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut logs: Vec<(SystemTime, PathBuf)> = listing
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(stem))
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|meta| meta.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    logs.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, path) in logs.into_iter().skip(keep) {
        fs::remove_file(&path).map_err(|source| LoggingError::Prune { path, source })?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid log level {level:?}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to list log directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to prune old log file {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
}
