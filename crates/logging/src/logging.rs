use crate::{AppError, ResultExt};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_KEEP_DAYS: u64 = 7;
pub const LOG_LEVEL_ENV: &str = "VETPMS_LOG_LEVEL";

const LOG_FILE_PREFIX: &str = "vetpms-desktop";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub data_dir: PathBuf,
    pub level: Option<String>,
    pub keep_days: u64,
}

impl LoggingOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            level: None,
            keep_days: DEFAULT_KEEP_DAYS,
        }
    }

    pub fn with_level(mut self, level: Option<String>) -> Self {
        self.level = level;
        self
    }
}

/// Keeps the non-blocking file writer alive; drop it last to flush.
#[derive(Debug)]
pub struct LoggingGuard {
    log_dir: PathBuf,
    level: String,
    _worker: Option<WorkerGuard>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

pub fn normalize_level(value: &str) -> Option<&'static str> {
    let lowered = value.trim().to_ascii_lowercase();
    LOG_LEVELS.into_iter().find(|level| *level == lowered)
}

/// Explicit level, then `VETPMS_LOG_LEVEL`, then a build profile default.
pub fn resolve_log_level(explicit: Option<&str>) -> String {
    let env_level = std::env::var(LOG_LEVEL_ENV).ok();
    resolve_log_level_with(explicit, env_level.as_deref())
}

fn resolve_log_level_with(explicit: Option<&str>, env_level: Option<&str>) -> String {
    if let Some(level) = explicit.and_then(normalize_level) {
        return level.to_string();
    }
    if let Some(level) = env_level.and_then(normalize_level) {
        return level.to_string();
    }

    if cfg!(debug_assertions) {
        "debug".to_string()
    } else {
        "info".to_string()
    }
}

pub fn init_logging(options: &LoggingOptions) -> Result<LoggingGuard, AppError> {
    let log_dir = options.data_dir.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))
        .with_code("log_dir_create_failed", "failed to create log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;

    let level = resolve_log_level(options.level.as_deref());
    if tracing::dispatcher::has_been_set() {
        remove_expired_logs(&log_dir, options.keep_days);
        return Ok(LoggingGuard {
            log_dir,
            level,
            _worker: None,
        });
    }

    let file_appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| format!("failed to create log appender: {}", log_dir.display()))
        .with_code("log_appender_create_failed", "failed to create log appender")
        .with_ctx("logDir", log_dir.display().to_string())?;
    let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::new(level.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_current_span(true)
        .with_span_list(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);
    #[cfg(debug_assertions)]
    let subscriber = subscriber.with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .with_target(true),
    );

    subscriber
        .try_init()
        .with_context(|| format!("failed to install log subscriber: level={level}"))
        .with_code("log_subscriber_init_failed", "failed to install log subscriber")
        .with_ctx("logLevel", level.clone())?;

    let removed = remove_expired_logs(&log_dir, options.keep_days);
    tracing::info!(
        event = "logging_initialized",
        level = %level,
        log_dir = %log_dir.display(),
        expired_removed = removed
    );

    Ok(LoggingGuard {
        log_dir,
        level,
        _worker: Some(worker_guard),
    })
}

fn remove_expired_logs(log_dir: &Path, keep_days: u64) -> usize {
    cleanup_expired_logs(log_dir, keep_days).unwrap_or_else(|error| {
        tracing::warn!(
            event = "log_cleanup_failed",
            code = %error.code,
            message = %error.message
        );
        0
    })
}

/// Removes host log files older than `keep_days`; returns how many were
/// deleted. Files that do not carry the host log prefix are left alone, and a
/// file that cannot be removed is logged and skipped.
pub fn cleanup_expired_logs(log_dir: &Path, keep_days: u64) -> Result<usize, AppError> {
    let keep_duration = Duration::from_secs(keep_days.saturating_mul(24 * 60 * 60));
    cleanup_expired_logs_with(log_dir, keep_duration, SystemTime::now(), |path| {
        fs::remove_file(path)
    })
}

fn is_host_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log"))
}

fn cleanup_expired_logs_with<F>(
    log_dir: &Path,
    keep_duration: Duration,
    now: SystemTime,
    remove: F,
) -> Result<usize, AppError>
where
    F: Fn(&Path) -> std::io::Result<()>,
{
    if !log_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("failed to read log directory: {}", log_dir.display()))
        .with_code("log_cleanup_read_dir_failed", "failed to read log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;

    let mut removed = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_host_log_file(&path) {
            continue;
        }

        let Some(modified_at) = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .ok()
        else {
            continue;
        };
        let elapsed = now.duration_since(modified_at).unwrap_or_default();
        if elapsed <= keep_duration {
            continue;
        }

        if let Err(error) = remove(&path) {
            tracing::warn!(
                event = "log_cleanup_remove_failed",
                log_path = %path.display(),
                error = %error
            );
            continue;
        }
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
#[path = "../tests/logging_tests.rs"]
mod tests;
