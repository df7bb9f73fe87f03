//! src/logging.rs
//! ============================================================================
//! # Structured logging bootstrap
//!
//! `LoggerBuilder` installs the global `tracing` subscriber: an `EnvFilter`
//! seeded from config, a JSON layer writing to a rolling file through a
//! non-blocking appender, and an optional human-readable stderr layer.
//! Library code only ever uses the `tracing` macros.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use compact_str::CompactString;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer, filter::Directive, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::ListResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: CompactString,
    pub log_level: CompactString,
    pub max_log_files: usize,
    pub rotation: LogRotation,
    /// Mirror events to stderr in the compact text format.
    pub stderr: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Daily,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: CompactString::const_new("farmdesk"),
            log_level: CompactString::const_new("info"),
            max_log_files: 10,
            rotation: LogRotation::Daily,
            stderr: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

static INSTALLED: OnceCell<LoggerConfig> = OnceCell::new();

/// Config the global subscriber was installed with, if any.
#[must_use]
pub fn installed_config() -> Option<&'static LoggerConfig> {
    INSTALLED.get()
}

/// Reject configs that would fail late inside the appender or filter.
///
/// # Errors
/// `LoggingError::ConfigError` naming the offending setting.
pub fn validate_config(config: &LoggerConfig) -> Result<(), LoggingError> {
    if config.log_file_prefix.trim().is_empty() {
        return Err(LoggingError::ConfigError(
            "log_file_prefix must not be empty".into(),
        ));
    }
    if config.max_log_files == 0 {
        return Err(LoggingError::ConfigError(
            "max_log_files must be at least 1".into(),
        ));
    }
    Directive::from_str(&config.log_level)
        .map_err(|e| LoggingError::ConfigError(format!("log_level: {e}")))?;
    if config.log_dir.as_os_str().is_empty() {
        return Err(LoggingError::InvalidLogDirectory("empty path".into()));
    }
    Ok(())
}

fn setup_log_directory(dir: &Path) -> Result<(), LoggingError> {
    if dir.exists() && !dir.is_dir() {
        return Err(LoggingError::InvalidLogDirectory(dir.display().to_string()));
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

// Logger builder
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.config.log_level = CompactString::new(level);
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    #[must_use]
    pub const fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Install the global subscriber. Keep the returned guard alive for as
    /// long as logs should be flushed.
    ///
    /// # Errors
    /// `ListError::Logging` for a bad config, an unusable log directory or a
    /// second install; `ListError::Other` when the appender or subscriber
    /// cannot be set up.
    pub fn build(self) -> ListResult<WorkerGuard> {
        if INSTALLED.get().is_some() {
            return Err(LoggingError::AlreadyInitialized.into());
        }
        validate_config(&self.config)?;
        setup_log_directory(&self.config.log_dir)?;

        let rotation = match self.config.rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Daily => Rotation::DAILY,
        };

        let file_appender = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(self.config.log_file_prefix.as_str())
            .filename_suffix("jsonl")
            .max_log_files(self.config.max_log_files)
            .build(&self.config.log_dir)
            .context("Failed to create file appender")?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let level_str = self.config.log_level.clone();
        let make_filter = || -> Result<EnvFilter> {
            Ok(EnvFilter::from_default_env().add_directive(
                Directive::from_str(&level_str).context("Invalid log level in config")?,
            ))
        };

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(non_blocking)
            .with_filter(make_filter()?);

        let stderr_layer = self.config.stderr.then(|| {
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
        });

        tracing_subscriber::registry()
            .with(json_layer)
            .with(stderr_layer.with_filter(make_filter()?))
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        INSTALLED
            .set(self.config.clone())
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        info!(
            log_dir = %self.config.log_dir.display(),
            level = %self.config.log_level,
            "logging initialized"
        );
        Ok(guard)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
