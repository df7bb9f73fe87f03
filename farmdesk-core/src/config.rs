//! src/config.rs
//! ============================================================================
//! # Config: list defaults, notification timing, remote limits, logging
//!
//! Loads and saves settings as TOML from the platform config directory using
//! the [`directories`](https://docs.rs/directories) crate. A missing file
//! yields defaults, which are written back so users have something to edit.
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! config.save().await?;
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::info;

use crate::{
    controller::gateway::MutationMode,
    error::{ListError, ListResult},
    logging::LoggerConfig,
    model::{notification::NotificationLevel, pagination::PageSize},
};

/// Defaults applied to every list controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Rows per page when a list is first shown.
    pub default_page_size: PageSize,

    /// Mutation discipline for controllers that don't pick one explicitly.
    pub mutation_mode: MutationMode,

    /// Delay before a search keystroke re-filters the list.
    #[serde(with = "humantime_serde")]
    pub search_debounce: Duration,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_size: PageSize::Ten,
            mutation_mode: MutationMode::Confirmed,
            search_debounce: Duration::from_millis(300),
        }
    }
}

/// Auto-dismiss timing per level. `None` keeps the toast until dismissed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    #[serde(with = "humantime_serde")]
    pub info: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub success: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub warning: Option<Duration>,

    #[serde(with = "humantime_serde")]
    pub error: Option<Duration>,

    /// Oldest toasts are dropped beyond this many.
    pub max_visible: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            info: Some(Duration::from_millis(3000)),
            success: Some(Duration::from_millis(2000)),
            warning: Some(Duration::from_millis(5000)),
            error: None,
            max_visible: 5,
        }
    }
}

impl NotificationConfig {
    #[must_use]
    pub const fn auto_dismiss(&self, level: NotificationLevel) -> Option<Duration> {
        match level {
            NotificationLevel::Info => self.info,
            NotificationLevel::Success => self.success,
            NotificationLevel::Warning => self.warning,
            NotificationLevel::Error => self.error,
        }
    }
}

/// Limits applied to calls against the remote data service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Upper bound for a single create/update/delete/list call.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Upper bound for a whole bulk batch.
    #[serde(with = "humantime_serde")]
    pub bulk_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            bulk_timeout: Duration::from_secs(30),
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub list: ListConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub logging: LoggerConfig,
}

impl Config {
    /// Loads config from the platform config dir, or writes and returns the
    /// defaults when no file exists yet.
    ///
    /// The config is expected at `$XDG_CONFIG_HOME/farmdesk/config.toml`
    /// (Linux), or equivalent on Windows/macOS.
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if TokioFs::try_exists(&path).await.unwrap_or(false) {
            info!("Loading config from {}", path.display());
            Ok(Self::load_from(&path).await?)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;

            Ok(default_config)
        }
    }

    /// Saves config to the platform config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path).await?;
        Ok(())
    }

    /// Parse a config file at an explicit path.
    ///
    /// # Errors
    /// `ListError::ConfigIo` if the file can't be read, `ListError::Config`
    /// if it isn't valid TOML for this schema.
    pub async fn load_from(path: &Path) -> ListResult<Self> {
        let text = TokioFs::read_to_string(path)
            .await
            .map_err(|source| ListError::ConfigIo {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(toml::from_str(&text)?)
    }

    /// Write the config as pretty TOML, creating parent directories.
    ///
    /// # Errors
    /// `ListError::ConfigIo` on write failures.
    pub async fn save_to(&self, path: &Path) -> ListResult<()> {
        info!("Saving config to {}", path.display());

        let io_err = |source| ListError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(path, toml_str).await.map_err(io_err)?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "farmdesk", "farmdesk")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }
}
