use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Discovery settings for the catalog builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Item type that marks a workspace item as a storage container
    #[serde(default = "default_container_type")]
    pub container_type: String,
    /// Name of the canonical files root inside each container
    #[serde(default = "default_files_root")]
    pub files_root: String,
    /// How many containers are listed at once; 1 lists them one after another
    #[serde(default = "default_listing_concurrency")]
    pub listing_concurrency: usize,
    /// Per-container listing timeout; a timed-out container is skipped
    #[serde(
        default,
        with = "duration_serde::option_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub listing_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewBackend {
    #[default]
    Memory,
    TempDir,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default)]
    pub backend: PreviewBackend,
    /// Directory used by the `temp_dir` backend
    #[serde(default = "default_preview_temp_path")]
    pub temp_path: PathBuf,
    /// Where downloads are saved
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,
    /// Decoded previews larger than this fail instead of allocating a resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_preview_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_container_type() -> String {
    DEFAULT_CONTAINER_TYPE.to_string()
}

fn default_files_root() -> String {
    DEFAULT_FILES_ROOT.to_string()
}

fn default_listing_concurrency() -> usize {
    DEFAULT_LISTING_CONCURRENCY
}

fn default_preview_temp_path() -> PathBuf {
    PathBuf::from(DEFAULT_PREVIEW_TEMP_PATH)
}

fn default_download_path() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_PATH)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            container_type: default_container_type(),
            files_root: default_files_root(),
            listing_concurrency: default_listing_concurrency(),
            listing_timeout: None,
        }
    }
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            backend: PreviewBackend::default(),
            temp_path: default_preview_temp_path(),
            download_path: default_download_path(),
            max_preview_bytes: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl CatalogSettings {
    pub fn validate(&self) -> Result<()> {
        if self.container_type.trim().is_empty() {
            bail!("catalog.container_type must not be empty");
        }
        let root = self.files_root.trim();
        if root.is_empty() || root.contains('/') {
            bail!(
                "catalog.files_root must be a single path segment, got '{}'",
                self.files_root
            );
        }
        if self.listing_concurrency == 0 {
            bail!("catalog.listing_concurrency must be at least 1");
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()?;
        if self.preview.max_preview_bytes == Some(0) {
            bail!("preview.max_preview_bytes must be greater than 0 when set");
        }
        Ok(())
    }

    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from_file(&config_file)
    }

    /// Load settings from a TOML file; a missing file yields the defaults.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config = if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config: Self = toml::from_str(&contents)?;
            info!("Configuration loaded from: {}", config_file);
            config
        } else {
            info!("No config file at {}, using defaults", config_file);
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }
}
