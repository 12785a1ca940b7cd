//! Application configuration.
//!
//! A small versioned JSON document: where the published data lives, which
//! durable slot holds unsaved edits, whether to run as the read-only viewer,
//! and how much to log. Native builds read it from the user's config
//! directory (the CLI can write it there); the browser reads it from
//! localStorage. Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DATA_BASE_URL, DEFAULT_STORAGE_KEY};

/// How much the application logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(not(target_arch = "wasm32"), derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter for `env_logger`.
    pub fn to_level_filter(self) -> log::LevelFilter {
        self.to_level().to_level_filter()
    }

    /// Maximum level for `console_log`.
    pub fn to_level(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration format version. Files with a newer one are refused.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,

    /// Where the published catalog lives (URL prefix or directory)
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,

    /// Key of the durable slot holding unsaved edits
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Public viewer mode: never read unsaved edits
    #[serde(default)]
    pub ignore_local_storage: bool,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_data_base_url() -> String {
    DEFAULT_DATA_BASE_URL.to_string()
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_base_url: default_data_base_url(),
            storage_key: default_storage_key(),
            ignore_local_storage: false,
            log_level: LogLevel::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a configuration document, refusing newer format versions.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "mapa-tiana-config.json"
    }

    /// `<config_dir>/mapa-tiana/mapa-tiana-config.json`, falling back to
    /// `~/.config` when the platform has no config directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
        Some(base.join("mapa-tiana").join(Self::default_filename()))
    }

    /// Read the file at `path`. `Ok(None)` when there is no such file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read_from(path: &std::path::Path) -> Result<Option<Self>, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Configuration from `path` (or the default path), with defaults for
    /// anything missing. An unreadable file is logged and ignored.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default(path: Option<&std::path::Path>) -> Self {
        let Some(path) = path.map(std::path::Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };

        match Self::read_from(&path) {
            Ok(Some(config)) => {
                log::info!("Loaded configuration from {:?}", path);
                config
            }
            Ok(None) => {
                log::debug!("No config file at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write the configuration to `path`, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn write_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// localStorage key holding the browser configuration.
    #[cfg(target_arch = "wasm32")]
    pub const LOCAL_STORAGE_KEY: &'static str = "mapa-tiana-config";

    /// Configuration from localStorage, or the defaults when there is none
    /// or it cannot be used.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Self {
        use crate::persistence::{LocalStorage, SlotStorage};

        match LocalStorage::new().get_item(Self::LOCAL_STORAGE_KEY) {
            Ok(Some(json)) => Self::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring stored configuration: {}", e);
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Cannot read stored configuration: {}", e);
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors reading or writing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Configuration version {file_version} is newer than supported version {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("Configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
