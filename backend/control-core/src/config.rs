use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_SCRIPT_NAME: &str = "hibernate.sh";

/// Settings for one control listener: where to listen and what to run.
///
/// The on-disk shape is `{"port": "8080", "script_path": "..."}`. A listener
/// keeps the value it was started with; applying a new one restarts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_script_path")]
    pub script_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            script_path: default_script_path(),
        }
    }
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_script_path() -> String {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SCRIPT_NAME)
        .to_string_lossy()
        .into_owned()
}

impl ServerConfig {
    pub fn new(port: impl Into<String>, script_path: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            script_path: script_path.into(),
        }
    }

    /// Full path of the config file inside `config_dir`.
    pub fn file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(ServerConfig)` if loaded successfully or defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable or not valid JSON.
    /// Field values are not checked here; a bad port is rejected when the
    /// listener starts, so it shows up as a failed status like any other bind
    /// failure.
    #[track_caller]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = Self::file_path(config_dir);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ServerConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// Uses temp file + rename so a crash mid-write never leaves a truncated file.
    #[track_caller]
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = Self::file_path(config_dir);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the port is not a number in
    /// `0..=65535` or the script path is blank.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.port_number()?;

        if self.script_path.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "script_path cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Parse the port literal. `0` asks the OS for any free port.
    #[track_caller]
    pub fn port_number(&self) -> Result<u16, ConfigError> {
        self.port
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid port '{}': {e}", self.port),
            })
    }
}
