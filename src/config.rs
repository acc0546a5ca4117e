use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::git::command::{DEFAULT_OUTPUT_LIMIT, LOG_OUTPUT_LIMIT};
use crate::git::executor::DEFAULT_COMMAND_TIMEOUT;
use crate::git::relay::DEFAULT_RELAY_TIMEOUT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub git: GitSettings,
    pub relay: RelaySettings,
    pub limits: LimitSettings,
    pub audit: AuditSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitSettings {
    pub binary: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelaySettings {
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitSettings {
    pub default_output_bytes: usize,
    pub log_output_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuditSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME")
            .map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitrelay"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ReadError(
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Config file not found"
                )
            ));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            git: GitSettings {
                binary: "git".to_string(),
                timeout_seconds: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            },
            relay: RelaySettings {
                timeout_seconds: DEFAULT_RELAY_TIMEOUT.as_secs(),
            },
            limits: LimitSettings {
                default_output_bytes: DEFAULT_OUTPUT_LIMIT,
                log_output_bytes: LOG_OUTPUT_LIMIT,
            },
            audit: AuditSettings {
                enabled: false,
                log_path: None,
            },
        }
    }

    /// Timeout applied to plain command execution
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git.timeout_seconds)
    }

    /// Timeout applied to credentialed relay sessions
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay.timeout_seconds)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.git.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git binary must not be empty".to_string()
            ));
        }

        if self.git.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "git timeout_seconds must be greater than 0".to_string()
            ));
        }

        if self.relay.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "relay timeout_seconds must be greater than 0".to_string()
            ));
        }

        if self.limits.default_output_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "default_output_bytes must be greater than 0".to_string()
            ));
        }

        if self.limits.log_output_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "log_output_bytes must be greater than 0".to_string()
            ));
        }

        Ok(())
    }
}
