//! Configuration module with area-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `backend` - Enrollment REST backend location and HTTP client settings
//! - `environment` - Environment detection and logging configuration
//! - `storage` - Where verification sessions are persisted
//! - `verification` - OTP validity, lockout and countdown settings

pub mod backend;
pub mod environment;
pub mod storage;
pub mod verification;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub use backend::BackendConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use storage::{StorageConfig, StoreKind};
pub use verification::VerificationConfig;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete client configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment the client runs in
    #[serde(default)]
    pub environment: Environment,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Verification timer configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            backend: BackendConfig::from_env(),
            verification: VerificationConfig::from_env(),
            storage: StorageConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        }
    }

    /// Load configuration from a TOML file; missing sections fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend.validate()?;
        if self.environment.is_production() && !self.backend.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "backend.base_url must use https:// in production".to_string(),
            ));
        }
        self.verification.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}
