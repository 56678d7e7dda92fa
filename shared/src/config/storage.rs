//! Verification session storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Backing medium for persisted verification sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process memory; lost on exit
    Memory,
    /// One JSON file per session in a directory
    File,
    /// Redis keys
    Redis,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreKind::Memory),
            "file" | "fs" => Ok(StoreKind::File),
            "redis" => Ok(StoreKind::Redis),
            _ => Err(format!("Invalid store kind: {}", s)),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Store implementation
    #[serde(default = "default_kind")]
    pub kind: StoreKind,

    /// Directory for the file store
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Redis connection URL for the redis store
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Optional key prefix for the redis store
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            dir: default_dir(),
            redis_url: default_redis_url(),
            key_prefix: None,
        }
    }
}

impl StorageConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kind: std::env::var("ENROLL_STORE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.kind),
            dir: std::env::var("ENROLL_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: std::env::var("ENROLL_STORE_PREFIX").ok(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == StoreKind::Redis && !self.redis_url.starts_with("redis") {
            return Err(ConfigError::Invalid(format!(
                "storage.redis_url must be a redis:// or rediss:// URL, got '{}'",
                self.redis_url
            )));
        }
        Ok(())
    }
}

fn default_kind() -> StoreKind {
    StoreKind::File
}

fn default_dir() -> PathBuf {
    PathBuf::from(".enroll/sessions")
}

fn default_redis_url() -> String {
    String::from("redis://localhost:6379")
}
