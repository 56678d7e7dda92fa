//! Enrollment backend configuration

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Location of the enrollment REST backend and HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL, without trailing slash (e.g. `https://enroll.example.edu`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Bearer token for admin endpoints
    #[serde(default)]
    pub api_token: Option<String>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            api_token: None,
            user_agent: default_user_agent(),
        }
    }
}

impl BackendConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("ENROLL_API_URL").unwrap_or(defaults.base_url),
            timeout_seconds: std::env::var("ENROLL_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
            api_token: std::env::var("ENROLL_API_TOKEN").ok(),
            ..defaults
        }
    }

    /// Create a configuration pointing at the given URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Base URL with any trailing slash removed
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let url = self.normalized_base_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    String::from("http://localhost:5000")
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("enroll-client/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = BackendConfig::new("https://enroll.example.edu/");
        assert_eq!(config.normalized_base_url(), "https://enroll.example.edu");
    }

    #[test]
    fn test_non_http_url_is_invalid() {
        let config = BackendConfig::new("ftp://enroll.example.edu");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = BackendConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
