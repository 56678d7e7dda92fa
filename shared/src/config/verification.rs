//! OTP verification timer configuration

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Upper bound on attempts a session may carry
pub const MAX_ALLOWED_ATTEMPTS: u8 = 3;

/// OTP validity, lockout and countdown settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Seconds an emailed code stays valid
    #[serde(default = "default_otp_validity")]
    pub otp_validity_seconds: u64,

    /// Seconds verification stays blocked after attempts run out
    #[serde(default = "default_lockout")]
    pub lockout_seconds: u64,

    /// Attempts granted per code (1..=3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,

    /// Countdown tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            otp_validity_seconds: default_otp_validity(),
            lockout_seconds: default_lockout(),
            max_attempts: default_max_attempts(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl VerificationConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            otp_validity_seconds: std::env::var("ENROLL_OTP_VALIDITY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.otp_validity_seconds),
            lockout_seconds: std::env::var("ENROLL_LOCKOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lockout_seconds),
            max_attempts: std::env::var("ENROLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            ..defaults
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ALLOWED_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "verification.max_attempts must be between 1 and {}, got {}",
                MAX_ALLOWED_ATTEMPTS, self.max_attempts
            )));
        }
        if self.otp_validity_seconds == 0 || self.lockout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "verification durations must be greater than zero".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "verification.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_otp_validity() -> u64 {
    300 // 5 minutes
}

fn default_lockout() -> u64 {
    300 // 5 minutes
}

fn default_max_attempts() -> u8 {
    MAX_ALLOWED_ATTEMPTS
}

fn default_tick_interval() -> u64 {
    1000
}
