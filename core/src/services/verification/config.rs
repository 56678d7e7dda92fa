//! Configuration for the verification timer

use chrono::Duration;
use enroll_shared::config::VerificationConfig;

use crate::domain::entities::verification_session::MAX_ATTEMPTS;

/// Durations and attempt budget the timer enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// How long an issued code is accepted
    pub otp_validity: Duration,
    /// How long verification stays blocked once attempts run out
    pub lockout_duration: Duration,
    /// Attempts granted per code
    pub max_attempts: u8,
    /// Interval between countdown ticks
    pub tick_interval: std::time::Duration,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            otp_validity: Duration::minutes(5),
            lockout_duration: Duration::minutes(5),
            max_attempts: MAX_ATTEMPTS,
            tick_interval: std::time::Duration::from_secs(1),
        }
    }
}

impl From<&VerificationConfig> for VerificationPolicy {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            otp_validity: Duration::seconds(config.otp_validity_seconds as i64),
            lockout_duration: Duration::seconds(config.lockout_seconds as i64),
            max_attempts: config.max_attempts.clamp(1, MAX_ATTEMPTS),
            tick_interval: std::time::Duration::from_millis(config.tick_interval_ms.max(1)),
        }
    }
}
