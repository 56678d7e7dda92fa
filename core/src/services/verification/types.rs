//! Types for timer state and verification results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the OTP countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerState {
    /// Counting down to code expiry
    Active,
    /// Countdown reached zero; a new code may be requested
    Expired,
    /// Attempts exhausted; counting down to the end of the lockout
    LockedOut,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerState::Active => write!(f, "active"),
            TimerState::Expired => write!(f, "expired"),
            TimerState::LockedOut => write!(f, "locked out"),
        }
    }
}

/// Transition observed by the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// `Active -> Expired`
    Expired,
    /// `Active/Expired -> LockedOut`
    LockoutStarted,
    /// `LockedOut -> Active` because the lockout countdown elapsed
    LockoutElapsed,
    /// Any state to `Active` because a new code was issued
    Reissued,
}

/// Read-only view of the timer for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub email: String,
    pub state: TimerState,
    /// Seconds until the code expires, zero once expired
    pub otp_seconds_remaining: u64,
    /// Seconds until the lockout ends, zero when not locked out
    pub lockout_seconds_remaining: u64,
    pub attempts_left: u8,
    pub can_resend: bool,
    pub can_verify: bool,
}

/// Result of submitting a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code accepted; the persisted session has been removed
    Verified(VerifiedOtp),
    /// Code refused by the backend; one attempt consumed
    Rejected {
        message: String,
        attempts_left: u8,
        locked_out: bool,
    },
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyOutcome::Verified(_))
    }
}

/// Backend acknowledgement of a sent code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpDispatch {
    #[serde(default)]
    pub message: String,
    /// Absolute expiry of the new code, when the backend reports it
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub otp_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Backend acknowledgement of an accepted code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedOtp {
    #[serde(default)]
    pub message: String,
    /// Session or reset token, depending on the flow
    #[serde(default)]
    pub token: Option<String>,
}

/// Server-side view of a verification flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpStatus {
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub otp_expiry: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub lockout_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempts_left: Option<u8>,
    #[serde(default)]
    pub is_locked_out: bool,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Result of a credential sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    #[serde(default)]
    pub message: String,
    /// Whether a second-factor code must follow
    #[serde(default = "default_requires_otp")]
    pub requires_otp: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    /// Present when no OTP step is required
    #[serde(default)]
    pub token: Option<String>,
}

fn default_requires_otp() -> bool {
    true
}
