//! Error types for backend calls and verification flows.
//!
//! Backend failures are classified only as network failure vs server-rejected
//! request; the flow adds the client-side guards that stop a request before
//! it is sent. Every error is transient and maps to a user-facing message.

use thiserror::Error;

use crate::services::verification::TimerState;

/// Outcome of a failed backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request never produced a response (DNS, connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        /// Remaining OTP attempts, reported by the verify endpoints only
        attempts_left: Option<u8>,
    },

    /// Success status but the body was not what the endpoint promises
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
            attempts_left: None,
        }
    }

    /// 4xx rejection, i.e. the backend judged the request itself
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { status, .. } if (400..500).contains(status))
    }

    /// Text suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Unable to reach the enrollment server. Check your connection and try again."
                    .to_string()
            }
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Decode(_) => {
                "The enrollment server sent an unexpected response. Please try again.".to_string()
            }
        }
    }
}

/// Errors surfaced by a verification flow
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("A new code cannot be requested while {state} ({seconds_remaining}s remaining)")]
    ResendNotAllowed {
        state: TimerState,
        seconds_remaining: u64,
    },

    #[error("Verification locked for {seconds_remaining}s after too many failed attempts")]
    LockedOut { seconds_remaining: u64 },

    #[error("Verification code must be 6 digits")]
    InvalidCodeFormat,

    #[error("Email address is already verified")]
    AlreadyVerified,

    #[error("Verification flow already completed")]
    Completed,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session store error: {0}")]
    Store(String),
}

impl FlowError {
    /// Text suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            FlowError::ResendNotAllowed {
                state: TimerState::LockedOut,
                seconds_remaining,
            }
            | FlowError::LockedOut { seconds_remaining } => format!(
                "Too many failed attempts. Try again in {}.",
                format_countdown(*seconds_remaining)
            ),
            FlowError::ResendNotAllowed {
                seconds_remaining, ..
            } => format!(
                "Your current code is still valid. You can request a new one in {}.",
                format_countdown(*seconds_remaining)
            ),
            FlowError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Renders seconds as `m:ss`
pub fn format_countdown(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejection_classification() {
        assert!(ApiError::rejected(400, "Invalid OTP").is_client_rejection());
        assert!(ApiError::rejected(429, "Slow down").is_client_rejection());
        assert!(!ApiError::rejected(503, "Maintenance").is_client_rejection());
        assert!(!ApiError::Network("timeout".into()).is_client_rejection());
    }

    #[test]
    fn test_user_messages() {
        let err = FlowError::LockedOut {
            seconds_remaining: 125,
        };
        assert_eq!(err.user_message(), "Too many failed attempts. Try again in 2:05.");

        let err = FlowError::ResendNotAllowed {
            state: TimerState::Active,
            seconds_remaining: 42,
        };
        assert!(err.user_message().contains("0:42"));

        let err = FlowError::Api(ApiError::rejected(400, "Invalid OTP"));
        assert_eq!(err.user_message(), "Invalid OTP");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(61), "1:01");
    }
}
