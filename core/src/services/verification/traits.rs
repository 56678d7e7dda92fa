//! Traits for backend and storage integration

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::verification_session::{OtpPurpose, VerificationSession};
use crate::errors::ApiError;

use super::types::{LoginOutcome, OtpDispatch, OtpStatus, VerifiedOtp};

/// Enrollee-facing backend endpoints the verification flow needs
#[async_trait]
pub trait EnrolleeApi: Send + Sync {
    /// Check credentials; must succeed before a sign-in OTP is requested
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError>;
    /// Ask the backend to email a (new) code for `purpose`
    async fn send_otp(&self, purpose: OtpPurpose, email: &str) -> Result<OtpDispatch, ApiError>;
    /// Submit a code; rejections may carry the remaining attempt count
    async fn verify_otp(
        &self,
        purpose: OtpPurpose,
        email: &str,
        code: &str,
    ) -> Result<VerifiedOtp, ApiError>;
    /// Current server-side state of the flow for `email`
    async fn otp_status(&self, purpose: OtpPurpose, email: &str) -> Result<OtpStatus, ApiError>;
}

/// Persistent key-value store for verification sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session stored under `key`, if any
    async fn load(&self, key: &str) -> Result<Option<VerificationSession>, String>;
    /// Store `session` under `key`, replacing any previous value
    async fn save(&self, key: &str, session: &VerificationSession) -> Result<(), String>;
    /// Remove the session stored under `key`; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<(), String>;
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
