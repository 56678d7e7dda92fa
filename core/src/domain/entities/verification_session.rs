//! Verification session entity for email OTP flows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of verification attempts per code
pub const MAX_ATTEMPTS: u8 = 3;

/// Prefix of the key a session is persisted under
pub const SESSION_KEY_PREFIX: &str = "otpVerification_";

/// Which backend flow an OTP belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OtpPurpose {
    /// Confirming the address of a newly registered applicant
    EmailVerification,
    /// Second factor after a password sign-in
    SignIn,
    /// Proving inbox ownership before a password change
    PasswordReset,
}

impl OtpPurpose {
    /// Short label used in logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "email-verification",
            OtpPurpose::SignIn => "sign-in",
            OtpPurpose::PasswordReset => "password-reset",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email-verification" | "verification" | "email" => Ok(OtpPurpose::EmailVerification),
            "sign-in" | "signin" | "login" => Ok(OtpPurpose::SignIn),
            "password-reset" | "reset" => Ok(OtpPurpose::PasswordReset),
            _ => Err(format!("Invalid OTP purpose: {}", s)),
        }
    }
}

/// Client-persisted record of an in-progress OTP verification for one email
///
/// Expiries are stored as absolute timestamps (epoch milliseconds on the
/// wire) so remaining time can be re-derived after a restart without drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    /// Email address the code was sent to
    pub email: String,

    /// When the session was first created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// When the current code stops being accepted
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub otp_expiry: DateTime<Utc>,

    /// When the lockout ends; persisted as `0` when not locked out
    #[serde(with = "lockout_millis", default)]
    pub lockout_expiry: Option<DateTime<Utc>>,

    /// Verification attempts remaining for the current code
    pub attempts_left: u8,

    /// Whether verification is suspended
    pub is_locked_out: bool,

    /// Whether the countdown reached zero
    pub is_otp_expired: bool,

    /// Display name only
    #[serde(default)]
    pub first_name: String,
}

impl VerificationSession {
    /// Creates a session for a code that was just issued
    ///
    /// # Arguments
    ///
    /// * `email` - Address the code was sent to
    /// * `first_name` - Display name, may be empty
    /// * `now` - Issue time
    /// * `otp_validity` - How long the code is accepted
    /// * `max_attempts` - Attempts granted for the code
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        now: DateTime<Utc>,
        otp_validity: Duration,
        max_attempts: u8,
    ) -> Self {
        Self {
            email: email.into(),
            created_at: now,
            otp_expiry: now + otp_validity,
            lockout_expiry: None,
            attempts_left: max_attempts,
            is_locked_out: false,
            is_otp_expired: false,
            first_name: first_name.into(),
        }
    }

    /// Key a session for `email` is persisted under
    pub fn storage_key(email: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, email)
    }

    /// Key this session is persisted under
    pub fn key(&self) -> String {
        Self::storage_key(&self.email)
    }

    /// Time left on the current code, zero once expired
    pub fn otp_time_left(&self, now: DateTime<Utc>) -> Duration {
        (self.otp_expiry - now).max(Duration::zero())
    }

    /// Time left on the lockout, zero when not locked out
    pub fn lockout_time_left(&self, now: DateTime<Utc>) -> Duration {
        match self.lockout_expiry {
            Some(expiry) if self.is_locked_out => (expiry - now).max(Duration::zero()),
            _ => Duration::zero(),
        }
    }

    /// Enters lockout until `now + duration`
    pub fn lock(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.attempts_left = 0;
        self.is_locked_out = true;
        self.lockout_expiry = Some(now + duration);
    }

    /// Leaves lockout and restores the attempt budget
    pub fn unlock(&mut self, max_attempts: u8) {
        self.attempts_left = max_attempts;
        self.is_locked_out = false;
        self.lockout_expiry = None;
    }

    /// Replaces the code: new expiry, full attempts, no lockout
    pub fn reissue(&mut self, otp_expiry: DateTime<Utc>, max_attempts: u8) {
        self.otp_expiry = otp_expiry;
        self.is_otp_expired = false;
        self.unlock(max_attempts);
    }

    /// Repairs records that violate the session invariants
    ///
    /// Persisted records may have been written by an older client or edited by
    /// hand; attempts are capped and a lockout always means zero attempts.
    pub fn sanitize(&mut self, max_attempts: u8) {
        self.attempts_left = self.attempts_left.min(max_attempts);
        match (self.is_locked_out, self.lockout_expiry) {
            // A lockout without an end cannot be honoured
            (true, None) => self.unlock(max_attempts),
            (true, Some(_)) => self.attempts_left = 0,
            (false, _) => self.lockout_expiry = None,
        }
    }
}

/// `Option<DateTime<Utc>>` as epoch milliseconds, with `0` meaning none
mod lockout_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.map(|dt| dt.timestamp_millis()).unwrap_or(0))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
        if millis <= 0 {
            return Ok(None);
        }
        Ok(DateTime::from_timestamp_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_session() {
        let session =
            VerificationSession::new("jane@school.edu", "Jane", at(0), Duration::seconds(300), 3);

        assert_eq!(session.otp_expiry, at(300));
        assert_eq!(session.attempts_left, MAX_ATTEMPTS);
        assert!(!session.is_locked_out);
        assert!(!session.is_otp_expired);
        assert_eq!(session.lockout_expiry, None);
        assert_eq!(session.key(), "otpVerification_jane@school.edu");
    }

    #[test]
    fn test_time_left_never_negative() {
        let session =
            VerificationSession::new("jane@school.edu", "", at(0), Duration::seconds(60), 3);

        assert_eq!(session.otp_time_left(at(20)), Duration::seconds(40));
        assert_eq!(session.otp_time_left(at(60)), Duration::zero());
        assert_eq!(session.otp_time_left(at(500)), Duration::zero());
        assert_eq!(session.lockout_time_left(at(20)), Duration::zero());
    }

    #[test]
    fn test_lock_and_unlock() {
        let mut session =
            VerificationSession::new("jane@school.edu", "", at(0), Duration::seconds(60), 3);

        session.lock(at(10), Duration::seconds(300));
        assert!(session.is_locked_out);
        assert_eq!(session.attempts_left, 0);
        assert_eq!(session.lockout_time_left(at(100)), Duration::seconds(210));

        session.unlock(3);
        assert!(!session.is_locked_out);
        assert_eq!(session.attempts_left, 3);
        assert_eq!(session.lockout_expiry, None);
    }

    #[test]
    fn test_wire_format_is_camel_case_millis() {
        let session =
            VerificationSession::new("jane@school.edu", "Jane", at(0), Duration::seconds(300), 3);
        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["otpExpiry"], at(300).timestamp_millis());
        assert_eq!(json["lockoutExpiry"], 0);
        assert_eq!(json["attemptsLeft"], 3);
        assert_eq!(json["isLockedOut"], false);
        assert_eq!(json["firstName"], "Jane");

        let back: VerificationSession = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_lockout_zero_and_null_read_as_none() {
        let raw = r#"{
            "email": "jane@school.edu",
            "createdAt": 1750000000000,
            "otpExpiry": 1750000300000,
            "lockoutExpiry": null,
            "attemptsLeft": 2,
            "isLockedOut": false,
            "isOtpExpired": false
        }"#;
        let session: VerificationSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.lockout_expiry, None);
        assert_eq!(session.first_name, "");
    }

    #[test]
    fn test_sanitize_enforces_invariants() {
        let mut session =
            VerificationSession::new("jane@school.edu", "", at(0), Duration::seconds(60), 3);
        session.attempts_left = 9;
        session.sanitize(3);
        assert_eq!(session.attempts_left, 3);

        session.is_locked_out = true;
        session.lockout_expiry = Some(at(100));
        session.attempts_left = 2;
        session.sanitize(3);
        assert_eq!(session.attempts_left, 0);

        session.lockout_expiry = None;
        session.sanitize(3);
        assert!(!session.is_locked_out);
        assert_eq!(session.attempts_left, 3);
    }

    #[test]
    fn test_purpose_parsing() {
        assert_eq!("signin".parse::<OtpPurpose>().unwrap(), OtpPurpose::SignIn);
        assert_eq!("reset".parse::<OtpPurpose>().unwrap(), OtpPurpose::PasswordReset);
        assert_eq!(
            OtpPurpose::EmailVerification.to_string(),
            "email-verification"
        );
        assert!("sms".parse::<OtpPurpose>().is_err());
    }
}
