//! Verification flow: the OTP timer wired to the backend and a session store

use std::sync::Arc;

use chrono::{DateTime, Utc};
use enroll_shared::utils::{is_valid_email, is_valid_otp_code, mask_email, normalize_email};
use tracing::{debug, info, warn};

use crate::domain::entities::verification_session::{OtpPurpose, VerificationSession};
use crate::errors::{ApiError, FlowError, FlowResult};

use super::config::VerificationPolicy;
use super::timer::OtpTimer;
use super::traits::{Clock, EnrolleeApi, SessionStore};
use super::types::{
    LoginOutcome, OtpStatus, TimerEvent, TimerSnapshot, TimerState, VerifyOutcome,
};

/// Result of a credential sign-in
pub enum SignIn<A: EnrolleeApi, S: SessionStore> {
    /// No second factor required
    Authenticated(LoginOutcome),
    /// Credentials accepted; the emailed code must be verified next
    OtpRequired(VerificationFlow<A, S>),
}

/// One in-progress OTP verification for one email address
///
/// Owns the [`OtpTimer`] and keeps its session persisted under
/// `otpVerification_<email>`. Backend failures never touch the timer; only a
/// 4xx verify rejection consumes an attempt.
pub struct VerificationFlow<A: EnrolleeApi, S: SessionStore> {
    api: Arc<A>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    purpose: OtpPurpose,
    timer: OtpTimer,
    completed: bool,
}

impl<A: EnrolleeApi, S: SessionStore> VerificationFlow<A, S> {
    /// Open the flow for `email`
    ///
    /// Resumes the persisted session when one exists. Otherwise the backend
    /// status endpoint seeds the session; if the backend cannot be reached a
    /// fresh local session is started.
    ///
    /// # Errors
    ///
    /// * `FlowError::InvalidEmail` - malformed address
    /// * `FlowError::AlreadyVerified` - the address needs no verification
    pub async fn open(
        api: Arc<A>,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        policy: VerificationPolicy,
        email: &str,
        purpose: OtpPurpose,
    ) -> FlowResult<Self> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(FlowError::InvalidEmail { email });
        }

        let key = VerificationSession::storage_key(&email);
        let now = clock.now();

        let persisted = match store.load(&key).await {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    email = %mask_email(&email),
                    error = %e,
                    event = "session_load_failed",
                    "Failed to load persisted verification session"
                );
                None
            }
        };

        let timer = match persisted {
            Some(session) => {
                debug!(
                    email = %mask_email(&email),
                    purpose = %purpose,
                    event = "session_restored",
                    "Restored persisted verification session"
                );
                OtpTimer::restore(session, now, policy)
            }
            None => Self::seed_timer(api.as_ref(), &email, purpose, now, policy).await?,
        };

        let flow = Self {
            api,
            store,
            clock,
            purpose,
            timer,
            completed: false,
        };
        flow.persist().await;
        Ok(flow)
    }

    /// Sign in with credentials, then start the sign-in OTP flow
    ///
    /// The OTP is only requested after the credential check succeeded. A
    /// session that is still locked out is resumed without sending a code.
    pub async fn sign_in(
        api: Arc<A>,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        policy: VerificationPolicy,
        email: &str,
        password: &str,
    ) -> FlowResult<SignIn<A, S>> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(FlowError::InvalidEmail { email });
        }

        let outcome = api.login(&email, password).await.map_err(|e| {
            warn!(
                email = %mask_email(&email),
                error = %e,
                event = "sign_in_failed",
                "Credential sign-in failed"
            );
            e
        })?;

        if !outcome.requires_otp {
            info!(
                email = %mask_email(&email),
                event = "sign_in_complete",
                "Signed in without a second factor"
            );
            return Ok(SignIn::Authenticated(outcome));
        }

        let mut flow =
            Self::open(api, store, clock, policy, &email, OtpPurpose::SignIn).await?;
        if let Some(first_name) = outcome.first_name {
            flow.timer.set_first_name(first_name);
        }
        if flow.timer.state() != TimerState::LockedOut {
            flow.send().await?;
        }
        Ok(SignIn::OtpRequired(flow))
    }

    async fn seed_timer(
        api: &A,
        email: &str,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
        policy: VerificationPolicy,
    ) -> FlowResult<OtpTimer> {
        match api.otp_status(purpose, email).await {
            Ok(status) if status.is_verified && purpose == OtpPurpose::EmailVerification => {
                info!(
                    email = %mask_email(email),
                    event = "already_verified",
                    "Email address is already verified"
                );
                Err(FlowError::AlreadyVerified)
            }
            Ok(status) => Ok(Self::timer_from_status(email, status, now, policy)),
            Err(e) => {
                warn!(
                    email = %mask_email(email),
                    purpose = %purpose,
                    error = %e,
                    event = "status_unavailable",
                    "Could not fetch verification status, starting a local session"
                );
                Ok(OtpTimer::start(email, "", now, policy))
            }
        }
    }

    fn timer_from_status(
        email: &str,
        status: OtpStatus,
        now: DateTime<Utc>,
        policy: VerificationPolicy,
    ) -> OtpTimer {
        let mut session = VerificationSession::new(
            email,
            status.first_name.unwrap_or_default(),
            now,
            policy.otp_validity,
            policy.max_attempts,
        );
        if let Some(expiry) = status.otp_expiry {
            session.otp_expiry = expiry;
        }
        if let Some(left) = status.attempts_left {
            session.attempts_left = left.min(policy.max_attempts);
        }
        if status.is_locked_out || session.attempts_left == 0 {
            session.attempts_left = 0;
            session.is_locked_out = true;
            session.lockout_expiry =
                Some(status.lockout_expiry.unwrap_or(now + policy.lockout_duration));
        }
        OtpTimer::restore(session, now, policy)
    }

    pub fn email(&self) -> &str {
        &self.timer.session().email
    }

    pub fn purpose(&self) -> OtpPurpose {
        self.purpose
    }

    pub fn timer(&self) -> &OtpTimer {
        &self.timer
    }

    /// Whether the flow ended through verification or abandonment
    pub fn is_finished(&self) -> bool {
        self.completed
    }

    /// Read-only view of the timer at the current time
    pub fn snapshot(&self) -> TimerSnapshot {
        self.timer.snapshot(self.clock.now())
    }

    /// Request a code unconditionally (first code of a flow)
    ///
    /// A failed request leaves the timer untouched.
    pub async fn send(&mut self) -> FlowResult<TimerSnapshot> {
        self.ensure_open()?;

        let dispatch = self
            .api
            .send_otp(self.purpose, self.email())
            .await
            .map_err(|e| {
                warn!(
                    email = %mask_email(self.email()),
                    purpose = %self.purpose,
                    error = %e,
                    event = "otp_send_failed",
                    "Failed to request verification code"
                );
                e
            })?;

        let now = self.clock.now();
        self.timer.reissue(dispatch.otp_expiry, now);
        if let Some(first_name) = dispatch.first_name {
            self.timer.set_first_name(first_name);
        }

        info!(
            email = %mask_email(self.email()),
            purpose = %self.purpose,
            expires_in = self.timer.otp_seconds_remaining(now),
            event = "otp_sent",
            "Verification code sent"
        );

        self.persist().await;
        Ok(self.timer.snapshot(now))
    }

    /// Request a replacement code
    ///
    /// Only allowed once the current code expired and no lockout is running;
    /// otherwise rejected without contacting the backend.
    pub async fn resend(&mut self) -> FlowResult<TimerSnapshot> {
        self.ensure_open()?;

        let now = self.clock.now();
        self.settle(now).await;

        if !self.timer.can_resend() {
            debug!(
                email = %mask_email(self.email()),
                state = %self.timer.state(),
                event = "resend_blocked",
                "Resend rejected client-side"
            );
            return Err(FlowError::ResendNotAllowed {
                state: self.timer.state(),
                seconds_remaining: self.timer.resend_wait_seconds(now),
            });
        }

        self.send().await
    }

    /// Submit a code
    ///
    /// # Returns
    ///
    /// * `Ok(VerifyOutcome::Verified)` - accepted; the persisted session is deleted
    /// * `Ok(VerifyOutcome::Rejected)` - refused; attempts updated, maybe locked out
    /// * `Err(FlowError)` - blocked client-side, or the backend was unreachable
    pub async fn verify(&mut self, code: &str) -> FlowResult<VerifyOutcome> {
        self.ensure_open()?;

        let now = self.clock.now();
        self.settle(now).await;

        if !self.timer.can_verify() {
            return Err(FlowError::LockedOut {
                seconds_remaining: self.timer.lockout_seconds_remaining(now),
            });
        }

        let code = code.trim();
        if !is_valid_otp_code(code) {
            return Err(FlowError::InvalidCodeFormat);
        }

        match self.api.verify_otp(self.purpose, self.email(), code).await {
            Ok(verified) => {
                self.completed = true;
                info!(
                    email = %mask_email(self.email()),
                    purpose = %self.purpose,
                    event = "otp_verified",
                    "Verification code accepted"
                );
                if let Err(e) = self.store.delete(&self.key()).await {
                    warn!(
                        email = %mask_email(self.email()),
                        error = %e,
                        event = "session_delete_failed",
                        "Failed to clear verification session"
                    );
                }
                Ok(VerifyOutcome::Verified(verified))
            }
            Err(ApiError::Rejected {
                status,
                message,
                attempts_left,
            }) if (400..500).contains(&status) => {
                let event = self.timer.record_rejection(attempts_left, self.clock.now());
                let locked_out = event == Some(TimerEvent::LockoutStarted);

                warn!(
                    email = %mask_email(self.email()),
                    purpose = %self.purpose,
                    status = status,
                    attempts_left = self.timer.attempts_left(),
                    event = "otp_verify_rejected",
                    "Verification code rejected"
                );
                if locked_out {
                    warn!(
                        email = %mask_email(self.email()),
                        lockout_seconds = self.timer.policy().lockout_duration.num_seconds(),
                        event = "lockout_started",
                        "Verification attempts exhausted"
                    );
                }

                self.persist().await;
                Ok(VerifyOutcome::Rejected {
                    message,
                    attempts_left: self.timer.attempts_left(),
                    locked_out,
                })
            }
            Err(e) => {
                warn!(
                    email = %mask_email(self.email()),
                    error = %e,
                    event = "otp_verify_failed",
                    "Verification request failed"
                );
                Err(e.into())
            }
        }
    }

    /// Advance the countdown to the current time
    ///
    /// Persists the session whenever a transition happened.
    pub async fn tick(&mut self) -> Vec<TimerEvent> {
        if self.completed {
            return Vec::new();
        }
        let now = self.clock.now();
        self.settle(now).await
    }

    /// Leave the flow without verifying; the persisted session is removed
    pub async fn abandon(&mut self) -> FlowResult<()> {
        self.completed = true;
        info!(
            email = %mask_email(self.email()),
            event = "flow_abandoned",
            "Verification flow abandoned"
        );
        self.store
            .delete(&self.key())
            .await
            .map_err(FlowError::Store)
    }

    async fn settle(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let events = self.timer.tick(now);
        for event in &events {
            debug!(
                email = %mask_email(self.email()),
                event = ?event,
                state = %self.timer.state(),
                "Timer transition"
            );
        }
        if !events.is_empty() {
            self.persist().await;
        }
        events
    }

    fn ensure_open(&self) -> FlowResult<()> {
        if self.completed {
            return Err(FlowError::Completed);
        }
        Ok(())
    }

    fn key(&self) -> String {
        self.timer.session().key()
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.key(), self.timer.session()).await {
            warn!(
                email = %mask_email(self.email()),
                error = %e,
                event = "session_save_failed",
                "Failed to persist verification session"
            );
        }
    }
}
