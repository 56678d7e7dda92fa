//! OTP countdown / lockout state machine
//!
//! The timer never counts down a stored number of seconds. Every tick
//! re-derives the remaining time from the absolute expiries held in the
//! [`VerificationSession`], so a restored session shows the same countdown
//! as one that was never persisted.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::verification_session::VerificationSession;

use super::config::VerificationPolicy;
use super::types::{TimerEvent, TimerSnapshot, TimerState};

/// Countdown and attempt bookkeeping for one verification session
#[derive(Debug, Clone)]
pub struct OtpTimer {
    session: VerificationSession,
    policy: VerificationPolicy,
    state: TimerState,
}

impl OtpTimer {
    /// Starts a timer for a code issued at `now`
    pub fn start(
        email: impl Into<String>,
        first_name: impl Into<String>,
        now: DateTime<Utc>,
        policy: VerificationPolicy,
    ) -> Self {
        let session = VerificationSession::new(
            email,
            first_name,
            now,
            policy.otp_validity,
            policy.max_attempts,
        );
        Self {
            session,
            policy,
            state: TimerState::Active,
        }
    }

    /// Rebuilds a timer from a persisted session
    ///
    /// The state is derived from the absolute expiries, so a lockout or code
    /// that lapsed while nothing was running is settled immediately.
    pub fn restore(
        mut session: VerificationSession,
        now: DateTime<Utc>,
        policy: VerificationPolicy,
    ) -> Self {
        session.sanitize(policy.max_attempts);
        let state = if session.is_locked_out {
            TimerState::LockedOut
        } else if session.is_otp_expired {
            TimerState::Expired
        } else {
            TimerState::Active
        };

        let mut timer = Self {
            session,
            policy,
            state,
        };
        timer.tick(now);
        timer
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    pub fn attempts_left(&self) -> u8 {
        self.session.attempts_left
    }

    /// Whole seconds until the code expires, rounded up; zero once expired
    pub fn otp_seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        ceil_seconds(self.session.otp_time_left(now))
    }

    /// Whole seconds until the lockout ends, rounded up; zero when not locked
    pub fn lockout_seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        ceil_seconds(self.session.lockout_time_left(now))
    }

    /// Seconds until a resend becomes possible
    pub fn resend_wait_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self.state {
            TimerState::Active => self.otp_seconds_remaining(now),
            TimerState::Expired => 0,
            TimerState::LockedOut => self.lockout_seconds_remaining(now),
        }
    }

    /// Resend requires an expired code and no lockout
    pub fn can_resend(&self) -> bool {
        self.state == TimerState::Expired && !self.session.is_locked_out
    }

    /// Verify is allowed whenever not locked out; the backend rules on expiry
    pub fn can_verify(&self) -> bool {
        self.state != TimerState::LockedOut
    }

    /// Advances the state machine to `now`
    ///
    /// Returns the transitions taken, in order. A lockout that elapses returns
    /// the timer to `Active` with a full attempt budget; if the code itself
    /// lapsed meanwhile, the same tick continues to `Expired`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let mut events = Vec::new();

        if self.state == TimerState::LockedOut
            && self.session.lockout_time_left(now) == Duration::zero()
        {
            self.session.unlock(self.policy.max_attempts);
            self.state = TimerState::Active;
            events.push(TimerEvent::LockoutElapsed);
        }

        if self.state == TimerState::Active
            && self.session.otp_time_left(now) == Duration::zero()
        {
            self.session.is_otp_expired = true;
            self.state = TimerState::Expired;
            events.push(TimerEvent::Expired);
        }

        events
    }

    /// Applies a rejected verify attempt
    ///
    /// `reported` is the backend's remaining-attempt count. It can lower the
    /// local count but never raise it; without it the local count drops by
    /// one. Reaching zero starts the lockout.
    pub fn record_rejection(
        &mut self,
        reported: Option<u8>,
        now: DateTime<Utc>,
    ) -> Option<TimerEvent> {
        if self.state == TimerState::LockedOut {
            return None;
        }

        let current = self.session.attempts_left;
        self.session.attempts_left = match reported {
            Some(left) => left.min(current),
            None => current.saturating_sub(1),
        };

        if self.session.attempts_left == 0 {
            self.session.lock(now, self.policy.lockout_duration);
            self.state = TimerState::LockedOut;
            return Some(TimerEvent::LockoutStarted);
        }
        None
    }

    /// Applies a newly issued code
    ///
    /// Uses the backend-reported expiry when it lies in the future, otherwise
    /// the configured validity from `now`.
    pub fn reissue(&mut self, otp_expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TimerEvent {
        let expiry = otp_expiry
            .filter(|expiry| *expiry > now)
            .unwrap_or(now + self.policy.otp_validity);
        self.session.reissue(expiry, self.policy.max_attempts);
        self.state = TimerState::Active;
        TimerEvent::Reissued
    }

    /// Updates the display name carried by the session
    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.session.first_name = first_name.into();
    }

    /// Read-only view for rendering
    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            email: self.session.email.clone(),
            state: self.state,
            otp_seconds_remaining: self.otp_seconds_remaining(now),
            lockout_seconds_remaining: self.lockout_seconds_remaining(now),
            attempts_left: self.session.attempts_left,
            can_resend: self.can_resend(),
            can_verify: self.can_verify(),
        }
    }
}

fn ceil_seconds(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    ((millis + 999) / 1000) as u64
}
