//! Verification module for email OTP flows
//!
//! This module provides the complete client-side verification workflow:
//! - OTP countdown / lockout timer state machine
//! - Flow service tying the timer to the backend and a session store
//! - Repeating countdown ticker with teardown on drop

mod config;
mod service;
mod ticker;
mod timer;
mod traits;
mod types;


pub use config::VerificationPolicy;
pub use service::{SignIn, VerificationFlow};
pub use ticker::CountdownTicker;
pub use timer::OtpTimer;
pub use traits::{Clock, EnrolleeApi, SessionStore, SystemClock};
pub use types::{
    LoginOutcome, OtpDispatch, OtpStatus, TimerEvent, TimerSnapshot, TimerState, VerifiedOtp,
    VerifyOutcome,
};
