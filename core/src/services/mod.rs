//! Client-side services containing the verification logic.

pub mod verification;

// Re-export commonly used types
pub use verification::{
    Clock, CountdownTicker, EnrolleeApi, LoginOutcome, OtpDispatch, OtpStatus, OtpTimer,
    SessionStore, SignIn, SystemClock, TimerEvent, TimerSnapshot, TimerState, VerificationFlow,
    VerificationPolicy, VerifiedOtp, VerifyOutcome,
};
