//! HTTP client for the enrollment REST backend
//!
//! - `backend` - Shared `reqwest` client, request execution and error mapping
//! - `enrollee` - `EnrolleeApi` implementation (sign-in, OTP send/verify/status)
//! - `admin` - Accounts, announcements, access control, queue history, logs

mod admin;
mod backend;
mod enrollee;

pub use backend::BackendClient;
pub use enrollee::{send_path, status_path, verify_path, ENROLLEE_API_PREFIX};
