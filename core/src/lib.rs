//! # Enrollment Core
//!
//! Core domain layer for the enrollment client.
//! This crate contains the domain entities, the OTP verification timer state
//! machine and flow service, the traits the infrastructure layer implements
//! (backend API, session store, clock), and error types.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
