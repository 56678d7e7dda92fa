//! Shared utilities and common types for the enrollment client
//!
//! This crate provides common functionality used across all workspace crates:
//! - Configuration types and loaders
//! - Backend response envelopes
//! - Utility functions (email validation, masking, OTP code format)

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, BackendConfig, ConfigError, Environment, LogFormat, LoggingConfig, StorageConfig,
    StoreKind, VerificationConfig,
};
pub use types::RejectionBody;
pub use utils::{email, validation};
