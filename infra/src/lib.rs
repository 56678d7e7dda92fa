//! # Infrastructure Layer
//!
//! Concrete implementations of the traits the core verification flow depends
//! on:
//!
//! - **Client**: `reqwest` client for the enrollment REST backend. Implements
//!   `EnrolleeApi` and exposes the admin endpoints (accounts, announcements,
//!   access control, queue history, system logs)
//! - **Store**: `SessionStore` implementations (in-memory, JSON file
//!   directory, Redis)
//! - **Config**: `.env` aware configuration loading
//!
//! ## Features
//!
//! - `redis-store`: Enable the Redis session store (default)

pub mod client;
pub mod config;
pub mod store;

pub use client::BackendClient;
pub use config::load_config;
pub use store::{open_session_store, FileSessionStore, MemorySessionStore, SessionBackend};

#[cfg(feature = "redis-store")]
pub use store::RedisSessionStore;

use enroll_shared::ConfigError;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[cfg(feature = "redis-store")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error in the file store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for InfrastructureError {
    fn from(err: ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}
