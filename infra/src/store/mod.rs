//! Session store implementations
//!
//! Verification sessions are small JSON records keyed by
//! `otpVerification_<email>`. Three backings are available:
//! - `memory` - process memory, for tests and one-shot commands
//! - `file` - one JSON file per key in a directory
//! - `redis` - Redis strings (feature `redis-store`)

mod file;
mod memory;
#[cfg(feature = "redis-store")]
mod redis_store;

use async_trait::async_trait;
use tracing::info;

use enroll_core::domain::VerificationSession;
use enroll_core::services::SessionStore;
use enroll_shared::{StorageConfig, StoreKind};

use crate::InfrastructureError;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
#[cfg(feature = "redis-store")]
pub use redis_store::{RedisSessionStore, SESSION_TTL_SECONDS};

/// Store selected by configuration
pub enum SessionBackend {
    Memory(MemorySessionStore),
    File(FileSessionStore),
    #[cfg(feature = "redis-store")]
    Redis(RedisSessionStore),
}

impl SessionBackend {
    pub fn kind(&self) -> StoreKind {
        match self {
            SessionBackend::Memory(_) => StoreKind::Memory,
            SessionBackend::File(_) => StoreKind::File,
            #[cfg(feature = "redis-store")]
            SessionBackend::Redis(_) => StoreKind::Redis,
        }
    }
}

/// Open the session store described by `config`
pub async fn open_session_store(
    config: &StorageConfig,
) -> Result<SessionBackend, InfrastructureError> {
    let backend = match config.kind {
        StoreKind::Memory => SessionBackend::Memory(MemorySessionStore::new()),
        StoreKind::File => SessionBackend::File(FileSessionStore::new(&config.dir)),
        #[cfg(feature = "redis-store")]
        StoreKind::Redis => SessionBackend::Redis(
            RedisSessionStore::connect(&config.redis_url, config.key_prefix.clone()).await?,
        ),
        #[cfg(not(feature = "redis-store"))]
        StoreKind::Redis => {
            return Err(InfrastructureError::Config(
                "Redis session store requires the `redis-store` feature".to_string(),
            ))
        }
    };

    info!(kind = ?backend.kind(), "Session store opened");
    Ok(backend)
}

#[async_trait]
impl SessionStore for SessionBackend {
    async fn load(&self, key: &str) -> Result<Option<VerificationSession>, String> {
        match self {
            SessionBackend::Memory(store) => store.load(key).await,
            SessionBackend::File(store) => store.load(key).await,
            #[cfg(feature = "redis-store")]
            SessionBackend::Redis(store) => store.load(key).await,
        }
    }

    async fn save(&self, key: &str, session: &VerificationSession) -> Result<(), String> {
        match self {
            SessionBackend::Memory(store) => store.save(key, session).await,
            SessionBackend::File(store) => store.save(key, session).await,
            #[cfg(feature = "redis-store")]
            SessionBackend::Redis(store) => store.save(key, session).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        match self {
            SessionBackend::Memory(store) => store.delete(key).await,
            SessionBackend::File(store) => store.delete(key).await,
            #[cfg(feature = "redis-store")]
            SessionBackend::Redis(store) => store.delete(key).await,
        }
    }
}
