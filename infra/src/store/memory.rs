//! In-memory session store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use enroll_core::domain::VerificationSession;
use enroll_core::services::SessionStore;

/// Sessions held in process memory; lost on exit
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, VerificationSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<VerificationSession>, String> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, session: &VerificationSession) -> Result<(), String> {
        self.sessions
            .write()
            .await
            .insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.sessions.write().await.remove(key);
        Ok(())
    }
}
