//! JSON file session store
//!
//! One file per key, named after the SHA-256 of the key so addresses never
//! reach the filesystem. Writes go to a temporary file that is renamed into
//! place, so a crash never leaves a half-written record behind.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use enroll_core::domain::VerificationSession;
use enroll_core::services::SessionStore;

use crate::InfrastructureError;

/// Sessions persisted as JSON files in a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// The directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a key is stored in
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    async fn read(&self, key: &str) -> Result<Option<VerificationSession>, InfrastructureError> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // Unreadable records are treated as absent and replaced on next save
                warn!(path = %path.display(), error = %e, "Discarding corrupt session file");
                Ok(None)
            }
        }
    }

    async fn write(
        &self,
        key: &str,
        session: &VerificationSession,
    ) -> Result<(), InfrastructureError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_vec_pretty(session)?;

        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "Session file written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), InfrastructureError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, key: &str) -> Result<Option<VerificationSession>, String> {
        self.read(key).await.map_err(|e| e.to_string())
    }

    async fn save(&self, key: &str, session: &VerificationSession) -> Result<(), String> {
        self.write(key, session).await.map_err(|e| e.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.remove(key).await.map_err(|e| e.to_string())
    }
}
