//! Redis session store
//!
//! Sessions are stored as JSON strings under the session key (optionally
//! prefixed). Operations share one multiplexed connection and are retried
//! with exponential backoff on transient errors.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError, RedisResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use enroll_core::domain::VerificationSession;
use enroll_core::services::SessionStore;

use crate::InfrastructureError;

/// Housekeeping expiry for abandoned sessions (24 hours)
pub const SESSION_TTL_SECONDS: u64 = 86_400;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 100;
const MAX_RETRY_DELAY_MS: u64 = 5_000;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Sessions persisted in Redis
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: MultiplexedConnection,
    key_prefix: Option<String>,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl RedisSessionStore {
    /// Connect to Redis at `url`
    ///
    /// # Arguments
    /// * `url` - `redis://` or `rediss://` connection URL
    /// * `key_prefix` - Namespace prepended as `<prefix>:<key>`
    pub async fn connect(
        url: &str,
        key_prefix: Option<String>,
    ) -> Result<Self, InfrastructureError> {
        Self::connect_with_retry_config(url, key_prefix, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS)
            .await
    }

    /// Connect with custom retry configuration
    pub async fn connect_with_retry_config(
        url: &str,
        key_prefix: Option<String>,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, InfrastructureError> {
        info!(url = %mask_url(url), "Connecting to Redis session store");

        let client = Client::open(url).map_err(|e| {
            error!(error = %e, "Failed to parse Redis URL");
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(client, max_retries, retry_delay_ms)
            .await?;

        Ok(Self {
            connection,
            key_prefix,
            max_retries: max_retries.max(1),
            retry_delay_ms,
        })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        attempt = attempts,
                        max_retries = max_retries,
                        error = %e,
                        "Redis connection failed, retrying in {}ms",
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    error!(attempts = attempts, error = %e, "Could not connect to Redis");
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Redis key for a session key
    pub fn redis_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn execute_with_retry<F, T>(&self, operation: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            match operation(self.connection.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) if attempts < self.max_retries && is_retriable_error(&e) => {
                    warn!(
                        attempt = attempts,
                        max_retries = self.max_retries,
                        error = %e,
                        "Redis operation failed, retrying in {}ms",
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, key: &str) -> Result<Option<VerificationSession>, String> {
        let redis_key = self.redis_key(key);
        let raw = self
            .execute_with_retry(|mut conn| {
                let redis_key = redis_key.clone();
                Box::pin(async move { conn.get::<_, Option<String>>(redis_key).await })
            })
            .await
            .map_err(|e| format!("Failed to load session: {}", e))?;

        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt session record");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, session: &VerificationSession) -> Result<(), String> {
        let redis_key = self.redis_key(key);
        let raw = serde_json::to_string(session)
            .map_err(|e| format!("Failed to serialize session: {}", e))?;

        self.execute_with_retry(|mut conn| {
            let redis_key = redis_key.clone();
            let raw = raw.clone();
            Box::pin(async move {
                conn.set_ex::<_, _, ()>(redis_key, raw, SESSION_TTL_SECONDS)
                    .await
            })
        })
        .await
        .map_err(|e| format!("Failed to save session: {}", e))?;

        debug!("Session saved to Redis");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        let redis_key = self.redis_key(key);
        self.execute_with_retry(|mut conn| {
            let redis_key = redis_key.clone();
            Box::pin(async move { conn.del::<_, u32>(redis_key).await })
        })
        .await
        .map(|_| ())
        .map_err(|e| format!("Failed to delete session: {}", e))
    }
}

/// Transient errors worth retrying
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Mask credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let (Some(at_pos), Some(proto_end)) = (url.find('@'), url.find("://")) {
        return format!("{}****{}", &url[..proto_end + 3], &url[at_pos..]);
    }
    url.to_string()
}
