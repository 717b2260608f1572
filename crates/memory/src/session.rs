use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Backend(String),
    #[error("session value is not valid JSON: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Short-term key/value store with per-entry TTL. Keys are full session
/// keys, already namespaced by the caller.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), SessionError>;
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    /// Removes every key starting with `prefix` and reports how many
    /// entries were dropped.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, SessionError>;
    fn backend_name(&self) -> &'static str;
}

/// Fallback store used when redis is disabled or unreachable at startup.
/// Expiry is enforced lazily on read.
#[derive(Default)]
pub struct InProcessSessionStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

#[async_trait]
impl SessionStore for InProcessSessionStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), SessionError> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs.max(1));
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, SessionError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }

    fn backend_name(&self) -> &'static str {
        "in-process"
    }
}
