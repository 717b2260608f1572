//! Three-region memory for the assistant: an episodic in-process
//! conversation log, a TTL-bound session store (redis with an in-process
//! fallback), and durable per-user preferences in sqlite.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use estately_core::config::RedisConfig;
use estately_core::domain::turn::{ConversationTurn, Role};
use estately_db::repositories::{PreferenceRepository, RepositoryError};

pub mod episodic;
pub mod redis_store;
pub mod session;

pub use episodic::EpisodicLog;
pub use redis_store::RedisSessionStore;
pub use session::{InProcessSessionStore, SessionError, SessionStore};

pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("preference store error: {0}")]
    Preferences(#[from] RepositoryError),
    #[error("session value codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Picks the session backend once at startup. A failed probe degrades to
/// the in-process store; the chosen backend is then fixed for the process
/// lifetime.
pub async fn connect_session_store(config: &RedisConfig) -> Arc<dyn SessionStore> {
    if !config.enabled {
        info!(
            event_name = "memory.session.backend_selected",
            backend = "in-process",
            "redis disabled by configuration, using in-process session store"
        );
        return Arc::new(InProcessSessionStore::default());
    }

    match RedisSessionStore::connect(&config.url).await {
        Ok(store) => {
            info!(
                event_name = "memory.session.backend_selected",
                backend = "redis",
                "session store connected to redis"
            );
            Arc::new(store)
        }
        Err(error) => {
            warn!(
                event_name = "memory.session.backend_fallback",
                error = %error,
                "redis probe failed, falling back to in-process session store"
            );
            Arc::new(InProcessSessionStore::default())
        }
    }
}

/// Per-user memory facade handed to intent handlers. All session keys are
/// namespaced `session:{user_id}:{key}` so one user's state never leaks
/// into another's.
pub struct Memory {
    user_id: String,
    episodic: EpisodicLog,
    sessions: Arc<dyn SessionStore>,
    preferences: Arc<dyn PreferenceRepository>,
    session_ttl_secs: u64,
}

impl Memory {
    pub fn new(
        user_id: impl Into<String>,
        sessions: Arc<dyn SessionStore>,
        preferences: Arc<dyn PreferenceRepository>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            episodic: EpisodicLog::default(),
            sessions,
            preferences,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_backend(&self) -> &'static str {
        self.sessions.backend_name()
    }

    pub async fn add_turn(&self, role: Role, content: impl Into<String>) {
        self.episodic.append(role, content).await;
    }

    pub async fn recent_turns(&self, limit: Option<usize>) -> Vec<ConversationTurn> {
        self.episodic.recent(limit).await
    }

    pub async fn set_session<T: Serialize>(&self, key: &str, value: &T) -> Result<(), MemoryError> {
        let encoded = serde_json::to_string(value)?;
        self.sessions.set(&self.session_key(key), &encoded, self.session_ttl_secs).await?;
        Ok(())
    }

    pub async fn get_session<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, MemoryError> {
        let raw = self.sessions.get(&self.session_key(key)).await?;
        raw.map(|encoded| serde_json::from_str(&encoded)).transpose().map_err(MemoryError::from)
    }

    pub async fn clear_session(&self) -> Result<usize, MemoryError> {
        let dropped = self.sessions.delete_prefix(&format!("session:{}:", self.user_id)).await?;
        Ok(dropped)
    }

    pub async fn save_preference(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        self.preferences.save(&self.user_id, key, value).await?;
        Ok(())
    }

    pub async fn preference(&self, key: &str) -> Result<Option<String>, MemoryError> {
        Ok(self.preferences.get(&self.user_id, key).await?)
    }

    pub async fn preferences(&self) -> Result<Vec<(String, String)>, MemoryError> {
        Ok(self.preferences.get_all(&self.user_id).await?)
    }

    fn session_key(&self, key: &str) -> String {
        format!("session:{}:{}", self.user_id, key)
    }
}
