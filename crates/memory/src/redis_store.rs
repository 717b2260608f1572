use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::session::{SessionError, SessionStore};

/// Redis-backed session store. TTL expiry is handled by redis itself via
/// SETEX; once the construction-time probe has passed, later connection
/// failures surface as errors instead of silently degrading.
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    /// Opens a client and verifies the server answers a PING. Used as the
    /// startup probe that decides between redis and the in-process store.
    pub async fn connect(redis_url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(redis_url)
            .map_err(|error| SessionError::Backend(format!("invalid redis url: {error}")))?;

        let store = Self { client };
        let mut conn = store.connection().await?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|error| SessionError::Backend(format!("redis PING failed: {error}")))?;

        Ok(store)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, SessionError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| SessionError::Backend(format!("redis connection failed: {error}")))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs.max(1))
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|error| SessionError::Backend(format!("redis SETEX failed: {error}")))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|error| SessionError::Backend(format!("redis GET failed: {error}")))
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, SessionError> {
        let mut conn = self.connection().await?;
        let pattern = format!("{prefix}*");

        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await
            .map_err(|error| SessionError::Backend(format!("redis KEYS failed: {error}")))?;

        if keys.is_empty() {
            return Ok(0);
        }

        let mut del = redis::cmd("DEL");
        for key in &keys {
            del.arg(key);
        }
        let deleted: i64 = del
            .query_async(&mut conn)
            .await
            .map_err(|error| SessionError::Backend(format!("redis DEL failed: {error}")))?;

        Ok(usize::try_from(deleted).unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
