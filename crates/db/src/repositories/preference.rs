use chrono::Utc;
use sqlx::Row;

use super::{PreferenceRepository, RepositoryError};
use crate::DbPool;

/// Long-lived per-user key/value store. One row per (user, key); saving an
/// existing key overwrites the value and refreshes `updated_at` only.
pub struct SqlPreferenceRepository {
    pool: DbPool,
}

impl SqlPreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferenceRepository for SqlPreferenceRepository {
    async fn save(&self, user_id: &str, key: &str, value: &str) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO user_memory (user_id, memory_key, memory_value, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, memory_key) DO UPDATE SET
                memory_value = excluded.memory_value,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query(
            "SELECT memory_value FROM user_memory WHERE user_id = ? AND memory_key = ?",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get::<String, _>("memory_value")))
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<(String, String)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT memory_key, memory_value
             FROM user_memory
             WHERE user_id = ?
             ORDER BY memory_key ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("memory_key"), row.get::<String, _>("memory_value")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::SqlPreferenceRepository;
    use crate::repositories::PreferenceRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let pool = setup_pool().await;
        let repo = SqlPreferenceRepository::new(pool.clone());

        repo.save("user-1", "preferred_location", "Mumbai").await.expect("save");

        let value = repo.get("user-1", "preferred_location").await.expect("get");
        assert_eq!(value.as_deref(), Some("Mumbai"));

        let missing = repo.get("user-1", "budget").await.expect("get missing");
        assert!(missing.is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn saving_twice_overwrites_without_duplicating() {
        let pool = setup_pool().await;
        let repo = SqlPreferenceRepository::new(pool.clone());

        repo.save("user-1", "budget", "5000000").await.expect("first save");
        repo.save("user-1", "budget", "7500000").await.expect("second save");

        let all = repo.get_all("user-1").await.expect("get all");
        assert_eq!(all, vec![("budget".to_string(), "7500000".to_string())]);

        pool.close().await;
    }

    #[tokio::test]
    async fn preferences_are_scoped_per_user() {
        let pool = setup_pool().await;
        let repo = SqlPreferenceRepository::new(pool.clone());

        repo.save("user-1", "preferred_rooms", "2").await.expect("save user-1");
        repo.save("user-2", "preferred_rooms", "3").await.expect("save user-2");

        let first = repo.get("user-1", "preferred_rooms").await.expect("get user-1");
        let second = repo.get("user-2", "preferred_rooms").await.expect("get user-2");
        assert_eq!(first.as_deref(), Some("2"));
        assert_eq!(second.as_deref(), Some("3"));

        pool.close().await;
    }
}
