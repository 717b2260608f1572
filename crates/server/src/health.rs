use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use estately_db::DbPool;
use estately_memory::SessionStore;
use serde::Serialize;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub sessions: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let sessions = session_check(state.session_store.as_ref()).await;
    let ready = database.status == "ready" && sessions.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "estately-server runtime initialized".to_string(),
        },
        database,
        sessions,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn session_check(store: &dyn SessionStore) -> HealthCheck {
    let backend = store.backend_name();
    match store.get("health:probe").await {
        Ok(_) => HealthCheck {
            status: "ready",
            detail: format!("session backend `{backend}` responded"),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("session backend `{backend}` probe failed: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};

    use estately_agents::{
        Classifier, CompletionClient, CompletionError, CompletionRequest, Dispatcher,
        HandlerRegistry,
    };
    use estately_core::config::LlmConfig;
    use estately_db::connect_with_settings;
    use estately_db::repositories::InMemoryPreferenceRepository;
    use estately_memory::{InProcessSessionStore, SessionStore};

    use super::health;
    use crate::bootstrap::AppState;
    use crate::sessions::SessionRegistry;

    struct SilentClient;

    #[async_trait]
    impl CompletionClient for SilentClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Err(CompletionError::NotConfigured("test client".to_string()))
        }
    }

    async fn state() -> AppState {
        let config = LlmConfig {
            api_key: Some("hf-test".to_string().into()),
            base_url: "https://router.huggingface.co/v1".to_string(),
            model: "meta-llama/Llama-3.2-3B-Instruct:novita".to_string(),
            max_tokens: 200,
            temperature: 0.1,
            timeout_secs: 30,
        };
        let session_store: Arc<dyn SessionStore> = Arc::new(InProcessSessionStore::default());
        let sessions = Arc::new(SessionRegistry::new(
            Arc::new(Classifier::new(Arc::new(SilentClient), &config)),
            Arc::new(Dispatcher::new(HandlerRegistry::default())),
            session_store.clone(),
            Arc::new(InMemoryPreferenceRepository::default()),
            8,
        ));
        let db_pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        AppState { db_pool, session_store, sessions }
    }

    #[tokio::test]
    async fn health_returns_ready_when_all_checks_pass() {
        let state = state().await;
        let pool = state.db_pool.clone();

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.sessions.status, "ready");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let state = state().await;
        state.db_pool.close().await;

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.sessions.status, "ready");
    }
}
