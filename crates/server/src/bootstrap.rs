use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use estately_agents::{
    default_registry, Classifier, CompletionClient, CompletionError, Dispatcher, ResearchError,
    WebSearcher,
};
use estately_agents::llm::HttpCompletionClient;
use estately_agents::research::TavilySearcher;
use estately_core::config::{AppConfig, ConfigError, LoadOptions};
use estately_db::repositories::{
    PreferenceRepository, PropertyRepository, SqlPreferenceRepository, SqlPropertyRepository,
};
use estately_db::{connect_with_settings, migrations, DbPool};
use estately_memory::{connect_session_store, SessionStore};

use crate::sessions::SessionRegistry;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub session_store: Arc<dyn SessionStore>,
    pub sessions: Arc<SessionRegistry>,
}

/// Shared handler state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub session_store: Arc<dyn SessionStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl Application {
    pub fn state(&self) -> AppState {
        AppState {
            db_pool: self.db_pool.clone(),
            session_store: self.session_store.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("completion client setup failed: {0}")]
    Llm(#[source] CompletionError),
    #[error("web search client setup failed: {0}")]
    WebSearch(#[source] ResearchError),
    #[error("report template failed to compile: {0}")]
    Template(#[source] tera::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let session_store = connect_session_store(&config.redis).await;

    let completions: Arc<dyn CompletionClient> =
        Arc::new(HttpCompletionClient::new(&config.llm).map_err(BootstrapError::Llm)?);
    let searcher: Arc<dyn WebSearcher> =
        Arc::new(TavilySearcher::new(&config.web_search).map_err(BootstrapError::WebSearch)?);
    let properties: Arc<dyn PropertyRepository> =
        Arc::new(SqlPropertyRepository::new(db_pool.clone()));
    let preferences: Arc<dyn PreferenceRepository> =
        Arc::new(SqlPreferenceRepository::new(db_pool.clone()));

    let registry = default_registry(properties, completions.clone(), searcher, &config.llm)
        .map_err(BootstrapError::Template)?;
    let sessions = Arc::new(SessionRegistry::new(
        Arc::new(Classifier::new(completions, &config.llm)),
        Arc::new(Dispatcher::new(registry)),
        session_store.clone(),
        preferences,
        config.server.session_capacity,
    ));

    info!(
        event_name = "system.bootstrap.ready",
        session_backend = session_store.backend_name(),
        session_capacity = sessions.capacity(),
        "application bootstrap complete"
    );

    Ok(Application { config, db_pool, session_store, sessions })
}
