use async_trait::async_trait;
use thiserror::Error;

use estately_core::domain::property::{Property, PropertyFilters};

pub mod memory;
pub mod preference;
pub mod property;

pub use memory::{InMemoryPreferenceRepository, InMemoryPropertyRepository};
pub use preference::SqlPreferenceRepository;
pub use property::SqlPropertyRepository;

/// Result rows returned by a property search are capped at this many
/// listings, cheapest first.
pub const SEARCH_RESULT_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Applies every present filter; absent filters impose no constraint.
    async fn search(&self, filters: &PropertyFilters) -> Result<Vec<Property>, RepositoryError>;
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn save(&self, user_id: &str, key: &str, value: &str) -> Result<(), RepositoryError>;
    async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn get_all(&self, user_id: &str) -> Result<Vec<(String, String)>, RepositoryError>;
}
