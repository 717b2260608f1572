use std::collections::HashMap;

use tokio::sync::RwLock;

use estately_core::domain::property::{Property, PropertyFilters};

use super::{
    PreferenceRepository, PropertyRepository, RepositoryError, SEARCH_RESULT_LIMIT,
};

/// Listing store backed by a plain vector. Mirrors the SQL repository's
/// filter semantics so tests and the in-process fallback agree with it.
#[derive(Default)]
pub struct InMemoryPropertyRepository {
    properties: RwLock<Vec<Property>>,
}

impl InMemoryPropertyRepository {
    pub fn with_listings(properties: Vec<Property>) -> Self {
        Self { properties: RwLock::new(properties) }
    }
}

#[async_trait::async_trait]
impl PropertyRepository for InMemoryPropertyRepository {
    async fn search(&self, filters: &PropertyFilters) -> Result<Vec<Property>, RepositoryError> {
        let properties = self.properties.read().await;

        let mut matched: Vec<Property> = properties
            .iter()
            .filter(|property| matches_filters(property, filters))
            .cloned()
            .collect();
        matched.sort_by_key(|property| property.price);
        matched.truncate(SEARCH_RESULT_LIMIT as usize);

        Ok(matched)
    }
}

fn matches_filters(property: &Property, filters: &PropertyFilters) -> bool {
    if let Some(location) = &filters.location {
        if !property.location.to_lowercase().contains(&location.to_lowercase()) {
            return false;
        }
    }
    if let Some(num_rooms) = filters.num_rooms {
        if property.num_rooms != num_rooms {
            return false;
        }
    }
    if let Some(max_price) = filters.max_price {
        if property.price > max_price {
            return false;
        }
    }
    if let Some(min_price) = filters.min_price {
        if property.price < min_price {
            return false;
        }
    }
    if let Some(min_size_sqft) = filters.min_size_sqft {
        if property.property_size_sqft < min_size_sqft {
            return false;
        }
    }
    true
}

#[derive(Default)]
pub struct InMemoryPreferenceRepository {
    entries: RwLock<HashMap<String, Vec<(String, String)>>>,
}

#[async_trait::async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn save(&self, user_id: &str, key: &str, value: &str) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let user_entries = entries.entry(user_id.to_string()).or_default();

        match user_entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => user_entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(user_id).and_then(|user_entries| {
            user_entries.iter().find(|(existing, _)| existing == key).map(|(_, v)| v.clone())
        }))
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<(String, String)>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut user_entries = entries.get(user_id).cloned().unwrap_or_default();
        user_entries.sort();
        Ok(user_entries)
    }
}
