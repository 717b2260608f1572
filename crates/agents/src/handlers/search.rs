use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;

use estately_core::domain::property::{Property, PropertyFilters};
use estately_core::domain::task::TaskParams;
use estately_db::repositories::PropertyRepository;
use estately_memory::Memory;

use super::{format_rupees, HandlerError, IntentHandler};

/// Session key holding the most recent search's full result set, consumed
/// by the report handler on a later turn.
pub const LAST_SEARCH_RESULTS_KEY: &str = "last_search_results";

pub struct SearchHandler {
    properties: Arc<dyn PropertyRepository>,
}

impl SearchHandler {
    pub fn new(properties: Arc<dyn PropertyRepository>) -> Self {
        Self { properties }
    }
}

#[async_trait]
impl IntentHandler for SearchHandler {
    async fn execute(
        &self,
        params: &TaskParams,
        memory: &Memory,
        _user_input: &str,
    ) -> Result<String, HandlerError> {
        let filters = PropertyFilters::from(params);
        let listings = self.properties.search(&filters).await?;

        if listings.is_empty() {
            return Ok(format!(
                "No properties found matching your criteria: {}",
                describe_criteria(params)
            ));
        }

        let mut response = format!("Found {} properties:\n\n", listings.len());
        for property in listings.iter().take(10) {
            let _ = writeln!(
                response,
                "- {}: {} - {} BHK, {} sqft - {}",
                property.property_id,
                property.location,
                property.num_rooms,
                property.property_size_sqft,
                format_rupees(property.price),
            );
        }
        if listings.len() > 10 {
            let _ = write!(response, "\n... and {} more properties", listings.len() - 10);
        }

        // The full set, not just ids, so the report can render offline.
        memory.set_session::<Vec<Property>>(LAST_SEARCH_RESULTS_KEY, &listings).await?;

        Ok(response)
    }
}

fn describe_criteria(params: &TaskParams) -> String {
    let mut parts = Vec::new();
    if let Some(location) = &params.location {
        parts.push(format!("location={location}"));
    }
    if let Some(num_rooms) = params.num_rooms {
        parts.push(format!("num_rooms={num_rooms}"));
    }
    if let Some(max_price) = params.max_price {
        parts.push(format!("max_price={max_price}"));
    }
    if let Some(property_size_sqft) = params.property_size_sqft {
        parts.push(format!("property_size_sqft={property_size_sqft}"));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use estately_core::domain::property::Property;
    use estately_core::domain::task::TaskParams;
    use estately_db::fixtures::sample_properties;
    use estately_db::repositories::{InMemoryPreferenceRepository, InMemoryPropertyRepository};
    use estately_memory::{InProcessSessionStore, Memory};

    use super::{SearchHandler, LAST_SEARCH_RESULTS_KEY};
    use crate::handlers::IntentHandler;

    fn memory() -> Memory {
        Memory::new(
            "u1",
            Arc::new(InProcessSessionStore::default()),
            Arc::new(InMemoryPreferenceRepository::default()),
        )
    }

    #[tokio::test]
    async fn matches_are_listed_and_cached_in_session() {
        let handler = SearchHandler::new(Arc::new(InMemoryPropertyRepository::with_listings(
            sample_properties(),
        )));
        let memory = memory();

        let params = TaskParams {
            location: Some("Mumbai".to_string()),
            num_rooms: Some(2),
            max_price: Some(5_000_000),
            ..TaskParams::default()
        };
        let response = handler.execute(&params, &memory, "").await.expect("execute");

        assert!(response.starts_with("Found 2 properties:\n\n"));
        assert!(response.contains("- PROP-002: Mumbai - 2 BHK, 920 sqft - Rs.4,650,000"));
        assert!(response.contains("- PROP-003: Mumbai - 2 BHK, 980 sqft - Rs.4,950,000"));

        let cached: Option<Vec<Property>> =
            memory.get_session(LAST_SEARCH_RESULTS_KEY).await.expect("session read");
        let cached = cached.expect("results should be cached");
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].property_id, "PROP-002");
    }

    #[tokio::test]
    async fn no_matches_reports_the_criteria_and_caches_nothing() {
        let handler = SearchHandler::new(Arc::new(InMemoryPropertyRepository::with_listings(
            sample_properties(),
        )));
        let memory = memory();

        let params = TaskParams {
            location: Some("Atlantis".to_string()),
            num_rooms: Some(7),
            ..TaskParams::default()
        };
        let response = handler.execute(&params, &memory, "").await.expect("execute");

        assert_eq!(
            response,
            "No properties found matching your criteria: location=Atlantis, num_rooms=7"
        );
        let cached: Option<Vec<Property>> =
            memory.get_session(LAST_SEARCH_RESULTS_KEY).await.expect("session read");
        assert!(cached.is_none());
    }
}
