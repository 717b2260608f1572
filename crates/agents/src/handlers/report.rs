use std::sync::Arc;

use async_trait::async_trait;
use tera::Tera;

use estately_core::domain::property::Property;
use estately_core::domain::task::TaskParams;
use estately_memory::Memory;

use super::search::LAST_SEARCH_RESULTS_KEY;
use super::{format_rupees, HandlerError, IntentHandler};

const TEMPLATE_NAME: &str = "comparison_report.txt";

const TEMPLATE: &str = "\
Property Comparison Report
==========================
Listings compared: {{ listings | length }}

{% for listing in listings -%}
- {{ listing.property_id }}: {{ listing.location }} | {{ listing.num_rooms }} BHK | {{ listing.size_sqft }} sqft | {{ listing.price }}
{% endfor %}
Price range: {{ min_price }} to {{ max_price }}
Largest: {{ largest_id }} ({{ largest_sqft }} sqft)
Cheapest: {{ cheapest_id }} ({{ cheapest_price }})
";

/// Renders a comparison over an already-retrieved result set. Seam for
/// swapping in richer output formats later.
pub trait ReportBuilder: Send + Sync {
    fn build(&self, properties: &[Property]) -> Result<String, HandlerError>;
}

pub struct TeraReportBuilder {
    tera: Tera,
}

impl TeraReportBuilder {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { tera })
    }
}

impl ReportBuilder for TeraReportBuilder {
    fn build(&self, properties: &[Property]) -> Result<String, HandlerError> {
        let listings: Vec<serde_json::Value> = properties
            .iter()
            .map(|property| {
                serde_json::json!({
                    "property_id": property.property_id,
                    "location": property.location,
                    "num_rooms": property.num_rooms,
                    "size_sqft": property.property_size_sqft,
                    "price": format_rupees(property.price),
                })
            })
            .collect();

        let cheapest = properties.iter().min_by_key(|property| property.price);
        let priciest = properties.iter().max_by_key(|property| property.price);
        let largest = properties.iter().max_by_key(|property| property.property_size_sqft);

        let mut context = tera::Context::new();
        context.insert("listings", &listings);
        context.insert(
            "min_price",
            &cheapest.map(|property| format_rupees(property.price)).unwrap_or_default(),
        );
        context.insert(
            "max_price",
            &priciest.map(|property| format_rupees(property.price)).unwrap_or_default(),
        );
        context.insert(
            "largest_id",
            &largest.map(|property| property.property_id.clone()).unwrap_or_default(),
        );
        context
            .insert("largest_sqft", &largest.map(|property| property.property_size_sqft));
        context.insert(
            "cheapest_id",
            &cheapest.map(|property| property.property_id.clone()).unwrap_or_default(),
        );
        context.insert(
            "cheapest_price",
            &cheapest.map(|property| format_rupees(property.price)).unwrap_or_default(),
        );

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

pub struct ReportHandler {
    builder: Arc<dyn ReportBuilder>,
}

impl ReportHandler {
    pub fn new(builder: Arc<dyn ReportBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl IntentHandler for ReportHandler {
    async fn execute(
        &self,
        _params: &TaskParams,
        memory: &Memory,
        _user_input: &str,
    ) -> Result<String, HandlerError> {
        let cached: Option<Vec<Property>> = memory.get_session(LAST_SEARCH_RESULTS_KEY).await?;

        let mut properties = match cached {
            Some(properties) if !properties.is_empty() => properties,
            _ => {
                return Ok(
                    "No recent property searches found. Please search for properties first."
                        .to_string(),
                )
            }
        };
        properties.truncate(10);

        self.builder.build(&properties)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use estately_core::domain::property::Property;
    use estately_core::domain::task::TaskParams;
    use estately_db::fixtures::sample_properties;
    use estately_db::repositories::InMemoryPreferenceRepository;
    use estately_memory::{InProcessSessionStore, Memory};

    use super::{ReportBuilder, ReportHandler, TeraReportBuilder, LAST_SEARCH_RESULTS_KEY};
    use crate::handlers::IntentHandler;

    fn memory() -> Memory {
        Memory::new(
            "u1",
            Arc::new(InProcessSessionStore::default()),
            Arc::new(InMemoryPreferenceRepository::default()),
        )
    }

    fn handler() -> ReportHandler {
        ReportHandler::new(Arc::new(TeraReportBuilder::new().expect("template")))
    }

    #[tokio::test]
    async fn report_requires_a_prior_search() {
        let response =
            handler().execute(&TaskParams::default(), &memory(), "").await.expect("execute");

        assert_eq!(
            response,
            "No recent property searches found. Please search for properties first."
        );
    }

    #[tokio::test]
    async fn report_renders_the_cached_result_set() {
        let memory = memory();
        let cached: Vec<Property> = sample_properties().into_iter().take(3).collect();
        memory.set_session(LAST_SEARCH_RESULTS_KEY, &cached).await.expect("seed session");

        let response =
            handler().execute(&TaskParams::default(), &memory, "").await.expect("execute");

        assert!(response.contains("Listings compared: 3"));
        assert!(response.contains("- PROP-001: Mumbai | 1 BHK | 550 sqft | Rs.3,200,000"));
        assert!(response.contains("Price range: Rs.3,200,000 to Rs.4,950,000"));
        assert!(response.contains("Cheapest: PROP-001 (Rs.3,200,000)"));
    }

    #[tokio::test]
    async fn cached_set_is_truncated_to_ten_entries() {
        let memory = memory();
        let mut oversized = Vec::new();
        for index in 0..14 {
            let mut listing = sample_properties()[0].clone();
            listing.property_id = format!("PROP-X{index:02}");
            oversized.push(listing);
        }
        memory.set_session(LAST_SEARCH_RESULTS_KEY, &oversized).await.expect("seed session");

        let response =
            handler().execute(&TaskParams::default(), &memory, "").await.expect("execute");

        assert!(response.contains("Listings compared: 10"));
        assert!(!response.contains("PROP-X10"));
    }

    #[test]
    fn builder_handles_a_single_listing() {
        let builder = TeraReportBuilder::new().expect("template");
        let listing = sample_properties().remove(0);

        let report = builder.build(std::slice::from_ref(&listing)).expect("render");
        assert!(report.contains("Listings compared: 1"));
        assert!(report.contains("Largest: PROP-001 (550 sqft)"));
    }
}
