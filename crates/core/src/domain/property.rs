use serde::{Deserialize, Serialize};

use crate::domain::task::TaskParams;

/// One listing row. Serializable because the full search result set is
/// cached in session memory between turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: String,
    #[serde(default)]
    pub title_short_description: Option<String>,
    pub location: String,
    pub num_rooms: u32,
    pub property_size_sqft: u32,
    pub price: i64,
    /// Pipe-separated certificate document names, e.g.
    /// `green-building.pdf|fire-safety.pdf`.
    #[serde(default)]
    pub certificates: Option<String>,
}

impl Property {
    /// Certificate names cleaned for display: extension stripped, dashes
    /// replaced by spaces, each word capitalized.
    pub fn certificate_names(&self) -> Vec<String> {
        let Some(raw) = self.certificates.as_deref() else {
            return Vec::new();
        };
        raw.split('|')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| title_case(&entry.trim_end_matches(".pdf").replace('-', " ")))
            .collect()
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Filter set accepted by the structured search collaborator. Every present
/// filter must be applied; none may be silently ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyFilters {
    pub location: Option<String>,
    pub num_rooms: Option<u32>,
    pub max_price: Option<i64>,
    pub min_price: Option<i64>,
    pub min_size_sqft: Option<u32>,
}

impl From<&TaskParams> for PropertyFilters {
    fn from(params: &TaskParams) -> Self {
        Self {
            location: params.location.clone(),
            num_rooms: params.num_rooms,
            max_price: params.max_price,
            min_price: None,
            min_size_sqft: params.property_size_sqft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Property;

    fn listing(certificates: Option<&str>) -> Property {
        Property {
            property_id: "PROP-001".to_string(),
            title_short_description: Some("Bright 2BHK near the lake".to_string()),
            location: "Mumbai".to_string(),
            num_rooms: 2,
            property_size_sqft: 950,
            price: 4_800_000,
            certificates: certificates.map(str::to_string),
        }
    }

    #[test]
    fn certificate_names_are_cleaned_for_display() {
        let property = listing(Some("green-building.pdf|fire-safety.pdf"));
        assert_eq!(property.certificate_names(), vec!["Green Building", "Fire Safety"]);
    }

    #[test]
    fn missing_certificates_yield_no_names() {
        assert!(listing(None).certificate_names().is_empty());
        assert!(listing(Some("")).certificate_names().is_empty());
    }

    #[test]
    fn listings_round_trip_through_json() {
        let property = listing(Some("pest-control.pdf"));
        let encoded = serde_json::to_string(&property).expect("encode");
        let decoded: Property = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, property);
    }
}
