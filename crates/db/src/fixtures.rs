//! Deterministic listing dataset used by the CLI seed command and the
//! repository tests. Property ids are stable so conversations and tests can
//! refer to specific rows.

use estately_core::domain::property::Property;

use crate::repositories::RepositoryError;
use crate::DbPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedSummary {
    pub properties: usize,
}

pub fn sample_properties() -> Vec<Property> {
    fn listing(
        property_id: &str,
        title: &str,
        location: &str,
        num_rooms: u32,
        property_size_sqft: u32,
        price: i64,
        certificates: Option<&str>,
    ) -> Property {
        Property {
            property_id: property_id.to_string(),
            title_short_description: Some(title.to_string()),
            location: location.to_string(),
            num_rooms,
            property_size_sqft,
            price,
            certificates: certificates.map(str::to_string),
        }
    }

    vec![
        listing(
            "PROP-001",
            "Compact 1BHK near Andheri station",
            "Mumbai",
            1,
            550,
            3_200_000,
            Some("fire-safety.pdf"),
        ),
        listing(
            "PROP-002",
            "Bright 2BHK with lake view",
            "Mumbai",
            2,
            920,
            4_650_000,
            Some("fire-safety.pdf|occupancy-certificate.pdf"),
        ),
        listing(
            "PROP-003",
            "Renovated 2BHK in Bandra West",
            "Mumbai",
            2,
            980,
            4_950_000,
            None,
        ),
        listing(
            "PROP-004",
            "Sea-facing 3BHK in Worli",
            "Mumbai",
            3,
            1_450,
            18_500_000,
            Some("green-building.pdf|structural-stability.pdf"),
        ),
        listing(
            "PROP-005",
            "Garden-level 2BHK in Indiranagar",
            "Bangalore",
            2,
            1_050,
            6_800_000,
            Some("occupancy-certificate.pdf"),
        ),
        listing(
            "PROP-006",
            "Spacious 3BHK in Whitefield",
            "Bangalore",
            3,
            1_480,
            9_600_000,
            Some("green-building.pdf|fire-safety.pdf"),
        ),
        listing(
            "PROP-007",
            "Corner 3BHK near Koramangala park",
            "Bangalore",
            3,
            1_520,
            11_400_000,
            None,
        ),
        listing(
            "PROP-008",
            "Top-floor 4BHK penthouse",
            "Bangalore",
            4,
            2_200,
            21_000_000,
            Some("structural-stability.pdf"),
        ),
        listing(
            "PROP-009",
            "Budget 1BHK near Hinjewadi IT park",
            "Pune",
            1,
            520,
            2_600_000,
            None,
        ),
        listing(
            "PROP-010",
            "Family 2BHK in Kothrud",
            "Pune",
            2,
            880,
            4_100_000,
            Some("fire-safety.pdf"),
        ),
        listing(
            "PROP-011",
            "Airy 3BHK near Baner hills",
            "Pune",
            3,
            1_350,
            8_200_000,
            Some("occupancy-certificate.pdf|pest-control.pdf"),
        ),
        listing(
            "PROP-012",
            "Compact 2BHK in Dwarka",
            "Delhi",
            2,
            860,
            5_300_000,
            None,
        ),
        listing(
            "PROP-013",
            "Builder-floor 3BHK in Saket",
            "Delhi",
            3,
            1_400,
            13_200_000,
            Some("fire-safety.pdf"),
        ),
        listing(
            "PROP-014",
            "Independent 4BHK in Vasant Kunj",
            "Delhi",
            4,
            2_050,
            24_500_000,
            Some("green-building.pdf|occupancy-certificate.pdf"),
        ),
    ]
}

/// Idempotent: re-running replaces rows by primary key instead of
/// duplicating them.
pub async fn seed_listings(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let properties = sample_properties();

    for property in &properties {
        sqlx::query(
            "INSERT INTO properties (
                property_id,
                title_short_description,
                location,
                num_rooms,
                property_size_sqft,
                price,
                certificates
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(property_id) DO UPDATE SET
                title_short_description = excluded.title_short_description,
                location = excluded.location,
                num_rooms = excluded.num_rooms,
                property_size_sqft = excluded.property_size_sqft,
                price = excluded.price,
                certificates = excluded.certificates",
        )
        .bind(&property.property_id)
        .bind(property.title_short_description.as_deref())
        .bind(&property.location)
        .bind(i64::from(property.num_rooms))
        .bind(i64::from(property.property_size_sqft))
        .bind(property.price)
        .bind(property.certificates.as_deref())
        .execute(pool)
        .await?;
    }

    Ok(SeedSummary { properties: properties.len() })
}
