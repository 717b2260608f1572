use sqlx::{sqlite::SqliteRow, Row};

use estately_core::domain::property::{Property, PropertyFilters};

use super::{PropertyRepository, RepositoryError, SEARCH_RESULT_LIMIT};
use crate::DbPool;

pub struct SqlPropertyRepository {
    pool: DbPool,
}

impl SqlPropertyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PropertyRepository for SqlPropertyRepository {
    async fn search(&self, filters: &PropertyFilters) -> Result<Vec<Property>, RepositoryError> {
        let mut sql = String::from(
            "SELECT
                property_id,
                title_short_description,
                location,
                num_rooms,
                property_size_sqft,
                price,
                certificates
             FROM properties
             WHERE 1 = 1",
        );

        if filters.location.is_some() {
            sql.push_str(" AND lower(location) LIKE ?");
        }
        if filters.num_rooms.is_some() {
            sql.push_str(" AND num_rooms = ?");
        }
        if filters.max_price.is_some() {
            sql.push_str(" AND price <= ?");
        }
        if filters.min_price.is_some() {
            sql.push_str(" AND price >= ?");
        }
        if filters.min_size_sqft.is_some() {
            sql.push_str(" AND property_size_sqft >= ?");
        }
        sql.push_str(" ORDER BY price ASC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(location) = &filters.location {
            query = query.bind(format!("%{}%", location.to_lowercase()));
        }
        if let Some(num_rooms) = filters.num_rooms {
            query = query.bind(i64::from(num_rooms));
        }
        if let Some(max_price) = filters.max_price {
            query = query.bind(max_price);
        }
        if let Some(min_price) = filters.min_price {
            query = query.bind(min_price);
        }
        if let Some(min_size_sqft) = filters.min_size_sqft {
            query = query.bind(i64::from(min_size_sqft));
        }
        query = query.bind(i64::from(SEARCH_RESULT_LIMIT));

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(property_from_row).collect()
    }
}

fn property_from_row(row: SqliteRow) -> Result<Property, RepositoryError> {
    Ok(Property {
        property_id: row.try_get("property_id")?,
        title_short_description: row.try_get("title_short_description")?,
        location: row.try_get("location")?,
        num_rooms: parse_u32("num_rooms", row.try_get("num_rooms")?)?,
        property_size_sqft: parse_u32("property_size_sqft", row.try_get("property_size_sqft")?)?,
        price: row.try_get("price")?,
        certificates: row.try_get("certificates")?,
    })
}

fn parse_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use estately_core::domain::property::PropertyFilters;

    use super::SqlPropertyRepository;
    use crate::fixtures::seed_listings;
    use crate::repositories::PropertyRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        seed_listings(&pool).await.expect("seed listings");
        pool
    }

    #[tokio::test]
    async fn location_filter_matches_case_insensitive_substring() {
        let pool = setup_pool().await;
        let repo = SqlPropertyRepository::new(pool.clone());

        let filters =
            PropertyFilters { location: Some("mumBAI".to_string()), ..PropertyFilters::default() };
        let results = repo.search(&filters).await.expect("search");

        assert!(!results.is_empty());
        assert!(results.iter().all(|property| property.location.to_lowercase().contains("mumbai")));

        pool.close().await;
    }

    #[tokio::test]
    async fn all_present_filters_are_applied_together() {
        let pool = setup_pool().await;
        let repo = SqlPropertyRepository::new(pool.clone());

        let filters = PropertyFilters {
            location: Some("Mumbai".to_string()),
            num_rooms: Some(2),
            max_price: Some(5_000_000),
            min_price: None,
            min_size_sqft: None,
        };
        let results = repo.search(&filters).await.expect("search");

        assert!(!results.is_empty());
        for property in &results {
            assert!(property.location.to_lowercase().contains("mumbai"));
            assert_eq!(property.num_rooms, 2);
            assert!(property.price <= 5_000_000);
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn results_are_ordered_cheapest_first_and_capped() {
        let pool = setup_pool().await;
        let repo = SqlPropertyRepository::new(pool.clone());

        let results = repo.search(&PropertyFilters::default()).await.expect("search");

        assert!(results.len() <= 10);
        assert!(results.windows(2).all(|pair| pair[0].price <= pair[1].price));

        pool.close().await;
    }

    #[tokio::test]
    async fn unmatched_filters_return_empty_set() {
        let pool = setup_pool().await;
        let repo = SqlPropertyRepository::new(pool.clone());

        let filters = PropertyFilters {
            location: Some("Atlantis".to_string()),
            ..PropertyFilters::default()
        };
        let results = repo.search(&filters).await.expect("search");

        assert!(results.is_empty());

        pool.close().await;
    }
}
