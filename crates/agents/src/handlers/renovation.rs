use std::fmt::Write;

use async_trait::async_trait;

use estately_core::domain::task::TaskParams;
use estately_memory::Memory;

use super::{group_thousands, HandlerError, IntentHandler};

/// Flat INR-per-sqft rates for the three renovation tiers.
const TIERS: [(&str, i64, &str); 3] = [
    ("BASIC", 500, "Basic painting, minor repairs"),
    ("MODERATE", 1200, "Flooring, electrical, plumbing upgrades"),
    ("PREMIUM", 2500, "Complete makeover with modular fittings"),
];

pub struct RenovationHandler;

#[async_trait]
impl IntentHandler for RenovationHandler {
    async fn execute(
        &self,
        params: &TaskParams,
        _memory: &Memory,
        _user_input: &str,
    ) -> Result<String, HandlerError> {
        let size_sqft = match resolve_size(params) {
            Some(size_sqft) => size_sqft,
            None => {
                return Ok(
                    "I need the property size or number of rooms to estimate renovation costs."
                        .to_string(),
                )
            }
        };

        let mut output = format!("Renovation Cost Estimates for {size_sqft} sqft:\n\n");
        for (label, rate, description) in TIERS {
            let total = i64::from(size_sqft) * rate;
            let _ = write!(
                output,
                "{label}:\n  Total: Rs.{}\n  Rate: Rs.{rate}/sqft\n  Includes: {description}\n\n",
                group_thousands(total),
            );
        }

        Ok(output.trim_end().to_string())
    }
}

/// Explicit size wins; otherwise size is inferred from the room count.
fn resolve_size(params: &TaskParams) -> Option<u32> {
    params.property_size_sqft.or_else(|| params.num_rooms.map(size_from_rooms))
}

fn size_from_rooms(num_rooms: u32) -> u32 {
    match num_rooms {
        1 => 600,
        2 => 1_000,
        3 => 1_400,
        4 => 1_800,
        other => other * 450,
    }
}
