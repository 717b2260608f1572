use async_trait::async_trait;

use estately_core::domain::task::TaskParams;
use estately_memory::Memory;

use super::{HandlerError, IntentHandler};

/// Maps present slots onto the durable preference keys. Absent slots are
/// never written, so an earlier value survives a partial update.
pub struct PreferenceHandler;

pub const BUDGET_KEY: &str = "budget";
pub const PREFERRED_LOCATION_KEY: &str = "preferred_location";
pub const PREFERRED_ROOMS_KEY: &str = "preferred_rooms";

#[async_trait]
impl IntentHandler for PreferenceHandler {
    async fn execute(
        &self,
        params: &TaskParams,
        memory: &Memory,
        _user_input: &str,
    ) -> Result<String, HandlerError> {
        if let Some(max_price) = params.max_price {
            memory.save_preference(BUDGET_KEY, &max_price.to_string()).await?;
        }
        if let Some(location) = &params.location {
            memory.save_preference(PREFERRED_LOCATION_KEY, location).await?;
        }
        if let Some(num_rooms) = params.num_rooms {
            memory.save_preference(PREFERRED_ROOMS_KEY, &num_rooms.to_string()).await?;
        }

        Ok("Preferences saved! I'll remember them for future searches.".to_string())
    }
}
