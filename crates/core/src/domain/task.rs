use crate::domain::classification::Slots;
use crate::domain::intent::Intent;

/// One executable unit of a turn: a target handler plus the projection of
/// the extracted slots onto that handler's allow-list. Ephemeral; one task
/// per intent per turn, consumed by the dispatcher in the same turn.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub intent: Intent,
    pub params: TaskParams,
}

/// Parameters a handler is allowed to see. Fields outside the owning
/// intent's allow-list are always `None` (see [`TaskParams::project`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskParams {
    pub location: Option<String>,
    pub num_rooms: Option<u32>,
    pub max_price: Option<i64>,
    pub property_size_sqft: Option<u32>,
    pub certificate_keywords: Option<String>,
}

impl TaskParams {
    /// Strict projection of `slots` onto the allow-list for `intent`:
    ///
    /// | intent              | allowed params                                          |
    /// |---------------------|---------------------------------------------------------|
    /// | search_property     | location, num_rooms, max_price, property_size_sqft      |
    /// | estimate_renovation | property_size_sqft, num_rooms                           |
    /// | generate_report     | (none — consumes prior-turn memory)                     |
    /// | save_preference     | location, num_rooms, max_price                          |
    /// | web_research        | (none — uses the raw user text)                         |
    /// | general_query       | certificate_keywords                                    |
    pub fn project(intent: Intent, slots: &Slots) -> Self {
        match intent {
            Intent::SearchProperty => Self {
                location: slots.location.clone(),
                num_rooms: slots.num_rooms,
                max_price: slots.max_price,
                property_size_sqft: slots.property_size_sqft,
                certificate_keywords: None,
            },
            Intent::EstimateRenovation => Self {
                property_size_sqft: slots.property_size_sqft,
                num_rooms: slots.num_rooms,
                ..Self::default()
            },
            Intent::GenerateReport | Intent::WebResearch => Self::default(),
            Intent::SavePreference => Self {
                location: slots.location.clone(),
                num_rooms: slots.num_rooms,
                max_price: slots.max_price,
                ..Self::default()
            },
            Intent::GeneralQuery => Self {
                certificate_keywords: slots.certificate_keywords.clone(),
                ..Self::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.num_rooms.is_none()
            && self.max_price.is_none()
            && self.property_size_sqft.is_none()
            && self.certificate_keywords.is_none()
    }
}
