use serde::{Deserialize, Serialize};

use crate::domain::intent::Intent;

/// Typed parameters the classifier can extract from one user turn. Every
/// field is optional; the model returns `null` for anything it did not find.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slots {
    pub location: Option<String>,
    pub num_rooms: Option<u32>,
    pub max_price: Option<i64>,
    pub property_size_sqft: Option<u32>,
    pub certificate_keywords: Option<String>,
}

/// Derived complexity of a turn. Never requested from the model; computed
/// from the validated intent list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryType {
    OutOfScope,
    Simple,
    Complex,
}

/// Validated output of one classification call. Constructed once per turn
/// and consumed immediately by the planner; never persisted.
///
/// Invariants (enforced by the classifier's repair step):
/// - `intents` is duplicate-free and every member is a known [`Intent`],
/// - an in-scope result always has at least one intent.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    pub in_scope: bool,
    pub intents: Vec<Intent>,
    pub slots: Slots,
}

impl ClassificationResult {
    /// Degraded-mode result used whenever the completion service is
    /// unreachable or returns something undecodable.
    pub fn fallback() -> Self {
        Self { in_scope: true, intents: vec![Intent::GeneralQuery], slots: Slots::default() }
    }

    pub fn query_type(&self) -> QueryType {
        if !self.in_scope {
            QueryType::OutOfScope
        } else if self.intents.len() == 1 {
            QueryType::Simple
        } else {
            QueryType::Complex
        }
    }
}
