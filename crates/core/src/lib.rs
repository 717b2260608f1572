pub mod config;
pub mod domain;
pub mod errors;
pub mod planner;

pub use domain::classification::{ClassificationResult, QueryType, Slots};
pub use domain::intent::Intent;
pub use domain::property::{Property, PropertyFilters};
pub use domain::task::{Task, TaskParams};
pub use domain::turn::{ConversationTurn, Role};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use planner::plan;
