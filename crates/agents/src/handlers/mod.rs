use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use estately_core::domain::intent::Intent;
use estately_core::domain::task::TaskParams;
use estately_db::repositories::RepositoryError;
use estately_memory::{Memory, MemoryError};

use crate::llm::CompletionError;

pub mod general;
pub mod preference;
pub mod renovation;
pub mod report;
pub mod search;
pub mod web_research;

pub use general::{Answer, GeneralQueryHandler, RetrievalAnswerer, SemanticAnswerer};
pub use preference::PreferenceHandler;
pub use renovation::RenovationHandler;
pub use report::{ReportBuilder, ReportHandler, TeraReportBuilder};
pub use search::SearchHandler;
pub use web_research::WebResearchHandler;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("listing store error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("completion failure: {0}")]
    Completion(#[from] CompletionError),
    #[error("report rendering failed: {0}")]
    Template(#[from] tera::Error),
}

/// One intent, one handler. Handlers receive only the parameters the
/// planner projected for their intent, plus the raw user input for the
/// free-text agents.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    async fn execute(
        &self,
        params: &TaskParams,
        memory: &Memory,
        user_input: &str,
    ) -> Result<String, HandlerError>;
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn IntentHandler>>,
}

impl HandlerRegistry {
    pub fn register(&mut self, intent: Intent, handler: Arc<dyn IntentHandler>) {
        self.handlers.insert(intent, handler);
    }

    pub fn get(&self, intent: Intent) -> Option<Arc<dyn IntentHandler>> {
        self.handlers.get(&intent).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Renders an amount the way listings quote it: `Rs.` prefix and
/// thousands separators, e.g. `Rs.5,000,000`.
pub(crate) fn format_rupees(amount: i64) -> String {
    format!("Rs.{}", group_thousands(amount))
}

pub(crate) fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    let leading = digits.len() % 3;
    if leading > 0 {
        grouped.push_str(&digits[..leading]);
    }
    for (index, chunk) in digits[leading..].as_bytes().chunks(3).enumerate() {
        if index > 0 || leading > 0 {
            grouped.push(',');
        }
        // chunks of ascii digits are valid utf-8
        grouped.push_str(std::str::from_utf8(chunk).unwrap_or(""));
    }

    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
