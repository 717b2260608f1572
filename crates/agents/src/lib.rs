//! The assistant pipeline: an LLM-backed classifier turns a user message
//! into intents and slots, a pure planner projects them into tasks, and a
//! dispatcher runs one handler per task against the user's memory.

pub mod chatbot;
pub mod classifier;
pub mod dispatcher;
pub mod handlers;
pub mod llm;
pub mod research;

use std::sync::Arc;

use estately_core::config::LlmConfig;
use estately_core::domain::intent::Intent;
use estately_db::repositories::PropertyRepository;

pub use chatbot::{Chatbot, TurnError, TURN_FAILURE_REPLY};
pub use classifier::{Classifier, ClassifierError};
pub use dispatcher::{Dispatcher, OUT_OF_SCOPE_REPLY};
pub use handlers::{HandlerError, HandlerRegistry, IntentHandler};
pub use llm::{ChatMessage, CompletionClient, CompletionError, CompletionRequest};
pub use research::{ResearchError, SearchHit, WebSearcher};

use handlers::{
    GeneralQueryHandler, PreferenceHandler, RenovationHandler, ReportHandler, RetrievalAnswerer,
    SearchHandler, TeraReportBuilder, WebResearchHandler,
};

/// Wires the standard handler for every intent in the closed set.
pub fn default_registry(
    properties: Arc<dyn PropertyRepository>,
    completions: Arc<dyn CompletionClient>,
    searcher: Arc<dyn WebSearcher>,
    llm: &LlmConfig,
) -> Result<HandlerRegistry, tera::Error> {
    let mut registry = HandlerRegistry::default();
    registry.register(Intent::SearchProperty, Arc::new(SearchHandler::new(properties.clone())));
    registry.register(Intent::EstimateRenovation, Arc::new(RenovationHandler));
    registry.register(
        Intent::GenerateReport,
        Arc::new(ReportHandler::new(Arc::new(TeraReportBuilder::new()?))),
    );
    registry.register(Intent::SavePreference, Arc::new(PreferenceHandler));
    registry.register(Intent::WebResearch, Arc::new(WebResearchHandler::new(searcher)));
    registry.register(
        Intent::GeneralQuery,
        Arc::new(GeneralQueryHandler::new(Arc::new(RetrievalAnswerer::new(
            properties,
            completions,
            llm.model.clone(),
        )))),
    );
    Ok(registry)
}
