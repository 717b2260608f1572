use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use estately_core::domain::classification::ClassificationResult;
use estately_core::domain::turn::Role;
use estately_core::planner;
use estately_memory::{Memory, MemoryError};

use crate::classifier::Classifier;
use crate::dispatcher::Dispatcher;
use crate::handlers::HandlerError;

/// Shown (and logged as the assistant turn) when a handler fails mid-turn.
pub const TURN_FAILURE_REPLY: &str =
    "Something went wrong while handling your request. Please try again.";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// One assistant instance per user. Owns that user's memory; the
/// classifier and dispatcher are shared across users.
pub struct Chatbot {
    classifier: Arc<Classifier>,
    dispatcher: Arc<Dispatcher>,
    memory: Memory,
}

impl Chatbot {
    pub fn new(classifier: Arc<Classifier>, dispatcher: Arc<Dispatcher>, memory: Memory) -> Self {
        Self { classifier, dispatcher, memory }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Classify, plan, dispatch. The user turn is logged before any work
    /// and exactly one assistant turn is logged on every exit path,
    /// including failures.
    pub async fn handle_turn(&self, user_input: &str) -> Result<String, TurnError> {
        self.memory.add_turn(Role::User, user_input).await;

        let classification = match self.classifier.classify(user_input).await {
            Ok(classification) => classification,
            Err(error) => {
                warn!(
                    event_name = "agents.turn.classifier_degraded",
                    user_id = self.memory.user_id(),
                    error = %error,
                    "classifier unavailable, treating turn as a general query"
                );
                ClassificationResult::fallback()
            }
        };

        let query_type = classification.query_type();
        debug!(
            event_name = "agents.turn.classified",
            user_id = self.memory.user_id(),
            query_type = ?query_type,
            intents = ?classification.intents,
            slots = ?classification.slots,
            "query classified"
        );

        let tasks = planner::plan(query_type, &classification.intents, &classification.slots);
        debug!(
            event_name = "agents.turn.planned",
            user_id = self.memory.user_id(),
            task_count = tasks.len(),
            "execution plan ready"
        );

        match self.dispatcher.dispatch(query_type, &tasks, &self.memory, user_input).await {
            Ok(response) => {
                self.memory.add_turn(Role::Assistant, response.as_str()).await;
                Ok(response)
            }
            Err(error) => {
                self.memory.add_turn(Role::Assistant, TURN_FAILURE_REPLY).await;
                Err(TurnError::Handler(error))
            }
        }
    }
}
