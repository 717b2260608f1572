use tracing::debug;

use estately_core::domain::classification::QueryType;
use estately_core::domain::task::Task;
use estately_memory::Memory;

use crate::handlers::{HandlerError, HandlerRegistry};

pub const OUT_OF_SCOPE_REPLY: &str =
    "I can only help with real estate queries. Please ask about properties, prices, or renovations.";

const UNKNOWN_AGENT_REPLY: &str = "I'm not sure how to help with that.";

const EMPTY_PLAN_REPLY: &str =
    "I'm not sure how to help with that. Try asking about property search or renovation estimates.";

/// Runs the planned tasks strictly in order. A simple query answers with
/// the handler's text verbatim; a complex one gets one labeled block per
/// task so the user can see which agent produced what.
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub async fn dispatch(
        &self,
        query_type: QueryType,
        tasks: &[Task],
        memory: &Memory,
        user_input: &str,
    ) -> Result<String, HandlerError> {
        match query_type {
            QueryType::OutOfScope => Ok(OUT_OF_SCOPE_REPLY.to_string()),
            QueryType::Simple => match tasks.first() {
                Some(task) => self.run_task(task, memory, user_input).await,
                None => Ok(EMPTY_PLAN_REPLY.to_string()),
            },
            QueryType::Complex => {
                let mut sections = Vec::with_capacity(tasks.len());
                for (index, task) in tasks.iter().enumerate() {
                    debug!(
                        event_name = "agents.dispatch.task",
                        position = index + 1,
                        total = tasks.len(),
                        intent = task.intent.as_str(),
                        "executing planned task"
                    );
                    let output = self.run_task(task, memory, user_input).await?;
                    sections.push(format!("**{}:**\n{}", task.intent.label(), output));
                }
                Ok(format!("\n\n{}", sections.join("\n\n---\n\n")))
            }
        }
    }

    async fn run_task(
        &self,
        task: &Task,
        memory: &Memory,
        user_input: &str,
    ) -> Result<String, HandlerError> {
        match self.registry.get(task.intent) {
            Some(handler) => handler.execute(&task.params, memory, user_input).await,
            // A registry gap is a wiring bug; answer politely instead of
            // failing the whole turn.
            None => Ok(UNKNOWN_AGENT_REPLY.to_string()),
        }
    }
}
