use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use estately_core::domain::task::TaskParams;
use estately_memory::Memory;

use super::{HandlerError, IntentHandler};
use crate::research::{SearchHit, WebSearcher};

const SNIPPET_CHARS: usize = 200;

pub struct WebResearchHandler {
    searcher: Arc<dyn WebSearcher>,
}

impl WebResearchHandler {
    pub fn new(searcher: Arc<dyn WebSearcher>) -> Self {
        Self { searcher }
    }
}

#[async_trait]
impl IntentHandler for WebResearchHandler {
    async fn execute(
        &self,
        _params: &TaskParams,
        _memory: &Memory,
        user_input: &str,
    ) -> Result<String, HandlerError> {
        match self.searcher.search(user_input).await {
            Ok(hits) => Ok(summarize(&hits)),
            Err(error) => {
                debug!(
                    event_name = "agents.web_research.fallback",
                    error = %error,
                    "live search failed, answering with fallback text"
                );
                Ok(fallback_summary(user_input))
            }
        }
    }
}

fn summarize(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No recent market data found.".to_string();
    }

    let mut parts = Vec::with_capacity(hits.len().min(3));
    for (index, hit) in hits.iter().take(3).enumerate() {
        let mut part = String::new();
        let _ = write!(part, "{}. {}: ", index + 1, hit.title);
        part.extend(hit.content.chars().take(SNIPPET_CHARS));
        part.push_str("...");
        parts.push(part);
    }

    parts.join("\n\n")
}

fn fallback_summary(query: &str) -> String {
    format!(
        "Real-time market data for '{query}' is not available. \
         Please check with local real estate websites for current rates."
    )
}
