use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;

use estately_core::domain::property::{Property, PropertyFilters};
use estately_core::domain::task::TaskParams;
use estately_db::repositories::PropertyRepository;
use estately_memory::Memory;

use super::{format_rupees, HandlerError, IntentHandler};
use crate::llm::{ChatMessage, CompletionClient, CompletionRequest};

const TOP_K: usize = 3;
const ANSWER_MAX_TOKENS: u32 = 300;
const ANSWER_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Question answering grounded in listing data. The certificate keyword,
/// when present, steers retrieval toward certified listings.
#[async_trait]
pub trait SemanticAnswerer: Send + Sync {
    async fn answer(
        &self,
        question: &str,
        certificate_keywords: Option<&str>,
    ) -> Result<Answer, HandlerError>;
}

/// Retrieves candidate listings by keyword overlap against the relational
/// store, then grounds one completion call on them. Sources are the ids of
/// the listings used as context.
pub struct RetrievalAnswerer {
    properties: Arc<dyn PropertyRepository>,
    completions: Arc<dyn CompletionClient>,
    model: String,
}

impl RetrievalAnswerer {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        completions: Arc<dyn CompletionClient>,
        model: impl Into<String>,
    ) -> Self {
        Self { properties, completions, model: model.into() }
    }

    async fn retrieve(&self, search_query: &str) -> Result<Vec<Property>, HandlerError> {
        let candidates = self.properties.search(&PropertyFilters::default()).await?;

        let mut scored: Vec<(usize, Property)> = candidates
            .into_iter()
            .map(|property| (keyword_overlap(search_query, &property), property))
            .collect();
        // Highest overlap first; ties keep the store's cheapest-first order.
        scored.sort_by(|left, right| right.0.cmp(&left.0));
        scored.truncate(TOP_K);

        Ok(scored.into_iter().map(|(_, property)| property).collect())
    }
}

#[async_trait]
impl SemanticAnswerer for RetrievalAnswerer {
    async fn answer(
        &self,
        question: &str,
        certificate_keywords: Option<&str>,
    ) -> Result<Answer, HandlerError> {
        let search_query = expand_query(question, certificate_keywords);
        let properties = self.retrieve(&search_query).await?;

        let prompt = build_prompt(question, &properties, certificate_keywords);
        let text = self
            .completions
            .complete(CompletionRequest {
                model: self.model.clone(),
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: ANSWER_MAX_TOKENS,
                temperature: ANSWER_TEMPERATURE,
            })
            .await?;

        let sources =
            properties.iter().map(|property| property.property_id.clone()).collect();
        Ok(Answer { text, sources })
    }
}

/// Generic certificate vocabulary widens retrieval; a specific certificate
/// type is appended verbatim.
fn expand_query(question: &str, certificate_keywords: Option<&str>) -> String {
    match certificate_keywords {
        Some(keywords)
            if matches!(
                keywords.to_lowercase().as_str(),
                "certificate" | "certification" | "certified"
            ) =>
        {
            format!("{question} certificate certification safety building")
        }
        Some(keywords) => format!("{question} {keywords}"),
        None => question.to_string(),
    }
}

fn keyword_overlap(query: &str, property: &Property) -> usize {
    let haystack = format!(
        "{} {} {}",
        property.location,
        property.title_short_description.as_deref().unwrap_or(""),
        property.certificate_names().join(" "),
    )
    .to_lowercase();

    query
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.len() > 2 && haystack.contains(token))
        .count()
}

fn build_prompt(
    question: &str,
    properties: &[Property],
    certificate_keywords: Option<&str>,
) -> String {
    let mut context = String::new();
    for property in properties {
        let _ = write!(
            context,
            "Property {}: {} in {}. Price: {}. Rooms: {}. Size: {} sqft.",
            property.property_id,
            property.title_short_description.as_deref().unwrap_or("N/A"),
            property.location,
            format_rupees(property.price),
            property.num_rooms,
            property.property_size_sqft,
        );
        let certificate_names = property.certificate_names();
        if !certificate_names.is_empty() {
            let _ = write!(context, " Certificates: {}.", certificate_names.join(", "));
        }
        context.push('\n');
    }

    let certificate_instruction = match certificate_keywords {
        Some(keywords) => format!(
            "\nCERTIFICATE QUERY DETECTED:\n\
             - The user is asking about: {keywords}\n\
             - Each property listing below includes certificates (if any)\n\
             - Mention which certificates each property has\n\
             - If no certificates match, say so clearly\n"
        ),
        None => String::new(),
    };

    format!(
        "You are a helpful real estate assistant. Answer the question based ONLY on the provided \
         property information below. Use the EXACT data provided - do not estimate, assume, or \
         infer information.\n\
         {certificate_instruction}\n\
         Property Data:\n{context}\n\
         Question: {question}\n\n\
         IMPORTANT:\n\
         - Use the exact number of rooms shown in the data\n\
         - Do not make assumptions or estimates about information that is already provided\n\
         - If information is missing, say so directly\n\
         - Include property IDs in your response\n\
         - If certificates are shown, mention them in your answer\n\n\
         Answer:"
    )
}

pub struct GeneralQueryHandler {
    answerer: Arc<dyn SemanticAnswerer>,
}

impl GeneralQueryHandler {
    pub fn new(answerer: Arc<dyn SemanticAnswerer>) -> Self {
        Self { answerer }
    }
}

#[async_trait]
impl IntentHandler for GeneralQueryHandler {
    async fn execute(
        &self,
        params: &TaskParams,
        _memory: &Memory,
        user_input: &str,
    ) -> Result<String, HandlerError> {
        let answer =
            self.answerer.answer(user_input, params.certificate_keywords.as_deref()).await?;

        let mut response = answer.text;
        if !answer.sources.is_empty() {
            response.push_str("\n\nSources: ");
            response.push_str(&answer.sources.join(", "));
        }
        Ok(response)
    }
}
