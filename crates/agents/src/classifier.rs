//! LLM-backed intent classification. One completion call per user turn;
//! the model's reply is parsed permissively so a sloppy answer degrades to
//! a usable classification instead of an error.

use std::sync::Arc;

use thiserror::Error;

use estately_core::config::LlmConfig;
use estately_core::domain::classification::{ClassificationResult, Slots};
use estately_core::domain::intent::Intent;

use crate::llm::{ChatMessage, CompletionClient, CompletionError, CompletionRequest};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

impl From<CompletionError> for ClassifierError {
    fn from(error: CompletionError) -> Self {
        Self::Unavailable(error.to_string())
    }
}

pub struct Classifier {
    client: Arc<dyn CompletionClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl Classifier {
    pub fn new(client: Arc<dyn CompletionClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Transport or API failures surface as `Unavailable`; the caller
    /// decides whether to degrade. Unparseable model output never errors.
    pub async fn classify(&self, user_input: &str) -> Result<ClassificationResult, ClassifierError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(build_prompt(user_input))],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let reply = self.client.complete(request).await?;
        Ok(parse_classification(&reply))
    }
}

fn build_prompt(user_query: &str) -> String {
    format!(
        r#"You are a real estate query analyzer. Analyze the query and return ONLY valid JSON (no other text).

Query: {user_query}

Your task:
1. Determine if query is real estate related (in_scope: true/false)
2. Identify ALL distinct actions requested (intents array)
3. Extract property parameters (slots object)

IMPORTANT RULES:
- intents must be an ARRAY (even for single intent: ["search_property"])
- Do NOT include duplicate intents
- List intents in logical execution order
- If multiple actions requested, include ALL as separate intents
- Choose ONLY from: [search_property, estimate_renovation, generate_report, save_preference, web_research, general_query]

JSON structure:
{{
  "in_scope": boolean,
  "intents": [intent1, intent2, ...],
  "slots": {{
    "location": string or null,
    "num_rooms": number or null,
    "max_price": number or null,
    "property_size_sqft": number or null,
    "certificate_keywords": string or null
  }}
}}

IMPORTANT for certificate_keywords:
- Extract if query mentions: "certificate", "certified", "certification", "green building", "fire safety", "pest control", "structural safety"
- Store the specific certificate type mentioned (e.g., "green building", "fire safety")
- Set to null if no certificate-related terms found

Examples:

Query: "Find 2BHK in Mumbai under 50 lakh"
{{"in_scope": true, "intents": ["search_property"], "slots": {{"location": "Mumbai", "num_rooms": 2, "max_price": 5000000, "property_size_sqft": null, "certificate_keywords": null}}}}

Query: "Show me properties with green building certification"
{{"in_scope": true, "intents": ["general_query"], "slots": {{"location": null, "num_rooms": null, "max_price": null, "property_size_sqft": null, "certificate_keywords": "green building"}}}}

Query: "Find fire safety certified properties in Bangalore"
{{"in_scope": true, "intents": ["general_query"], "slots": {{"location": "Bangalore", "num_rooms": null, "max_price": null, "property_size_sqft": null, "certificate_keywords": "fire safety"}}}}

Query: "Find 3BHK properties in Bangalore, estimate renovation cost, and generate a comparison report"
{{"in_scope": true, "intents": ["search_property", "estimate_renovation", "generate_report"], "slots": {{"location": "Bangalore", "num_rooms": 3, "max_price": null, "property_size_sqft": null, "certificate_keywords": null}}}}

Query: "Show me properties under 1 crore and save my budget preference"
{{"in_scope": true, "intents": ["search_property", "save_preference"], "slots": {{"location": null, "num_rooms": null, "max_price": 10000000, "property_size_sqft": null, "certificate_keywords": null}}}}

Query: "What are current market rates in Delhi?"
{{"in_scope": true, "intents": ["web_research"], "slots": {{"location": "Delhi", "num_rooms": null, "max_price": null, "property_size_sqft": null, "certificate_keywords": null}}}}

Query: "Estimate renovation for 1200 sqft"
{{"in_scope": true, "intents": ["estimate_renovation"], "slots": {{"location": null, "num_rooms": null, "max_price": null, "property_size_sqft": 1200, "certificate_keywords": null}}}}

Query: "Who is the president?"
{{"in_scope": false, "intents": [], "slots": {{"location": null, "num_rooms": null, "max_price": null, "property_size_sqft": null, "certificate_keywords": null}}}}

Now analyze this query and return ONLY the JSON:"#
    )
}

/// Extracts the JSON object from the model reply and repairs it into a
/// valid classification. Everything unusable collapses to the in-scope
/// general-query default rather than an error.
pub fn parse_classification(reply: &str) -> ClassificationResult {
    let Some(start) = reply.find('{') else {
        return ClassificationResult::fallback();
    };
    let Some(end) = reply.rfind('}') else {
        return ClassificationResult::fallback();
    };
    if end < start {
        return ClassificationResult::fallback();
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&reply[start..=end]) else {
        return ClassificationResult::fallback();
    };

    let in_scope = value.get("in_scope").and_then(serde_json::Value::as_bool).unwrap_or(true);
    let intents = repair_intents(value.get("intents"));
    let slots = repair_slots(value.get("slots"));

    ClassificationResult { in_scope, intents, slots }
}

fn repair_intents(raw: Option<&serde_json::Value>) -> Vec<Intent> {
    let names: Vec<String> = match raw {
        // A bare string is coerced to a single-element list.
        Some(serde_json::Value::String(single)) => vec![single.clone()],
        Some(serde_json::Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| entry.as_str().map(str::to_string))
            .collect(),
        _ => vec![Intent::GeneralQuery.as_str().to_string()],
    };

    let mut intents = Vec::new();
    for name in names {
        if let Ok(intent) = name.parse::<Intent>() {
            if !intents.contains(&intent) {
                intents.push(intent);
            }
        }
    }

    if intents.is_empty() {
        intents.push(Intent::GeneralQuery);
    }
    intents
}

fn repair_slots(raw: Option<&serde_json::Value>) -> Slots {
    let Some(value) = raw else {
        return Slots::default();
    };

    Slots {
        location: value
            .get("location")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        num_rooms: value
            .get("num_rooms")
            .and_then(serde_json::Value::as_u64)
            .and_then(|rooms| u32::try_from(rooms).ok()),
        max_price: value.get("max_price").and_then(serde_json::Value::as_i64),
        property_size_sqft: value
            .get("property_size_sqft")
            .and_then(serde_json::Value::as_u64)
            .and_then(|sqft| u32::try_from(sqft).ok()),
        certificate_keywords: value
            .get("certificate_keywords")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
    }
}
