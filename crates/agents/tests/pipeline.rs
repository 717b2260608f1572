//! End-to-end pipeline flows over in-memory stores and a scripted
//! completion client: classify, plan, dispatch, and memory effects.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use estately_agents::handlers::search::LAST_SEARCH_RESULTS_KEY;
use estately_agents::{
    default_registry, Chatbot, Classifier, CompletionClient, CompletionError, CompletionRequest,
    Dispatcher, ResearchError, SearchHit, WebSearcher, OUT_OF_SCOPE_REPLY,
};
use estately_core::config::LlmConfig;
use estately_core::domain::property::Property;
use estately_core::domain::turn::Role;
use estately_db::fixtures::sample_properties;
use estately_db::repositories::{InMemoryPreferenceRepository, InMemoryPropertyRepository};
use estately_memory::{InProcessSessionStore, Memory};

struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<String, String>>) -> Self {
        Self { replies: Mutex::new(replies.into()) }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        match self.replies.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(CompletionError::Network(message)),
            None => Err(CompletionError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

struct OfflineSearcher;

#[async_trait]
impl WebSearcher for OfflineSearcher {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ResearchError> {
        Err(ResearchError::NotConfigured("no key in tests".to_string()))
    }
}

fn llm_config() -> LlmConfig {
    LlmConfig {
        api_key: Some("hf-test".to_string().into()),
        base_url: "https://router.huggingface.co/v1".to_string(),
        model: "meta-llama/Llama-3.2-3B-Instruct:novita".to_string(),
        max_tokens: 200,
        temperature: 0.1,
        timeout_secs: 30,
    }
}

fn chatbot_with_script(replies: Vec<Result<String, String>>) -> Chatbot {
    let completions: Arc<dyn CompletionClient> = Arc::new(ScriptedClient::new(replies));
    let properties = Arc::new(InMemoryPropertyRepository::with_listings(sample_properties()));
    let config = llm_config();

    let registry =
        default_registry(properties, completions.clone(), Arc::new(OfflineSearcher), &config)
            .expect("registry");

    let memory = Memory::new(
        "test-user",
        Arc::new(InProcessSessionStore::default()),
        Arc::new(InMemoryPreferenceRepository::default()),
    );

    Chatbot::new(
        Arc::new(Classifier::new(completions, &config)),
        Arc::new(Dispatcher::new(registry)),
        memory,
    )
}

#[tokio::test]
async fn simple_search_turn_lists_matches_and_caches_them() {
    let chatbot = chatbot_with_script(vec![Ok(r#"{"in_scope": true, "intents": ["search_property"], "slots": {"location": "Mumbai", "num_rooms": 2, "max_price": 5000000}}"#.to_string())]);

    let response =
        chatbot.handle_turn("Find 2BHK in Mumbai under 50 lakh").await.expect("turn");

    assert!(response.starts_with("Found 2 properties:"));
    assert!(response.contains("PROP-002"));
    assert!(response.contains("Rs.4,650,000"));

    let cached: Option<Vec<Property>> =
        chatbot.memory().get_session(LAST_SEARCH_RESULTS_KEY).await.expect("session");
    assert_eq!(cached.expect("cached results").len(), 2);

    let turns = chatbot.memory().recent_turns(None).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "Find 2BHK in Mumbai under 50 lakh");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, response);
}

#[tokio::test]
async fn complex_turn_produces_ordered_labeled_sections() {
    let chatbot = chatbot_with_script(vec![Ok(r#"{"in_scope": true, "intents": ["search_property", "estimate_renovation", "generate_report"], "slots": {"location": "Bangalore", "num_rooms": 3}}"#.to_string())]);

    let response = chatbot
        .handle_turn("Find 3BHK in Bangalore, estimate renovation cost, and generate a report")
        .await
        .expect("turn");

    let search_at = response.find("**Search Property:**").expect("search section");
    let renovation_at =
        response.find("**Estimate Renovation:**").expect("renovation section");
    let report_at = response.find("**Generate Report:**").expect("report section");

    assert!(response.starts_with("\n\n"));
    assert!(search_at < renovation_at && renovation_at < report_at);
    assert_eq!(response.matches("\n\n---\n\n").count(), 2);

    // The report sees this same turn's search results.
    assert!(response.contains("Renovation Cost Estimates for 1400 sqft:"));
    assert!(response.contains("Property Comparison Report"));
    assert!(response.contains("PROP-006"));
}

#[tokio::test]
async fn out_of_scope_turn_is_refused_but_still_logged() {
    let chatbot = chatbot_with_script(vec![Ok(
        r#"{"in_scope": false, "intents": [], "slots": {}}"#.to_string(),
    )]);

    let response = chatbot.handle_turn("Who is the president?").await.expect("turn");
    assert_eq!(response, OUT_OF_SCOPE_REPLY);

    let turns = chatbot.memory().recent_turns(None).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].content, OUT_OF_SCOPE_REPLY);
}

#[tokio::test]
async fn classifier_outage_degrades_to_a_general_answer() {
    let chatbot = chatbot_with_script(vec![
        Err("connection refused".to_string()),
        Ok("PROP-009 is the most affordable listing on file.".to_string()),
    ]);

    let response = chatbot.handle_turn("what's the cheapest flat?").await.expect("turn");

    assert!(response.starts_with("PROP-009 is the most affordable listing on file."));
    assert!(response.contains("\n\nSources: "));
}

#[tokio::test]
async fn preference_turn_persists_only_present_slots() {
    let chatbot = chatbot_with_script(vec![Ok(r#"{"in_scope": true, "intents": ["save_preference"], "slots": {"max_price": 10000000}}"#.to_string())]);

    let response = chatbot
        .handle_turn("save my budget of 1 crore")
        .await
        .expect("turn");

    assert_eq!(response, "Preferences saved! I'll remember them for future searches.");
    assert_eq!(
        chatbot.memory().preferences().await.expect("prefs"),
        vec![("budget".to_string(), "10000000".to_string())]
    );
}
