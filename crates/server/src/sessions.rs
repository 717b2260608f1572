use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use estately_agents::{Chatbot, Classifier, Dispatcher};
use estately_db::repositories::PreferenceRepository;
use estately_memory::{Memory, SessionStore};

/// One chatbot per user id, bounded by a fixed capacity with
/// least-recently-used eviction. The classifier and dispatcher are shared;
/// each chatbot owns only its user's memory.
pub struct SessionRegistry {
    classifier: Arc<Classifier>,
    dispatcher: Arc<Dispatcher>,
    session_store: Arc<dyn SessionStore>,
    preferences: Arc<dyn PreferenceRepository>,
    capacity: usize,
    inner: Mutex<Lru>,
}

#[derive(Default)]
struct Lru {
    entries: HashMap<String, Arc<Chatbot>>,
    // Least recently used first.
    order: Vec<String>,
}

impl SessionRegistry {
    pub fn new(
        classifier: Arc<Classifier>,
        dispatcher: Arc<Dispatcher>,
        session_store: Arc<dyn SessionStore>,
        preferences: Arc<dyn PreferenceRepository>,
        capacity: usize,
    ) -> Self {
        Self {
            classifier,
            dispatcher,
            session_store,
            preferences,
            capacity: capacity.max(1),
            inner: Mutex::new(Lru::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Returns the user's chatbot, creating it on first contact. Evicted
    /// users lose only their in-process episodic log; session state and
    /// preferences live in their own stores.
    pub async fn checkout(&self, user_id: &str) -> Arc<Chatbot> {
        let mut inner = self.inner.lock().await;

        if let Some(chatbot) = inner.entries.get(user_id).cloned() {
            inner.order.retain(|entry| entry != user_id);
            inner.order.push(user_id.to_string());
            return chatbot;
        }

        if inner.entries.len() >= self.capacity {
            let evicted = inner.order.remove(0);
            inner.entries.remove(&evicted);
            debug!(
                event_name = "server.sessions.evicted",
                user_id = %evicted,
                capacity = self.capacity,
                "least recently used session evicted"
            );
        }

        let memory =
            Memory::new(user_id, self.session_store.clone(), self.preferences.clone());
        let chatbot =
            Arc::new(Chatbot::new(self.classifier.clone(), self.dispatcher.clone(), memory));

        inner.entries.insert(user_id.to_string(), chatbot.clone());
        inner.order.push(user_id.to_string());
        info!(
            event_name = "server.sessions.created",
            user_id,
            active = inner.entries.len(),
            "session created"
        );
        chatbot
    }
}
