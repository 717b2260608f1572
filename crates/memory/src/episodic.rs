use tokio::sync::RwLock;

use estately_core::domain::turn::{ConversationTurn, Role};

/// Append-only conversation log for one chat session. Lives in process
/// memory only; a new session starts empty.
#[derive(Default)]
pub struct EpisodicLog {
    turns: RwLock<Vec<ConversationTurn>>,
}

impl EpisodicLog {
    pub async fn append(&self, role: Role, content: impl Into<String>) {
        let mut turns = self.turns.write().await;
        turns.push(ConversationTurn::now(role, content));
    }

    /// The most recent `limit` turns in chronological order, or the whole
    /// log when `limit` is `None`.
    pub async fn recent(&self, limit: Option<usize>) -> Vec<ConversationTurn> {
        let turns = self.turns.read().await;
        match limit {
            Some(limit) => {
                let start = turns.len().saturating_sub(limit);
                turns[start..].to_vec()
            }
            None => turns.clone(),
        }
    }

    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.turns.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use estately_core::domain::turn::Role;

    use super::EpisodicLog;

    #[tokio::test]
    async fn append_preserves_chronological_order() {
        let log = EpisodicLog::default();
        log.append(Role::User, "find flats in Pune").await;
        log.append(Role::Assistant, "Found 3 properties").await;

        let turns = log.recent(None).await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn recent_returns_only_the_tail() {
        let log = EpisodicLog::default();
        for index in 0..5 {
            log.append(Role::User, format!("message {index}")).await;
        }

        let tail = log.recent(Some(2)).await;
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "message 3");
        assert_eq!(tail[1].content, "message 4");

        let oversized = log.recent(Some(50)).await;
        assert_eq!(oversized.len(), 5);
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let log = EpisodicLog::default();
        log.append(Role::User, "hello").await;
        log.clear().await;
        assert!(log.is_empty().await);
    }
}
