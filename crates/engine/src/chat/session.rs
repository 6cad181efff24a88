use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use courtside_common::SessionId;

use super::transcript::Transcript;

/// One user's conversation state: the transcript plus the running cost total.
pub struct ChatSession {
    pub transcript: Transcript,
    pub created_at: DateTime<Utc>,
    pub total_cost_usd: f64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            created_at: Utc::now(),
            total_cost_usd: 0.0,
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory session store. Each session sits behind its own mutex so turns
/// within a session are strictly serial while distinct sessions interleave.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<ChatSession>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the session with the given id, creating it (or a fresh one when
    /// no id was supplied) as needed.
    pub async fn get_or_create(&self, id: Option<SessionId>) -> (SessionId, Arc<Mutex<ChatSession>>) {
        let id = id.unwrap_or_default();

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id)
            .or_insert_with(|| {
                tracing::info!(session_id = %id, "Session created");
                metrics::counter!("sessions.created").increment(1);
                Arc::new(Mutex::new(ChatSession::new()))
            })
            .clone();

        (id, session)
    }

    pub async fn get(&self, id: SessionId) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Session reset: drop the transcript and totals entirely.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_reuses_existing_session() {
        let manager = SessionManager::new();

        let (id, session) = manager.get_or_create(None).await;
        {
            let mut locked = session.lock().await;
            locked.transcript.push_user_text("first question");
        }

        let (same_id, again) = manager.get_or_create(Some(id)).await;
        assert_eq!(id, same_id);
        assert_eq!(again.lock().await.transcript.messages().len(), 1);
        assert_eq!(manager.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_clears_session_state() {
        let manager = SessionManager::new();
        let (id, _) = manager.get_or_create(None).await;

        assert!(manager.remove(id).await);
        assert!(!manager.remove(id).await);
        assert!(manager.get(id).await.is_none());

        // A new turn under the same id starts from a blank transcript.
        let (_, fresh) = manager.get_or_create(Some(id)).await;
        assert!(fresh.lock().await.transcript.is_empty());
    }
}
