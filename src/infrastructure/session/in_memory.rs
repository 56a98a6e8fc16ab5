//! In-memory session store with idle expiry

use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::cache::now_millis;
use crate::domain::{ChatTurn, GatewayError, SessionStore};

#[derive(Debug)]
struct SessionRecord {
    turns: Vec<ChatTurn>,
    last_activity: u64,
}

/// Conversation histories keyed by session id.
///
/// A session expires after `ttl` without activity; appending refreshes the
/// clock. Each session keeps at most `max_history` turns, oldest dropped
/// first. Expired sessions are swept on every access.
#[derive(Debug)]
pub struct InMemorySessionStore {
    max_history: usize,
    ttl_millis: u64,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new(max_history: usize, ttl: Duration) -> Self {
        Self {
            max_history: max_history.max(1),
            ttl_millis: ttl.as_millis() as u64,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, SessionRecord>>, GatewayError> {
        self.sessions
            .write()
            .map_err(|e| GatewayError::internal(format!("Session lock poisoned: {}", e)))
    }

    fn sweep_expired(sessions: &mut HashMap<String, SessionRecord>, now: u64, ttl: u64) {
        sessions.retain(|_, record| now.saturating_sub(record.last_activity) <= ttl);
    }

    /// Number of live sessions after sweeping expired ones
    pub fn session_count(&self) -> Result<usize, GatewayError> {
        let mut sessions = self.write()?;
        Self::sweep_expired(&mut sessions, now_millis(), self.ttl_millis);
        Ok(sessions.len())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, GatewayError> {
        let mut sessions = self.write()?;
        Self::sweep_expired(&mut sessions, now_millis(), self.ttl_millis);

        Ok(sessions
            .get(session_id)
            .map(|record| record.turns.clone())
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, turn: ChatTurn) -> Result<(), GatewayError> {
        let now = now_millis();
        let mut sessions = self.write()?;
        Self::sweep_expired(&mut sessions, now, self.ttl_millis);

        let record = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord {
                turns: Vec::new(),
                last_activity: now,
            });

        record.turns.push(turn);
        record.last_activity = now;

        if record.turns.len() > self.max_history {
            let excess = record.turns.len() - self.max_history;
            record.turns.drain(..excess);
        }

        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, GatewayError> {
        let mut sessions = self.write()?;
        let existed = sessions.remove(session_id).is_some();

        if existed {
            debug!(session_id = %session_id, "session deleted");
        }

        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(20, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_append_and_history() {
        let store = store();

        store.append("s1", ChatTurn::user("hello")).await.unwrap();
        store
            .append("s1", ChatTurn::assistant("hi there"))
            .await
            .unwrap();

        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_unknown_session_has_empty_history() {
        let store = store();

        let history = store.history("missing").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = store();

        store.append("s1", ChatTurn::user("one")).await.unwrap();
        store.append("s2", ChatTurn::user("two")).await.unwrap();

        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "one");
    }

    #[tokio::test]
    async fn test_history_is_capped_oldest_first() {
        let store = InMemorySessionStore::new(3, Duration::from_secs(3600));

        for i in 0..5 {
            store
                .append("s1", ChatTurn::user(format!("turn {}", i)))
                .await
                .unwrap();
        }

        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "turn 2");
        assert_eq!(history[2].content, "turn 4");
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = InMemorySessionStore::new(20, Duration::from_millis(30));

        store.append("s1", ChatTurn::user("hello")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let history = store.history("s1").await.unwrap();
        assert!(history.is_empty());
        assert_eq!(store.session_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_refreshes_expiry() {
        let store = InMemorySessionStore::new(20, Duration::from_millis(80));

        store.append("s1", ChatTurn::user("first")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.append("s1", ChatTurn::user("second")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // 100ms since the first append, 50ms since the refresh
        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = store();

        store.append("s1", ChatTurn::user("hello")).await.unwrap();

        assert!(store.delete("s1").await.unwrap());
        assert!(!store.delete("s1").await.unwrap());
        assert!(store.history("s1").await.unwrap().is_empty());
    }
}
