//! Session/history collaborator trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::GatewayError;
use crate::domain::llm::{Message, MessageRole};

/// One turn of a conversation, as stored per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl From<&ChatTurn> for Message {
    fn from(turn: &ChatTurn) -> Self {
        Message::new(turn.role, turn.content.clone())
    }
}

/// Trait for conversation history storage
#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Ordered prior turns for the session; empty for unknown or expired
    /// sessions.
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, GatewayError>;

    /// Append a turn to the session, creating it if needed
    async fn append(&self, session_id: &str, turn: ChatTurn) -> Result<(), GatewayError>;

    /// Drop a session. Returns whether it existed.
    async fn delete(&self, session_id: &str) -> Result<bool, GatewayError>;
}
