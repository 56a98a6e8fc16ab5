//! Intent dispatch domain types

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::GatewayError;
use crate::domain::session::ChatTurn;

/// Everything a handler needs to answer one request
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// The user's message for this turn
    pub user_input: String,
    /// Prior turns of the conversation, oldest first
    pub history: Vec<ChatTurn>,
    /// Whether the active model accepts tool-role messages
    pub tool_calls_enabled: bool,
}

impl DispatchContext {
    /// Create a context with no history
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            history: Vec::new(),
            tool_calls_enabled: false,
        }
    }

    /// Set the conversation history
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    /// Set whether tool-role messages may be used
    pub fn with_tool_calls(mut self, enabled: bool) -> Self {
        self.tool_calls_enabled = enabled;
        self
    }
}

/// The routed answer for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Identifier of the handler that produced the answer
    pub handler_id: String,
    /// The answer text
    pub response_text: String,
}

impl DispatchOutcome {
    /// Create an outcome
    pub fn new(handler_id: impl Into<String>, response_text: impl Into<String>) -> Self {
        Self {
            handler_id: handler_id.into(),
            response_text: response_text.into(),
        }
    }
}

/// A specialist that answers one category of request
#[async_trait]
pub trait IntentHandler: Send + Sync + Debug {
    /// Stable identifier the classifier routes on
    fn id(&self) -> &'static str;

    /// One-line description shown to the classifier
    fn description(&self) -> &'static str;

    /// Produce an answer for the request
    async fn handle(&self, ctx: &DispatchContext) -> Result<String, GatewayError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = DispatchContext::new("where is my order?")
            .with_history(vec![ChatTurn::user("hi")])
            .with_tool_calls(true);

        assert_eq!(ctx.user_input, "where is my order?");
        assert_eq!(ctx.history.len(), 1);
        assert!(ctx.tool_calls_enabled);
    }

    #[test]
    fn test_outcome_round_trips_through_json() {
        let outcome = DispatchOutcome::new("order", "Your order shipped.");

        let json = serde_json::to_string(&outcome).unwrap();
        let back: DispatchOutcome = serde_json::from_str(&json).unwrap();

        assert_eq!(back, outcome);
    }
}
