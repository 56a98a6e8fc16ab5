//! General conversation handler, also the classification fallback

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ChatRequest, DispatchContext, GatewayError, IntentHandler, Message};
use crate::infrastructure::llm::ModelRouter;

const SYSTEM_PROMPT: &str = "\
You are a friendly e-commerce support assistant. Your duties:
1. Greet users and keep light conversation going
2. Guide users toward describing what they need
3. Politely say so when a request is outside your remit

Ground rules:
- Stay friendly and professional
- Keep replies short and clear
- When the user has a concrete need (product questions, order status, after-sales), \
ask them to spell it out";

/// Small talk and anything no other handler claims
#[derive(Debug)]
pub struct ChitchatHandler {
    router: Arc<ModelRouter>,
    timeout: Duration,
}

impl ChitchatHandler {
    pub fn new(router: Arc<ModelRouter>, timeout: Duration) -> Self {
        Self { router, timeout }
    }
}

#[async_trait]
impl IntentHandler for ChitchatHandler {
    fn id(&self) -> &'static str {
        "chitchat"
    }

    fn description(&self) -> &'static str {
        "greetings, small talk, and anything that fits no other handler"
    }

    async fn handle(&self, ctx: &DispatchContext) -> Result<String, GatewayError> {
        let history: Vec<Message> = ctx.history.iter().map(Message::from).collect();
        let request = ChatRequest::builder()
            .system(SYSTEM_PROMPT)
            .messages(history)
            .user(ctx.user_input.as_str())
            .build();

        let response = self.router.complete(request, self.timeout).await?;
        Ok(response.content().to_string())
    }
}
