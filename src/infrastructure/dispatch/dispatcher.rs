//! Model-backed intent classification and handler dispatch

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::{ChatRequest, DispatchContext, DispatchOutcome, GatewayError, IntentHandler};
use crate::infrastructure::llm::ModelRouter;

/// Routes each request to one registered handler.
///
/// Classification asks the backend model to name a handler from the
/// registered set; the reply is matched case-insensitively against handler
/// ids in registration order. No match, and any classification failure,
/// falls back to the last registered handler.
#[derive(Debug)]
pub struct IntentDispatcher {
    handlers: Vec<Arc<dyn IntentHandler>>,
    router: Arc<ModelRouter>,
    timeout: Duration,
}

impl IntentDispatcher {
    pub fn new(router: Arc<ModelRouter>, timeout: Duration) -> Self {
        Self {
            handlers: Vec::new(),
            router,
            timeout,
        }
    }

    /// Register a handler. Registration order is the match priority; the
    /// last registered handler doubles as the classification fallback.
    pub fn register(mut self, handler: Arc<dyn IntentHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    fn routing_prompt(&self, user_input: &str) -> String {
        let mut prompt = String::from(
            "You are the router of a customer service system. Decide which specialist \
             handler should take the user's input.\n\nAvailable handlers:\n",
        );
        for (i, handler) in self.handlers.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {} - {}\n",
                i + 1,
                handler.id(),
                handler.description()
            ));
        }
        let names: Vec<&str> = self.handlers.iter().map(|h| h.id()).collect();
        prompt.push_str(&format!(
            "\nUser input: {}\n\nReply with exactly one handler name ({}) and nothing else.",
            user_input,
            names.join("/")
        ));
        prompt
    }

    async fn classify(&self, user_input: &str) -> Result<&Arc<dyn IntentHandler>, GatewayError> {
        let fallback = self
            .handlers
            .last()
            .ok_or_else(|| GatewayError::configuration("No intent handlers registered"))?;

        let request = ChatRequest::builder().user(self.routing_prompt(user_input)).build();

        match self.router.complete(request, self.timeout).await {
            Ok(response) => {
                let choice = response.content().trim().to_lowercase();
                for handler in &self.handlers {
                    if choice.contains(&handler.id().to_lowercase()) {
                        return Ok(handler);
                    }
                }
                warn!(
                    choice = %choice,
                    fallback = fallback.id(),
                    "Unrecognized classification, using fallback"
                );
                Ok(fallback)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = fallback.id(),
                    "Classification call failed, using fallback"
                );
                Ok(fallback)
            }
        }
    }

    /// Classify the request and run the chosen handler
    pub async fn dispatch(&self, ctx: &DispatchContext) -> Result<DispatchOutcome, GatewayError> {
        let handler = self.classify(&ctx.user_input).await?;
        info!(handler = handler.id(), "Dispatching to handler");

        let reply = handler.handle(ctx).await?;
        Ok(DispatchOutcome::new(handler.id(), reply))
    }
}
