//! Product questions answered from the knowledge base

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    ChatRequest, DispatchContext, GatewayError, IntentHandler, KnowledgeRetriever, Message,
    RetrievedPassage,
};
use crate::infrastructure::llm::ModelRouter;

const RETRIEVAL_K: usize = 3;

const SYSTEM_PROMPT: &str = "\
You are a professional e-commerce support assistant answering product questions.

Your duties:
1. Answer questions about product specifications, pricing, and features
2. Recommend suitable products for the user's needs
3. Explain promotions and discount policies

Answer rules:
- Base your answers on the knowledge base passages provided
- When the passages do not cover the question, say so honestly and suggest \
contacting a human agent
- Keep answers accurate, professional, and concise
- Use a friendly tone";

fn format_passages(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return "No relevant information was found in the knowledge base.".to_string();
    }

    passages
        .iter()
        .map(|p| format!("[{}]\n{}", p.source, p.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Answers product questions from retrieved knowledge base passages
#[derive(Debug)]
pub struct ProductHandler {
    router: Arc<ModelRouter>,
    retriever: Arc<dyn KnowledgeRetriever>,
    timeout: Duration,
}

impl ProductHandler {
    pub fn new(
        router: Arc<ModelRouter>,
        retriever: Arc<dyn KnowledgeRetriever>,
        timeout: Duration,
    ) -> Self {
        Self {
            router,
            retriever,
            timeout,
        }
    }
}

#[async_trait]
impl IntentHandler for ProductHandler {
    fn id(&self) -> &'static str {
        "product"
    }

    fn description(&self) -> &'static str {
        "product questions, pricing, recommendations, promotions, and discount policies"
    }

    async fn handle(&self, ctx: &DispatchContext) -> Result<String, GatewayError> {
        let passages = self.retriever.search(&ctx.user_input, RETRIEVAL_K).await?;
        let context = format_passages(&passages);
        let history: Vec<Message> = ctx.history.iter().map(Message::from).collect();

        let request = if ctx.tool_calls_enabled {
            ChatRequest::builder()
                .system(SYSTEM_PROMPT)
                .messages(history)
                .tool(format!("Knowledge base passages:\n\n{}", context))
                .user(ctx.user_input.as_str())
                .build()
        } else {
            ChatRequest::builder()
                .system(format!(
                    "{}\n\nRelevant knowledge base passages:\n\n{}",
                    SYSTEM_PROMPT, context
                ))
                .messages(history)
                .user(ctx.user_input.as_str())
                .build()
        };

        let response = self.router.complete(request, self.timeout).await?;
        Ok(response.content().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::retrieval::mock::MockRetriever;
    use crate::domain::{MessageRole, ModelConfig};
    use crate::infrastructure::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};

    fn router(provider: Arc<MockLlmProvider>) -> Arc<ModelRouter> {
        let breaker = Arc::new(CircuitBreaker::new(
            "product-test",
            CircuitBreakerConfig::default(),
        ));
        Arc::new(ModelRouter::new(breaker, RetryPolicy::new(0)).register(
            "mock",
            ModelConfig::new("test-model").with_api_key("key"),
            provider,
        ))
    }

    fn handler(
        provider: Arc<MockLlmProvider>,
        retriever: MockRetriever,
    ) -> ProductHandler {
        ProductHandler::new(
            router(provider),
            Arc::new(retriever),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_passages_folded_into_system_prompt() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_reply("32 hours"));
        let retriever =
            MockRetriever::new().with_passage("battery lasts 32 hours", "product_catalog");
        let handler = handler(provider.clone(), retriever);

        let reply = handler
            .handle(&DispatchContext::new("how long does the battery last"))
            .await
            .unwrap();

        assert_eq!(reply, "32 hours");
        let request = provider.last_request().unwrap();
        let system = &request.messages[0];
        assert_eq!(system.role, MessageRole::System);
        assert!(system.content.contains("[product_catalog]"));
        assert!(system.content.contains("battery lasts 32 hours"));
    }

    #[tokio::test]
    async fn test_passages_attached_as_tool_message_when_enabled() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_reply("32 hours"));
        let retriever =
            MockRetriever::new().with_passage("battery lasts 32 hours", "product_catalog");
        let handler = handler(provider.clone(), retriever);

        let ctx = DispatchContext::new("how long does the battery last").with_tool_calls(true);
        handler.handle(&ctx).await.unwrap();

        let request = provider.last_request().unwrap();
        assert!(!request.messages[0].content.contains("battery lasts"));
        let tool = request
            .messages
            .iter()
            .find(|m| m.role == MessageRole::Tool)
            .unwrap();
        assert!(tool.content.contains("battery lasts 32 hours"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_admits_no_information() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_reply("I don't know"));
        let handler = handler(provider.clone(), MockRetriever::new());

        handler
            .handle(&DispatchContext::new("do you sell spaceships"))
            .await
            .unwrap();

        let system = &provider.last_request().unwrap().messages[0];
        assert!(
            system
                .content
                .contains("No relevant information was found in the knowledge base.")
        );
    }
}
