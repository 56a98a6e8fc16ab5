//! Returns, refunds, and complaint handling

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    ChatRequest, DispatchContext, GatewayError, IntentHandler, KnowledgeRetriever, Message,
};
use crate::infrastructure::llm::ModelRouter;

const RETRIEVAL_K: usize = 2;

const SYSTEM_PROMPT: &str = "\
You are a professional e-commerce support assistant handling after-sales issues.

Your duties:
1. Handle return and exchange requests
2. Answer questions about after-sales policy
3. Take complaints and suggestions seriously
4. Walk users through the right after-sales steps

Answer rules:
- Base your answers on the policy reference provided
- For returns and exchanges, guide the user through the correct procedure
- Be sincere and solution-minded
- Offer to escalate to a human agent when needed";

/// Shown when the knowledge base has nothing relevant
const BASELINE_POLICY: &str = "\
Baseline after-sales policy:
1. No-questions-asked returns within 7 days of receipt while the item is unopened
2. Quality defects are repaired or replaced free of charge under warranty
3. Refunds arrive via the original payment method within 3 to 7 business days
4. Service hotline: 400-123-4567";

/// Answers after-sales questions from retrieved policy passages
#[derive(Debug)]
pub struct AftersalesHandler {
    router: Arc<ModelRouter>,
    retriever: Arc<dyn KnowledgeRetriever>,
    timeout: Duration,
}

impl AftersalesHandler {
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

    async fn policy_context(&self, user_input: &str) -> Result<String, GatewayError> {
        let passages = self.retriever.search(user_input, RETRIEVAL_K).await?;
        if passages.is_empty() {
            return Ok(BASELINE_POLICY.to_string());
        }

        Ok(passages
            .iter()
            .map(|p| format!("[{}]\n{}", p.source, p.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n"))
    }
}

#[async_trait]
impl IntentHandler for AftersalesHandler {
    fn id(&self) -> &'static str {
        "aftersales"
    }

    fn description(&self) -> &'static str {
        "returns, exchanges, refunds, complaints, repairs, and after-sales policy"
    }

    async fn handle(&self, ctx: &DispatchContext) -> Result<String, GatewayError> {
        let context = self.policy_context(&ctx.user_input).await?;
        let history: Vec<Message> = ctx.history.iter().map(Message::from).collect();

        let request = if ctx.tool_calls_enabled {
            ChatRequest::builder()
                .system(SYSTEM_PROMPT)
                .messages(history)
                .tool(format!("After-sales policy reference:\n\n{}", context))
                .user(ctx.user_input.as_str())
                .build()
        } else {
            ChatRequest::builder()
                .system(format!(
                    "{}\n\nAfter-sales policy reference:\n\n{}",
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
