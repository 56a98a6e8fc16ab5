//! Order status and shipment tracking

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{
    ChatRequest, DispatchContext, GatewayError, IntentHandler, Message, OrderStore,
};
use crate::infrastructure::llm::ModelRouter;

/// Order numbers look like ORD followed by eight digits
static ORDER_NO_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"ORD\d{8}").unwrap());

const SYSTEM_PROMPT: &str = "\
You are a professional e-commerce support assistant handling order questions.

Your duties:
1. Look up order status and details
2. Track shipments and logistics
3. Answer order-related questions

Answer rules:
- When the user supplied an order number, answer from the order details provided
- When no order number was supplied, ask the user to provide one
- Be accurate and clear
- Use a friendly tone";

/// Extracts an order number from the input and injects the matching record
#[derive(Debug)]
pub struct OrderHandler {
    router: Arc<ModelRouter>,
    orders: Arc<dyn OrderStore>,
    timeout: Duration,
}

impl OrderHandler {
    pub fn new(router: Arc<ModelRouter>, orders: Arc<dyn OrderStore>, timeout: Duration) -> Self {
        Self {
            router,
            orders,
            timeout,
        }
    }

    async fn order_context(&self, user_input: &str) -> Result<String, GatewayError> {
        let upper = user_input.to_uppercase();

        match ORDER_NO_PATTERN.find(&upper) {
            Some(found) => {
                let order_no = found.as_str();
                match self.orders.find(order_no).await? {
                    Some(order) => Ok(order.summary()),
                    None => Ok(format!(
                        "No order record was found for number {}. Ask the user to \
                         confirm the order number is correct.",
                        order_no
                    )),
                }
            }
            None => {
                let numbers = self.orders.order_numbers().await?;
                Ok(format!(
                    "No order number was detected in the message. Ask the user for \
                     their order number (example order numbers: {}).",
                    numbers.join(", ")
                ))
            }
        }
    }
}

#[async_trait]
impl IntentHandler for OrderHandler {
    fn id(&self) -> &'static str {
        "order"
    }

    fn description(&self) -> &'static str {
        "order status, shipment tracking, and logistics questions"
    }

    async fn handle(&self, ctx: &DispatchContext) -> Result<String, GatewayError> {
        let context = self.order_context(&ctx.user_input).await?;
        let history: Vec<Message> = ctx.history.iter().map(Message::from).collect();

        let request = if ctx.tool_calls_enabled {
            ChatRequest::builder()
                .system(SYSTEM_PROMPT)
                .messages(history)
                .tool(format!("Order details:\n\n{}", context))
                .user(ctx.user_input.as_str())
                .build()
        } else {
            ChatRequest::builder()
                .system(format!("{}\n\nOrder details:\n\n{}", SYSTEM_PROMPT, context))
                .messages(history)
                .user(ctx.user_input.as_str())
                .build()
        };

        let response = self.router.complete(request, self.timeout).await?;
        Ok(response.content().to_string())
    }
}
