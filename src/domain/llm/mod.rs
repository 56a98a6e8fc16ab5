//! Backend chat domain models and traits

mod message;
mod provider;
mod request;
mod response;

pub use message::{Message, MessageRole};
pub use provider::LlmProvider;
pub use request::{ChatRequest, ChatRequestBuilder};
pub use response::{ChatResponse, FinishReason, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
