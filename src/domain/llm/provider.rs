use async_trait::async_trait;
use std::fmt::Debug;

use super::{ChatRequest, ChatResponse};
use crate::domain::GatewayError;

/// Trait for text-generation backends (OpenAI, DashScope, compatible gateways)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: ChatRequest) -> Result<ChatResponse, GatewayError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::llm::Message;

    /// Scripted provider for tests. Replies are consumed in order; once the
    /// script is exhausted the default reply (if any) repeats.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        script: Mutex<VecDeque<Result<String, String>>>,
        default_reply: Option<String>,
        calls: AtomicUsize,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                script: Mutex::new(VecDeque::new()),
                default_reply: None,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn with_reply(self, content: impl Into<String>) -> Self {
            self.script
                .lock()
                .unwrap()
                .push_back(Ok(content.into()));
            self
        }

        pub fn with_failure(self, message: impl Into<String>) -> Self {
            self.script
                .lock()
                .unwrap()
                .push_back(Err(message.into()));
            self
        }

        pub fn with_default_reply(mut self, content: impl Into<String>) -> Self {
            self.default_reply = Some(content.into());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<ChatRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(
            &self,
            model: &str,
            request: ChatRequest,
        ) -> Result<ChatResponse, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);

            let scripted = self.script.lock().unwrap().pop_front();
            let content = match scripted {
                Some(Ok(content)) => content,
                Some(Err(message)) => return Err(GatewayError::provider(self.name, message)),
                None => match &self.default_reply {
                    Some(content) => content.clone(),
                    None => {
                        return Err(GatewayError::provider(self.name, "no scripted reply left"));
                    }
                },
            };

            Ok(ChatResponse::new(
                format!("mock-{call}"),
                model,
                Message::assistant(content),
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
