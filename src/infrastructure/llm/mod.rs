//! LLM provider implementations and routing

mod http_client;
mod openai_compatible;
mod router;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai_compatible::OpenAiCompatibleProvider;
pub use router::ModelRouter;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
