//! Model routing domain types

use serde::{Deserialize, Serialize};

/// Configuration for a single backend model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name as the provider knows it (e.g. "gpt-4o-mini")
    pub model: String,

    /// API credential, absent when the provider is not usable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override for OpenAI-compatible endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Temperature for response randomness
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whether the model accepts tool-role messages
    #[serde(default)]
    pub supports_tool_calls: bool,
}

fn default_temperature() -> f32 {
    0.7
}

impl ModelConfig {
    /// Create a config for the given model name
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            supports_tool_calls: false,
        }
    }

    /// Set the API credential
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Mark the model as accepting tool-role messages
    pub fn with_tool_calls(mut self, supported: bool) -> Self {
        self.supports_tool_calls = supported;
        self
    }

    /// Whether a usable credential is present
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Availability report for one registered provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Provider identifier (e.g. "openai")
    pub id: String,
    /// Model name the provider serves
    pub model: String,
    /// Whether a credential is configured
    pub available: bool,
    /// Whether the model accepts tool-role messages
    pub supports_tool_calls: bool,
}

/// Snapshot of the router's current selection
#[derive(Debug, Clone, Serialize)]
pub struct RouterStatus {
    /// Identifier of the provider currently serving traffic
    pub active: String,
    /// Identifier of the configured default provider
    pub default: String,
    /// Identifier of the fallback provider, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Whether traffic is currently on the fallback
    pub using_fallback: bool,
    /// Per-provider availability
    pub providers: Vec<ProviderStatus>,
}
