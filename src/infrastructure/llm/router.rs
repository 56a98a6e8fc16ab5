//! Model router: provider selection, failover, and breaker-wrapped calls
//!
//! The first registered provider is the primary. The fallback is the first
//! other provider holding a credential. Every backend call goes through the
//! shared circuit breaker and is bounded by the caller's timeout; a timeout
//! counts as a breaker failure.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::{
    ChatRequest, ChatResponse, GatewayError, LlmProvider, ModelConfig, ProviderStatus,
    RouterStatus,
};
use crate::infrastructure::resilience::{CircuitBreaker, RetryPolicy};

#[derive(Debug)]
struct ProviderEntry {
    id: String,
    config: ModelConfig,
    provider: Arc<dyn LlmProvider>,
}

#[derive(Debug, Default)]
struct RouterState {
    /// Explicit override of the active provider; None means the primary
    active: Option<String>,
    using_fallback: bool,
}

/// Routes chat requests to configured providers
#[derive(Debug)]
pub struct ModelRouter {
    providers: Vec<ProviderEntry>,
    breaker: Arc<CircuitBreaker<ChatResponse>>,
    retry: RetryPolicy,
    state: RwLock<RouterState>,
}

impl ModelRouter {
    /// Create a router with no providers registered yet
    pub fn new(breaker: Arc<CircuitBreaker<ChatResponse>>, retry: RetryPolicy) -> Self {
        Self {
            providers: Vec::new(),
            breaker,
            retry,
            state: RwLock::new(RouterState::default()),
        }
    }

    /// Register a provider; the first one registered is the primary
    pub fn register(
        mut self,
        id: impl Into<String>,
        config: ModelConfig,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let id = id.into();
        info!(
            provider = %id,
            model = %config.model,
            available = config.has_credential(),
            "Provider registered"
        );
        self.providers.push(ProviderEntry {
            id,
            config,
            provider,
        });
        self
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, RouterState>, GatewayError> {
        self.state
            .read()
            .map_err(|e| GatewayError::internal(format!("Router lock poisoned: {}", e)))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, RouterState>, GatewayError> {
        self.state
            .write()
            .map_err(|e| GatewayError::internal(format!("Router lock poisoned: {}", e)))
    }

    fn entry(&self, id: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|e| e.id == id)
    }

    /// Id of the statically configured primary provider
    pub fn primary_id(&self) -> Result<String, GatewayError> {
        self.providers
            .first()
            .map(|e| e.id.clone())
            .ok_or_else(|| GatewayError::configuration("No providers registered"))
    }

    /// First non-primary provider holding a credential, if any
    pub fn fallback_id(&self) -> Option<String> {
        self.providers
            .iter()
            .skip(1)
            .find(|e| e.config.has_credential())
            .map(|e| e.id.clone())
    }

    /// Id of the provider currently serving traffic
    pub fn active_id(&self) -> Result<String, GatewayError> {
        if let Some(id) = self.read_state()?.active.clone() {
            return Ok(id);
        }
        self.primary_id()
    }

    /// Whether the active provider accepts tool-role messages
    pub fn active_supports_tool_calls(&self) -> Result<bool, GatewayError> {
        let active = self.active_id()?;
        Ok(self
            .entry(&active)
            .map(|e| e.config.supports_tool_calls)
            .unwrap_or(false))
    }

    /// Point traffic at the fallback provider; returns false when none exists
    pub fn switch_to_fallback(&self) -> Result<bool, GatewayError> {
        let Some(fallback) = self.fallback_id() else {
            warn!("No fallback provider with a credential configured");
            return Ok(false);
        };

        let mut state = self.write_state()?;
        state.active = Some(fallback.clone());
        state.using_fallback = true;

        warn!(provider = %fallback, "Switched to fallback provider");
        Ok(true)
    }

    /// Point traffic back at the primary provider
    pub fn switch_to_primary(&self) -> Result<(), GatewayError> {
        let mut state = self.write_state()?;
        state.active = None;
        state.using_fallback = false;

        info!("Switched back to primary provider");
        Ok(())
    }

    /// Availability report for all providers plus the current selection
    pub fn status(&self) -> Result<RouterStatus, GatewayError> {
        let providers = self
            .providers
            .iter()
            .map(|e| ProviderStatus {
                id: e.id.clone(),
                model: e.config.model.clone(),
                available: e.config.has_credential(),
                supports_tool_calls: e.config.supports_tool_calls,
            })
            .collect();

        Ok(RouterStatus {
            active: self.active_id()?,
            default: self.primary_id()?,
            fallback: self.fallback_id(),
            using_fallback: self.read_state()?.using_fallback,
            providers,
        })
    }

    /// Send a request to the active provider, failing over once
    ///
    /// A transient failure on the primary switches traffic to the fallback
    /// and retries the request there before surfacing anything.
    pub async fn complete(
        &self,
        request: ChatRequest,
        timeout: Duration,
    ) -> Result<ChatResponse, GatewayError> {
        let active = self.active_id()?;

        match self.complete_with(&active, request.clone(), timeout).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_transient() => {
                let already_on_fallback = self.read_state()?.using_fallback;
                if !already_on_fallback && self.switch_to_fallback()? {
                    let fallback = self.active_id()?;
                    warn!(
                        from = %active,
                        to = %fallback,
                        error = %err,
                        "Primary call failed, retrying on fallback"
                    );
                    self.complete_with(&fallback, request, timeout).await
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Send a request to one specific provider, breaker-wrapped and retried
    pub async fn complete_with(
        &self,
        id: &str,
        request: ChatRequest,
        timeout: Duration,
    ) -> Result<ChatResponse, GatewayError> {
        let entry = self.entry(id).ok_or_else(|| {
            GatewayError::not_found(format!("Provider '{}' is not registered", id))
        })?;

        if !entry.config.has_credential() {
            return Err(GatewayError::configuration(format!(
                "Provider '{}' has no credential configured",
                id
            )));
        }

        let mut request = request;
        if request.temperature.is_none() {
            request.temperature = Some(entry.config.temperature);
        }

        let model = entry.config.model.clone();
        let provider = entry.provider.clone();

        self.retry
            .run(id, || {
                let request = request.clone();
                let provider = provider.clone();
                let model = model.clone();
                async move {
                    self.breaker
                        .call(|| async move {
                            match tokio::time::timeout(timeout, provider.chat(&model, request))
                                .await
                            {
                                Ok(result) => result,
                                Err(_) => Err(GatewayError::timeout(
                                    timeout.as_millis() as u64,
                                    format!("chat call via '{}'", model),
                                )),
                            }
                        })
                        .await
                }
            })
            .await
    }

    /// Snapshot of the breaker guarding backend calls
    pub fn breaker(&self) -> &CircuitBreaker<ChatResponse> {
        &self.breaker
    }
}
