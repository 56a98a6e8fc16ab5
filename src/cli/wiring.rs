//! Component wiring shared by the CLI commands

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{AppConfig, ProviderSettings};
use crate::domain::{Experiment, ModelConfig, Variant};
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::dispatch::IntentDispatcher;
use crate::infrastructure::dispatch::handlers::{
    AftersalesHandler, ChitchatHandler, OrderHandler, ProductHandler,
};
use crate::infrastructure::embedding::OpenAiEmbeddingProvider;
use crate::infrastructure::experiment::TrafficAllocator;
use crate::infrastructure::llm::{HttpClient, ModelRouter, OpenAiCompatibleProvider};
use crate::infrastructure::orders::InMemoryOrderStore;
use crate::infrastructure::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use crate::infrastructure::retrieval::InMemoryRetriever;
use crate::infrastructure::services::GatewayService;
use crate::infrastructure::session::InMemorySessionStore;

/// Credential looked up for the semantic cache embeddings
const EMBEDDING_KEY_ENV: &str = "OPENAI_API_KEY";

fn chat_provider(
    settings: &ProviderSettings,
    api_key: &str,
) -> OpenAiCompatibleProvider<HttpClient> {
    match &settings.base_url {
        Some(url) => {
            OpenAiCompatibleProvider::with_base_url(HttpClient::new(), api_key, url.clone())
        }
        None => OpenAiCompatibleProvider::new(HttpClient::new(), api_key),
    }
}

fn model_config(settings: &ProviderSettings, api_key: &str) -> ModelConfig {
    let mut config = ModelConfig::new(settings.model.as_str())
        .with_api_key(api_key)
        .with_tool_calls(settings.supports_tool_calls);

    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(temperature) = settings.temperature {
        config = config.with_temperature(temperature);
    }

    config
}

fn build_router(config: &AppConfig) -> anyhow::Result<Arc<ModelRouter>> {
    if config.router.providers.is_empty() {
        anyhow::bail!("at least one provider must be configured");
    }

    let breaker = Arc::new(CircuitBreaker::new(
        "llm-backend",
        CircuitBreakerConfig::new()
            .with_failure_threshold(config.breaker.failure_threshold)
            .with_recovery_timeout(config.breaker.recovery_timeout())
            .with_half_open_max_calls(config.breaker.half_open_max_calls),
    ));
    let retry = RetryPolicy::new(config.retry.max_retries)
        .with_initial_delay(config.retry.initial_delay_ms);

    let mut router = ModelRouter::new(breaker, retry);
    for settings in &config.router.providers {
        let api_key = std::env::var(&settings.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            warn!(
                provider = %settings.id,
                env = %settings.api_key_env,
                "provider has no credential and will not serve traffic"
            );
        }

        router = router.register(
            settings.id.as_str(),
            model_config(settings, &api_key),
            Arc::new(chat_provider(settings, &api_key)),
        );
    }

    Ok(Arc::new(router))
}

fn build_cache(config: &AppConfig) -> Arc<ResponseCache> {
    let mut cache = ResponseCache::new(config.cache.clone());

    if config.cache.semantic_enabled {
        match std::env::var(EMBEDDING_KEY_ENV) {
            Ok(key) if !key.is_empty() => {
                let provider = OpenAiEmbeddingProvider::new(HttpClient::new(), key);
                cache = cache.with_embeddings(Arc::new(provider));
            }
            _ => warn!(
                env = EMBEDDING_KEY_ENV,
                "semantic cache enabled but no embedding credential found, exact matching only"
            ),
        }
    }

    Arc::new(cache)
}

fn seed_experiments(config: &AppConfig) -> anyhow::Result<Arc<TrafficAllocator>> {
    let allocator = TrafficAllocator::new();

    for seed in &config.experiments {
        let variants: Vec<Variant> = seed
            .variants
            .iter()
            .map(|v| Variant::new(v.name.as_str(), v.weight))
            .collect();

        let mut experiment =
            Experiment::new(seed.name.as_str(), variants)?.with_enabled(seed.enabled);
        if let Some(description) = &seed.description {
            experiment = experiment.with_description(description.as_str());
        }

        allocator.create_experiment(experiment)?;
    }

    Ok(Arc::new(allocator))
}

/// Build the full gateway from configuration.
///
/// Providers without credentials are still registered so `status` can
/// report them; the router skips them when selecting a backend.
pub fn build_gateway(config: &AppConfig) -> anyhow::Result<GatewayService> {
    let router = build_router(config)?;
    let cache = build_cache(config);
    let allocator = seed_experiments(config)?;

    let sessions = Arc::new(InMemorySessionStore::new(
        config.session.max_history,
        config.session.ttl(),
    ));
    let retriever = Arc::new(InMemoryRetriever::seeded());
    let orders = Arc::new(InMemoryOrderStore::seeded());

    let timeout = config.router.timeout();
    // Last registered handler doubles as the classification fallback
    let dispatcher = IntentDispatcher::new(router.clone(), timeout)
        .register(Arc::new(ProductHandler::new(
            router.clone(),
            retriever.clone(),
            timeout,
        )))
        .register(Arc::new(OrderHandler::new(router.clone(), orders, timeout)))
        .register(Arc::new(AftersalesHandler::new(
            router.clone(),
            retriever,
            timeout,
        )))
        .register(Arc::new(ChitchatHandler::new(router.clone(), timeout)));

    info!(
        providers = config.router.providers.len(),
        experiments = config.experiments.len(),
        "gateway assembled"
    );

    Ok(GatewayService::new(
        cache,
        Arc::new(dispatcher),
        router,
        allocator,
        sessions,
    ))
}
