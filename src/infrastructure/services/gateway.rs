//! Gateway service: the request pipeline behind `submit`
//!
//! Each request flows cache → dispatcher → session append → experiment
//! metrics. Backend outages surface as a fixed degraded reply instead of a
//! raw error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::domain::{
    CacheStats, ChatTurn, DispatchContext, DispatchOutcome, ExperimentStats, GatewayError,
    RouterStatus, SessionStore, Variant,
};
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::dispatch::IntentDispatcher;
use crate::infrastructure::experiment::TrafficAllocator;
use crate::infrastructure::llm::ModelRouter;
use crate::infrastructure::resilience::BreakerSnapshot;

/// Handler id reported alongside degraded replies
pub const DEGRADED_HANDLER_ID: &str = "degraded";

/// Fixed reply served when the backend is unavailable
pub const DEGRADED_MESSAGE: &str = "We are sorry, the assistant is temporarily unavailable. \
     Please try again in a moment, or call our service hotline 400-123-4567 if it is urgent.";

/// Aggregated operator view of the running system
#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub cache: CacheStats,
    pub breaker: BreakerSnapshot,
    pub router: RouterStatus,
    pub experiments: Vec<ExperimentStats>,
}

/// Front door of the gateway: one entry point per user request plus the
/// operator surface.
#[derive(Debug)]
pub struct GatewayService {
    cache: Arc<ResponseCache>,
    dispatcher: Arc<IntentDispatcher>,
    router: Arc<ModelRouter>,
    allocator: Arc<TrafficAllocator>,
    sessions: Arc<dyn SessionStore>,
}

impl GatewayService {
    pub fn new(
        cache: Arc<ResponseCache>,
        dispatcher: Arc<IntentDispatcher>,
        router: Arc<ModelRouter>,
        allocator: Arc<TrafficAllocator>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            cache,
            dispatcher,
            router,
            allocator,
            sessions,
        }
    }

    /// Answer one user message.
    ///
    /// History is taken from the caller when supplied, otherwise from the
    /// session store. Served responses are appended to the session either
    /// way. Backend outages (open breaker, transient errors that survived
    /// retries) yield the fixed degraded reply, which is never cached.
    pub async fn submit(
        &self,
        session_id: &str,
        user_input: &str,
        history: Option<Vec<ChatTurn>>,
    ) -> Result<DispatchOutcome, GatewayError> {
        let started = Instant::now();

        let history = match history {
            Some(history) => history,
            None => self.sessions.history(session_id).await?,
        };

        if let Some(payload) = self.cache.get(user_input).await? {
            match serde_json::from_str::<DispatchOutcome>(&payload) {
                Ok(outcome) => {
                    debug!(
                        session_id = %session_id,
                        handler = %outcome.handler_id,
                        "Serving cached response"
                    );
                    self.remember_turns(session_id, user_input, &outcome.response_text)
                        .await?;
                    self.record_metrics(session_id, started, true);
                    return Ok(outcome);
                }
                Err(err) => {
                    warn!(error = %err, "Cached payload failed to decode, invalidating");
                    self.cache.invalidate(user_input)?;
                }
            }
        }

        let ctx = DispatchContext::new(user_input)
            .with_history(history)
            .with_tool_calls(self.router.active_supports_tool_calls()?);

        match self.dispatcher.dispatch(&ctx).await {
            Ok(outcome) => {
                self.remember_turns(session_id, user_input, &outcome.response_text)
                    .await?;
                match serde_json::to_string(&outcome) {
                    Ok(payload) => self.cache.set(user_input, payload).await?,
                    Err(err) => warn!(error = %err, "Failed to encode outcome for caching"),
                }
                self.record_metrics(session_id, started, false);
                info!(
                    session_id = %session_id,
                    handler = %outcome.handler_id,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Request served"
                );
                Ok(outcome)
            }
            Err(err) if Self::is_degradable(&err) => {
                warn!(
                    session_id = %session_id,
                    error = %err,
                    "Backend unavailable, serving degraded reply"
                );
                let outcome = DispatchOutcome::new(DEGRADED_HANDLER_ID, DEGRADED_MESSAGE);
                self.remember_turns(session_id, user_input, &outcome.response_text)
                    .await?;
                Ok(outcome)
            }
            Err(err) => Err(err),
        }
    }

    /// Open breaker, or a transient fault that survived retries
    fn is_degradable(err: &GatewayError) -> bool {
        matches!(err, GatewayError::CircuitOpen { .. }) || err.is_transient()
    }

    async fn remember_turns(
        &self,
        session_id: &str,
        user_input: &str,
        reply: &str,
    ) -> Result<(), GatewayError> {
        self.sessions
            .append(session_id, ChatTurn::user(user_input))
            .await?;
        self.sessions
            .append(session_id, ChatTurn::assistant(reply))
            .await
    }

    /// Record latency and cache outcome to every enabled experiment
    fn record_metrics(&self, session_id: &str, started: Instant, cache_hit: bool) {
        let mut metrics: HashMap<String, Value> = HashMap::new();
        metrics.insert(
            "latency_ms".to_string(),
            json!(started.elapsed().as_millis() as u64),
        );
        metrics.insert(
            "cache_hit".to_string(),
            json!(if cache_hit { 1.0 } else { 0.0 }),
        );

        let experiments = match self.allocator.all_experiments() {
            Ok(experiments) => experiments,
            Err(err) => {
                warn!(error = %err, "Skipping experiment metrics");
                return;
            }
        };

        for experiment in experiments.iter().filter(|e| e.is_enabled()) {
            if let Err(err) =
                self.allocator
                    .record_result(experiment.name(), session_id, metrics.clone())
            {
                warn!(
                    experiment = experiment.name(),
                    error = %err,
                    "Failed to record experiment result"
                );
            }
        }
    }

    /// Cache, breaker, router, and experiment state in one report
    pub fn system_status(&self) -> Result<SystemStatus, GatewayError> {
        Ok(SystemStatus {
            cache: self.cache.stats()?,
            breaker: self.router.breaker().snapshot()?,
            router: self.router.status()?,
            experiments: self.allocator.export()?,
        })
    }

    /// Drop every cached response
    pub fn clear_cache(&self) -> Result<(), GatewayError> {
        self.cache.clear()
    }

    /// Drop the cached response for one query, if present
    pub fn invalidate_cached(&self, query: &str) -> Result<bool, GatewayError> {
        self.cache.invalidate(query)
    }

    /// Replace an experiment's traffic weights
    pub fn update_experiment_traffic(
        &self,
        name: &str,
        variants: Vec<Variant>,
    ) -> Result<(), GatewayError> {
        self.allocator.update_traffic(name, variants)
    }

    /// Toggle an experiment without touching its recorded history
    pub fn set_experiment_enabled(&self, name: &str, enabled: bool) -> Result<(), GatewayError> {
        self.allocator.set_enabled(name, enabled)
    }

    /// Force the backend breaker back to closed
    pub fn reset_breaker(&self) -> Result<(), GatewayError> {
        self.router.breaker().reset()
    }
}
