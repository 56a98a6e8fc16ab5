//! Circuit breaker for backend call protection
//!
//! Classic three-state breaker: Closed passes calls through, Open fails fast
//! after too many consecutive failures, HalfOpen lets trial calls probe for
//! recovery. Only transient errors count toward opening the circuit.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::error::GatewayError;

/// Transition history kept per breaker
const MAX_TRANSITIONS: usize = 50;

/// Current epoch millis
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Circuit breaker tuning parameters
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing recovery
    pub recovery_timeout: Duration,
    /// Consecutive successes in half-open needed to close
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold (minimum 1)
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Set the recovery timeout
    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Set the half-open success requirement (minimum 1)
    pub fn with_half_open_max_calls(mut self, calls: u32) -> Self {
        self.half_open_max_calls = calls.max(1);
        self
    }
}

/// Breaker operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, calls pass through
    Closed,
    /// Failing fast, calls are rejected
    Open,
    /// Probing recovery with trial calls
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// One recorded state change
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from: CircuitState,
    pub to: CircuitState,
    /// When the transition happened (epoch millis)
    pub at: u64,
}

/// Serializable view of a breaker for status reports
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Last counted failure (epoch millis), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_at: Option<u64>,
    pub transitions: Vec<TransitionRecord>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    last_failure_at: Option<u64>,
    total_calls: u64,
    success_count: u64,
    failure_count: u64,
    transitions: Vec<TransitionRecord>,
}

impl Default for BreakerInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            last_failure_at: None,
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            transitions: Vec::new(),
        }
    }
}

/// Circuit breaker protecting calls that produce a `T`
///
/// All state decisions go through one mutex. The lock is never held across
/// the protected operation itself, only around the allow check and the
/// result bookkeeping. An optional fallback producer supplies a degraded
/// value when the circuit rejects a call or a counted failure occurs.
pub struct CircuitBreaker<T> {
    name: String,
    config: CircuitBreakerConfig,
    fallback: Option<Box<dyn Fn() -> T + Send + Sync>>,
    inner: Mutex<BreakerInner>,
}

impl<T> fmt::Debug for CircuitBreaker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> CircuitBreaker<T> {
    /// Create a new breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();

        info!(
            breaker = %name,
            failure_threshold = config.failure_threshold,
            recovery_timeout_ms = config.recovery_timeout.as_millis() as u64,
            half_open_max_calls = config.half_open_max_calls,
            "Circuit breaker initialized"
        );

        Self {
            name,
            config,
            fallback: None,
            inner: Mutex::new(BreakerInner::default()),
        }
    }

    /// Attach a fallback producer used when the circuit rejects or a
    /// counted failure occurs
    pub fn with_fallback(mut self, fallback: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Get the breaker name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, BreakerInner>, GatewayError> {
        self.inner
            .lock()
            .map_err(|e| GatewayError::internal(format!("Breaker lock poisoned: {}", e)))
    }

    fn transition(name: &str, inner: &mut BreakerInner, to: CircuitState, now: u64) {
        if inner.state == to {
            return;
        }

        let from = inner.state;
        inner.state = to;

        if inner.transitions.len() == MAX_TRANSITIONS {
            inner.transitions.remove(0);
        }
        inner.transitions.push(TransitionRecord { from, to, at: now });

        if to == CircuitState::HalfOpen {
            inner.half_open_successes = 0;
        }

        info!(breaker = %name, %from, %to, "Circuit breaker state change");
    }

    /// Move an open circuit to half-open once the recovery timeout has passed
    fn maybe_probe(&self, inner: &mut BreakerInner, now: u64) {
        if inner.state != CircuitState::Open {
            return;
        }

        let elapsed = inner
            .last_failure_at
            .map(|at| now.saturating_sub(at))
            .unwrap_or(u64::MAX);

        if elapsed >= self.config.recovery_timeout.as_millis() as u64 {
            Self::transition(&self.name, inner, CircuitState::HalfOpen, now);
        }
    }

    /// Current state, applying the lazy open-to-half-open transition
    pub fn state(&self) -> Result<CircuitState, GatewayError> {
        let mut inner = self.lock()?;
        self.maybe_probe(&mut inner, now_millis());
        Ok(inner.state)
    }

    /// Execute an operation under breaker protection
    ///
    /// Transient errors are counted and may open the circuit; other errors
    /// pass through untouched. When the circuit is open, or a counted
    /// failure occurs, the fallback produces the result if one is set.
    pub async fn call<F, Fut>(&self, operation: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let allowed = {
            let mut inner = self.lock()?;
            self.maybe_probe(&mut inner, now_millis());
            inner.state != CircuitState::Open
        };

        if !allowed {
            warn!(breaker = %self.name, "Circuit open, rejecting call");
            return match &self.fallback {
                Some(produce) => Ok(produce()),
                None => Err(GatewayError::circuit_open(&self.name)),
            };
        }

        match operation().await {
            Ok(value) => {
                let mut inner = self.lock()?;
                self.record_success(&mut inner);
                Ok(value)
            }
            Err(err) if err.is_transient() => {
                {
                    let mut inner = self.lock()?;
                    self.record_failure(&mut inner, &err);
                }
                match &self.fallback {
                    Some(produce) => Ok(produce()),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn record_success(&self, inner: &mut BreakerInner) {
        inner.total_calls += 1;
        inner.success_count += 1;
        inner.consecutive_failures = 0;

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes >= self.config.half_open_max_calls {
                Self::transition(&self.name, inner, CircuitState::Closed, now_millis());
            }
        }
    }

    fn record_failure(&self, inner: &mut BreakerInner, err: &GatewayError) {
        let now = now_millis();

        inner.total_calls += 1;
        inner.failure_count += 1;
        inner.consecutive_failures += 1;
        inner.last_failure_at = Some(now);

        warn!(breaker = %self.name, error = %err, "Protected call failed");

        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    Self::transition(&self.name, inner, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => {
                Self::transition(&self.name, inner, CircuitState::Open, now);
            }
            CircuitState::Open => {}
        }
    }

    /// Return the breaker to Closed and clear all counters and history
    pub fn reset(&self) -> Result<(), GatewayError> {
        let mut inner = self.lock()?;
        *inner = BreakerInner::default();

        info!(breaker = %self.name, "Circuit breaker reset");
        Ok(())
    }

    /// Snapshot the breaker for status reporting
    pub fn snapshot(&self) -> Result<BreakerSnapshot, GatewayError> {
        let mut inner = self.lock()?;
        self.maybe_probe(&mut inner, now_millis());

        Ok(BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_calls: inner.total_calls,
            success_count: inner.success_count,
            failure_count: inner.failure_count,
            last_failure_at: inner.last_failure_at,
            transitions: inner.transitions.clone(),
        })
    }
}
