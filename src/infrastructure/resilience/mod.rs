//! Failure isolation: circuit breaking and retry

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{
    BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState, TransitionRecord,
};
pub use retry::RetryPolicy;
