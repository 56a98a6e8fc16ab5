//! Helpdesk gateway - resilient LLM front door for customer support
//!
//! Routes user questions to intent-specific handlers backed by
//! OpenAI-compatible chat models, with response caching, circuit breaking,
//! retry with failover, per-session conversation history, and deterministic
//! A/B traffic allocation.
//!
//! The crate is split into three layers:
//! - [`domain`]: core types, traits, and errors
//! - [`infrastructure`]: concrete implementations (cache, router, handlers)
//! - [`cli`]: command-line entry points and component wiring

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
