//! Infrastructure layer - concrete implementations behind the domain traits

pub mod cache;
pub mod dispatch;
pub mod embedding;
pub mod experiment;
pub mod llm;
pub mod logging;
pub mod orders;
pub mod resilience;
pub mod retrieval;
pub mod services;
pub mod session;
