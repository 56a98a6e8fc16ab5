//! Domain layer - Core business logic and entities

pub mod cache;
pub mod dispatch;
pub mod embedding;
pub mod error;
pub mod experiment;
pub mod llm;
pub mod orders;
pub mod retrieval;
pub mod routing;
pub mod session;

pub use cache::{CacheEntry, CacheStats, ResponseCacheConfig, cache_key, normalize_query};
pub use dispatch::{DispatchContext, DispatchOutcome, IntentHandler};
pub use embedding::{EmbeddingProvider, cosine_similarity};
pub use error::GatewayError;
pub use experiment::{
    Experiment, ExperimentResult, ExperimentStats, MetricSummary, Variant, VariantStats,
    WEIGHT_SUM_TOLERANCE, validate_weights,
};
pub use llm::{
    ChatRequest, ChatRequestBuilder, ChatResponse, FinishReason, LlmProvider, Message, MessageRole,
    Usage,
};
pub use orders::{LogisticsEvent, OrderRecord, OrderStore, Shipment};
pub use retrieval::{KnowledgeRetriever, RetrievedPassage};
pub use routing::{ModelConfig, ProviderStatus, RouterStatus};
pub use session::{ChatTurn, SessionStore};
