//! Knowledge retrieval collaborator trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::GatewayError;

/// A retrieved text snippet with the identifier of its source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub source: String,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Trait for knowledge-base search backends
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync + Debug {
    /// Top-k passages for the query, best match first. May be empty.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, GatewayError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Retriever returning a fixed passage list regardless of query
    #[derive(Debug, Default)]
    pub struct MockRetriever {
        passages: Vec<RetrievedPassage>,
    }

    impl MockRetriever {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_passage(mut self, text: impl Into<String>, source: impl Into<String>) -> Self {
            self.passages.push(RetrievedPassage::new(text, source));
            self
        }
    }

    #[async_trait]
    impl KnowledgeRetriever for MockRetriever {
        async fn search(
            &self,
            _query: &str,
            k: usize,
        ) -> Result<Vec<RetrievedPassage>, GatewayError> {
            Ok(self.passages.iter().take(k).cloned().collect())
        }
    }
}
