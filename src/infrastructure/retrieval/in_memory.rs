//! In-memory knowledge retriever backed by seeded passages

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{GatewayError, KnowledgeRetriever, RetrievedPassage};

/// Keyword-overlap retriever over a fixed passage list.
///
/// Scores each passage by the number of query tokens it shares with the
/// passage text and returns the top `k` non-zero matches, best first.
#[derive(Debug, Default)]
pub struct InMemoryRetriever {
    passages: Vec<RetrievedPassage>,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passage(mut self, text: impl Into<String>, source: impl Into<String>) -> Self {
        self.passages.push(RetrievedPassage::new(text, source));
        self
    }

    /// Retriever pre-loaded with the built-in helpdesk knowledge base:
    /// product catalog, after-sales policy, delivery guide, and promotions.
    pub fn seeded() -> Self {
        Self::new()
            .with_passage(
                "The Lumina X1 wireless earbuds offer 32 hours of battery life with the \
                 charging case, active noise cancellation, and Bluetooth 5.3. Available \
                 in black and white.",
                "product_catalog",
            )
            .with_passage(
                "The Lumina Watch S2 has a 1.8 inch AMOLED display, heart rate and sleep \
                 tracking, and a seven day battery. It is water resistant to 5 ATM.",
                "product_catalog",
            )
            .with_passage(
                "The Aurora 15 laptop ships with 16 GB of memory, a 512 GB SSD, and a \
                 15.6 inch display. A one year manufacturer warranty is included.",
                "product_catalog",
            )
            .with_passage(
                "Returns are accepted within 7 days of delivery for any reason, provided \
                 the item is unused and in its original packaging. Refunds are issued to \
                 the original payment method within 5 business days.",
                "after_sales_policy",
            )
            .with_passage(
                "Products with quality defects can be exchanged free of charge within 15 \
                 days. After 15 days, defects are handled under the one year warranty.",
                "after_sales_policy",
            )
            .with_passage(
                "To request a refund, submit the order number through the service desk. \
                 Return shipping for quality issues is covered by the store; for other \
                 returns the buyer pays shipping.",
                "after_sales_policy",
            )
            .with_passage(
                "Standard delivery takes 3 to 5 business days. Orders placed before 2 PM \
                 ship the same day.",
                "delivery_guide",
            )
            .with_passage(
                "Express delivery arrives within 48 hours in major cities for a flat fee. \
                 Standard shipping is free on orders over 99 dollars.",
                "delivery_guide",
            )
            .with_passage(
                "New customers receive a 10 percent discount on their first order with \
                 the code WELCOME10. The code cannot be combined with other promotions.",
                "promotions",
            )
    }

    pub fn passage_count(&self) -> usize {
        self.passages.len()
    }
}

/// Lowercased word tokens of at least three characters
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 3)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl KnowledgeRetriever for InMemoryRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, GatewayError> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &RetrievedPassage)> = self
            .passages
            .iter()
            .map(|passage| {
                let overlap = tokenize(&passage.text)
                    .intersection(&query_tokens)
                    .count();
                (overlap, passage)
            })
            .filter(|(overlap, _)| *overlap > 0)
            .collect();

        // Stable sort keeps seed order among equally scored passages
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let results: Vec<RetrievedPassage> = scored
            .into_iter()
            .take(k)
            .map(|(_, passage)| passage.clone())
            .collect();

        debug!(
            query = %query,
            k = k,
            matches = results.len(),
            "knowledge search completed"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retriever() -> InMemoryRetriever {
        InMemoryRetriever::new()
            .with_passage("Standard delivery takes 3 to 5 business days", "delivery")
            .with_passage("Returns are accepted within 7 days of delivery", "returns")
            .with_passage("The Lumina X1 earbuds support noise cancellation", "catalog")
    }

    #[tokio::test]
    async fn test_best_overlap_ranks_first() {
        let retriever = retriever();

        let results = retriever
            .search("how many days does standard delivery take", 3)
            .await
            .unwrap();

        assert_eq!(results[0].source, "delivery");
        assert!(results.len() >= 2);
    }

    #[tokio::test]
    async fn test_no_overlap_returns_empty() {
        let retriever = retriever();

        let results = retriever.search("quantum flux capacitors", 3).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_k_caps_results() {
        let retriever = retriever();

        let results = retriever.search("delivery days", 1).await.unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let retriever = retriever();

        let results = retriever.search("LUMINA EARBUDS", 3).await.unwrap();

        assert_eq!(results[0].source, "catalog");
    }

    #[tokio::test]
    async fn test_seeded_corpus_covers_shipping_questions() {
        let retriever = InMemoryRetriever::seeded();

        let results = retriever
            .search("how long does standard delivery take", 3)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].source, "delivery_guide");
    }
}
