//! Product and FAQ retrieval.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use super::{Tool, ToolOutcome};
use crate::core::SourceKind;
use crate::knowledge::{KnowledgeStore, QueryFilter, QueryHit};

/// Observation when nothing matched.
pub const NO_RESULTS: &str = "No relevant documents found in the knowledge base.";

/// Observation when retrieval failed.
pub const RETRIEVAL_UNAVAILABLE: &str =
    "No information found: the knowledge base is not available right now.";

/// Input for [`KnowledgeSearchTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeSearchInput {
    /// What the customer wants to know, in natural language.
    pub query: String,
    /// Restrict results to products or FAQs.
    #[serde(default)]
    pub document_type: Option<SourceKind>,
}

/// Similarity search over the product catalogue and FAQs.
#[derive(Debug, Clone)]
pub struct KnowledgeSearchTool {
    store: Arc<KnowledgeStore>,
    n_results: usize,
}

impl KnowledgeSearchTool {
    /// Creates the tool returning up to `n_results` documents per query.
    #[must_use]
    pub fn new(store: Arc<KnowledgeStore>, n_results: usize) -> Self {
        Self {
            store,
            n_results: n_results.max(1),
        }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    const NAME: &'static str = "knowledge_search";
    type Input = KnowledgeSearchInput;

    fn description(&self) -> &'static str {
        "Search the store's knowledge base of product descriptions and frequently asked \
         questions (returns, shipping, care, policies). Use this for any question about \
         products or store policy."
    }

    fn validate(&self, input: &Self::Input) -> Result<(), String> {
        if input.query.trim().is_empty() {
            return Err("query must not be empty".to_string());
        }
        Ok(())
    }

    fn input_from_text(&self, text: &str) -> Option<Self::Input> {
        Some(KnowledgeSearchInput {
            query: text.to_string(),
            document_type: None,
        })
    }

    async fn invoke(&self, input: Self::Input) -> ToolOutcome {
        let store = Arc::clone(&self.store);
        let n_results = self.n_results;
        let filter = input.document_type.map(QueryFilter::source);
        let query = input.query;

        let result = tokio::task::spawn_blocking(move || {
            store.query(&query, n_results, filter.as_ref())
        })
        .await;

        match result {
            Ok(Ok(hits)) if hits.is_empty() => ToolOutcome::Success(NO_RESULTS.to_string()),
            Ok(Ok(hits)) => ToolOutcome::Success(format_hits(&hits)),
            Ok(Err(e)) => {
                warn!(error = %e, "knowledge search degraded");
                ToolOutcome::BusinessFailure(RETRIEVAL_UNAVAILABLE.to_string())
            }
            Err(e) => {
                warn!(error = %e, "knowledge search task failed");
                ToolOutcome::BusinessFailure(RETRIEVAL_UNAVAILABLE.to_string())
            }
        }
    }
}

/// Formats hits as `Source`/`Content` blocks separated by blank lines.
#[must_use]
pub fn format_hits(hits: &[QueryHit]) -> String {
    let mut out = String::new();
    for hit in hits {
        let _ = write!(
            out,
            "Source: {} (ID: {}) [Distance: {:.2}]\nContent: {}\n\n",
            hit.metadata.source, hit.id, hit.distance, hit.text
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::tools::decode_input;
    use serde_json::json;

    fn store() -> Arc<KnowledgeStore> {
        let store = KnowledgeStore::new(Arc::new(HashEmbedder::new(128)));
        store
            .ingest(&[
                json!({"type": "faq", "id": "FAQ-1", "question": "What is your return policy?",
                       "answer": "Items can be returned within 30 days."}),
                json!({"type": "product", "id": "PROD-1", "name": "Linen Sofa",
                       "description": "Three-seater sofa with linen upholstery", "price": 800}),
            ])
            .unwrap_or_else(|e| panic!("ingest: {e}"));
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_returns_formatted_hits() {
        let tool = KnowledgeSearchTool::new(store(), 5);
        let out = tool
            .invoke(KnowledgeSearchInput {
                query: "return policy".to_string(),
                document_type: Some(SourceKind::Faq),
            })
            .await
            .into_observation();
        assert!(out.starts_with("Source: faq (ID: FAQ-1) [Distance: "));
        assert!(out.contains("Content: Question: What is your return policy?"));
        assert!(!out.contains("PROD-1"));
    }

    #[tokio::test]
    async fn test_single_faq_is_the_only_hit() {
        let store = KnowledgeStore::new(Arc::new(HashEmbedder::new(128)));
        store
            .ingest(&[json!({"type": "faq", "question": "What is your return window?",
                             "answer": "30 days", "category": "policy"})])
            .unwrap_or_else(|e| panic!("ingest: {e}"));
        let out = KnowledgeSearchTool::new(Arc::new(store), 5)
            .invoke(KnowledgeSearchInput {
                query: "how long do I have to return an item".to_string(),
                document_type: Some(SourceKind::Faq),
            })
            .await
            .into_observation();
        assert_eq!(out.matches("Source: faq").count(), 1);
        assert!(out.contains("30 days"));
    }

    #[tokio::test]
    async fn test_unavailable_index_degrades() {
        let empty = Arc::new(KnowledgeStore::new(Arc::new(HashEmbedder::new(16))));
        let outcome = KnowledgeSearchTool::new(empty, 5)
            .invoke(KnowledgeSearchInput {
                query: "anything".to_string(),
                document_type: None,
            })
            .await;
        assert_eq!(
            outcome,
            ToolOutcome::BusinessFailure(RETRIEVAL_UNAVAILABLE.to_string())
        );
    }

    #[tokio::test]
    async fn test_no_match_message() {
        let store = Arc::new(KnowledgeStore::new(Arc::new(HashEmbedder::new(16))));
        store.ingest(&[]).unwrap_or_else(|e| panic!("ingest: {e}"));
        let out = KnowledgeSearchTool::new(store, 5)
            .invoke(KnowledgeSearchInput {
                query: "anything".to_string(),
                document_type: None,
            })
            .await
            .into_observation();
        assert_eq!(out, NO_RESULTS);
    }

    #[test]
    fn test_decode_rejects_unknown_fields_and_blank_query() {
        let tool = KnowledgeSearchTool::new(store(), 5);
        assert!(decode_input(&tool, &json!({"query": "rug", "limit": 3})).is_err());
        assert!(decode_input(&tool, &json!({"query": "  "})).is_err());
        assert!(decode_input(&tool, &json!({"query": "rug", "document_type": "blog"})).is_err());
        let input = decode_input(&tool, &json!("sofa care"))
            .unwrap_or_else(|e| panic!("bare string: {e}"));
        assert_eq!(input.query, "sofa care");
    }
}
