//! Style recommendations from the product catalogue.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use super::{Tool, ToolOutcome};
use crate::core::SourceKind;
use crate::knowledge::{KnowledgeStore, QueryFilter, QueryHit};

/// Recommendations returned per request.
const MAX_RECOMMENDATIONS: usize = 3;

/// Candidates fetched before budget filtering.
const CANDIDATES: usize = 12;

const SNIPPET_CHARS: usize = 160;

/// Input for [`StyleAdviceTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StyleAdviceInput {
    /// Style, colours or materials the customer likes.
    pub preferences: String,
    /// Room being decorated.
    #[serde(default)]
    pub room: Option<String>,
    /// Maximum price per item.
    #[serde(default)]
    pub budget: Option<f64>,
}

/// Recommends catalogue products matching a customer's taste.
#[derive(Debug, Clone)]
pub struct StyleAdviceTool {
    store: Arc<KnowledgeStore>,
}

impl StyleAdviceTool {
    /// Creates the tool over the product catalogue in `store`.
    #[must_use]
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for StyleAdviceTool {
    const NAME: &'static str = "style_advice";
    type Input = StyleAdviceInput;

    fn description(&self) -> &'static str {
        "Recommend products from the catalogue that suit a customer's style preferences, \
         optionally for a specific room and within a per-item budget."
    }

    fn validate(&self, input: &Self::Input) -> Result<(), String> {
        if input.preferences.trim().is_empty() {
            return Err("preferences must not be empty".to_string());
        }
        if let Some(budget) = input.budget
            && (!budget.is_finite() || budget <= 0.0)
        {
            return Err("budget must be a positive amount".to_string());
        }
        Ok(())
    }

    fn input_from_text(&self, text: &str) -> Option<Self::Input> {
        Some(StyleAdviceInput {
            preferences: text.to_string(),
            room: None,
            budget: None,
        })
    }

    async fn invoke(&self, input: Self::Input) -> ToolOutcome {
        let query = match input.room.as_deref().map(str::trim) {
            Some(room) if !room.is_empty() => format!("{} {room}", input.preferences),
            _ => input.preferences.clone(),
        };

        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || {
            store.query(&query, CANDIDATES, Some(&QueryFilter::source(SourceKind::Product)))
        })
        .await;

        let hits = match result {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "style advice retrieval degraded");
                return ToolOutcome::BusinessFailure(
                    "No style information found: the product catalogue is not available right now."
                        .to_string(),
                );
            }
            Err(e) => {
                warn!(error = %e, "style advice task failed");
                return ToolOutcome::BusinessFailure(
                    "No style information found: the product catalogue is not available right now."
                        .to_string(),
                );
            }
        };

        let picks: Vec<&QueryHit> = hits
            .iter()
            .filter(|h| match (input.budget, h.metadata.price) {
                (Some(budget), Some(price)) => price <= budget,
                _ => true,
            })
            .take(MAX_RECOMMENDATIONS)
            .collect();

        if picks.is_empty() {
            let budget_note = input
                .budget
                .map(|b| format!(" within a budget of ${b:.2}"))
                .unwrap_or_default();
            return ToolOutcome::BusinessFailure(format!(
                "No products matching '{}'{budget_note} were found in the catalogue.",
                input.preferences.trim()
            ));
        }

        ToolOutcome::Success(render(&input, &picks))
    }
}

fn render(input: &StyleAdviceInput, picks: &[&QueryHit]) -> String {
    let mut out = format!("Recommendations for '{}'", input.preferences.trim());
    if let Some(room) = input.room.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        let _ = write!(out, " in the {room}");
    }
    out.push(':');

    for (n, hit) in picks.iter().enumerate() {
        let name = hit.metadata.name.as_deref().unwrap_or(&hit.id);
        let _ = write!(out, "\n{}. {name} ({})", n + 1, hit.metadata.category);
        if let Some(price) = hit.metadata.price {
            let _ = write!(out, " - ${price:.2}");
        }
        let _ = write!(out, "\n   {}", snippet(&hit.text));
    }
    out
}

fn snippet(text: &str) -> String {
    let description = text
        .split_once("Description: ")
        .map_or(text, |(_, rest)| rest);
    let mut s: String = description.chars().take(SNIPPET_CHARS).collect();
    if description.chars().count() > SNIPPET_CHARS {
        s.push_str("...");
    }
    s
}
