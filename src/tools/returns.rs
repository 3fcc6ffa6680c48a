//! Return initiation.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use super::commerce::CommerceBackend;
use super::{Tool, ToolOutcome, normalize_order_id, validate_order_id};

/// Input for [`InitiateReturnTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct InitiateReturnInput {
    /// Order to return, e.g. `ORD-12345`.
    pub order_id: String,
    /// Why the customer is returning the item.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Starts a return for an order.
#[derive(Clone)]
pub struct InitiateReturnTool {
    backend: Arc<dyn CommerceBackend>,
}

impl InitiateReturnTool {
    /// Creates the tool over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for InitiateReturnTool {
    const NAME: &'static str = "initiate_return";
    type Input = InitiateReturnInput;

    fn description(&self) -> &'static str {
        "Initiate a return for a customer's order. Only use this after the customer has \
         clearly asked to return an item. Requires the order ID; a reason is optional."
    }

    fn validate(&self, input: &Self::Input) -> Result<(), String> {
        validate_order_id(&input.order_id)
    }

    fn input_from_text(&self, text: &str) -> Option<Self::Input> {
        Some(InitiateReturnInput {
            order_id: text.to_string(),
            reason: None,
        })
    }

    async fn invoke(&self, input: Self::Input) -> ToolOutcome {
        let order_id = normalize_order_id(&input.order_id);
        let reason = input
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        match self.backend.initiate_return(&order_id, reason).await {
            Ok(Some(confirmation)) => {
                info!(order_id = %order_id, return_id = ?confirmation.return_id, "return initiated");
                ToolOutcome::Success(confirmation.message)
            }
            Ok(None) => ToolOutcome::BusinessFailure(format!(
                "Order with ID '{order_id}' not found, so no return was started."
            )),
            Err(e) => {
                warn!(backend = self.backend.name(), order_id = %order_id, error = %e, "return initiation failed");
                ToolOutcome::BusinessFailure(format!(
                    "The return for order '{order_id}' could not be started because the order \
                     system is unavailable. Please try again later."
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::commerce::InMemoryCommerce;

    #[tokio::test]
    async fn test_return_confirmation_mentions_return_id() {
        let backend = Arc::new(InMemoryCommerce::default());
        let tool = InitiateReturnTool::new(backend.clone());
        let out = tool
            .invoke(InitiateReturnInput {
                order_id: "ord-12345".to_string(),
                reason: Some("colour mismatch".to_string()),
            })
            .await;
        assert!(!out.is_failure());
        assert!(out.into_observation().contains("Return ID: RET-"));
        assert_eq!(backend.returns()[0].order_id, "ORD-12345");
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let tool = InitiateReturnTool::new(Arc::new(InMemoryCommerce::default()));
        let out = tool
            .invoke(InitiateReturnInput {
                order_id: "ORD-4".to_string(),
                reason: None,
            })
            .await;
        assert!(out.is_failure());
        assert!(out.into_observation().contains("'ORD-4' not found"));
    }
}
