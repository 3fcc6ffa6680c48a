//! Order tracking.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use super::commerce::CommerceBackend;
use super::{Tool, ToolOutcome, normalize_order_id, validate_order_id};

/// Input for [`OrderStatusTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderStatusInput {
    /// Order identifier, e.g. `ORD-12345`.
    pub order_id: String,
}

/// Looks up the status of an order.
#[derive(Clone)]
pub struct OrderStatusTool {
    backend: Arc<dyn CommerceBackend>,
}

impl OrderStatusTool {
    /// Creates the tool over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for OrderStatusTool {
    const NAME: &'static str = "order_status";
    type Input = OrderStatusInput;

    fn description(&self) -> &'static str {
        "Get the current status of a customer's order, including carrier, tracking number \
         and delivery dates. Input is the order ID (for example ORD-12345)."
    }

    fn validate(&self, input: &Self::Input) -> Result<(), String> {
        validate_order_id(&input.order_id)
    }

    fn input_from_text(&self, text: &str) -> Option<Self::Input> {
        Some(OrderStatusInput {
            order_id: text.to_string(),
        })
    }

    async fn invoke(&self, input: Self::Input) -> ToolOutcome {
        let order_id = normalize_order_id(&input.order_id);
        match self.backend.order_status(&order_id).await {
            Ok(Some(order)) => ToolOutcome::Success(order.describe()),
            Ok(None) => {
                ToolOutcome::BusinessFailure(format!("Order with ID '{order_id}' not found."))
            }
            Err(e) => {
                warn!(backend = self.backend.name(), order_id = %order_id, error = %e, "order lookup failed");
                ToolOutcome::BusinessFailure(format!(
                    "The order system could not be reached to look up order '{order_id}'. \
                     Please try again later."
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::commerce::InMemoryCommerce;

    fn tool() -> OrderStatusTool {
        OrderStatusTool::new(Arc::new(InMemoryCommerce::default()))
    }

    #[tokio::test]
    async fn test_known_order_is_normalised_and_described() {
        let out = tool()
            .invoke(OrderStatusInput {
                order_id: " ord-87654 ".to_string(),
            })
            .await;
        let text = out.into_observation();
        assert!(text.contains("Status: Shipped"));
        assert!(text.contains("Tracking Number: 1Z9999999999999999"));
    }

    #[tokio::test]
    async fn test_unknown_order_is_business_failure() {
        let out = tool()
            .invoke(OrderStatusInput {
                order_id: "ORD-00000".to_string(),
            })
            .await;
        assert_eq!(
            out,
            ToolOutcome::BusinessFailure("Order with ID 'ORD-00000' not found.".to_string())
        );
    }
}
