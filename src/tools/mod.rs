//! Tools the assistant can invoke.
//!
//! Every tool implements the [`Tool`] capability trait with a typed input
//! struct; the JSON schema sent to the model is derived from that struct.
//! The set of tools is closed: [`RegisteredTool`] enumerates them and the
//! [`ToolRegistry`] dispatches by name.
//!
//! Tools never fail for business reasons. An unknown order or an
//! unreachable backend is reported through [`ToolOutcome::BusinessFailure`]
//! and reaches the model as observation text. Only contract violations
//! (unknown tool, malformed input) surface as [`ToolError`].

pub mod commerce;
pub mod customer_handoff;
pub mod knowledge_search;
pub mod order_status;
pub mod registry;
pub mod returns;
pub mod style_advisor;
pub mod webhook;

pub use commerce::{CommerceBackend, HttpCommerce, InMemoryCommerce, OrderStatus, ReturnConfirmation};
pub use customer_handoff::CustomerHandoffTool;
pub use knowledge_search::KnowledgeSearchTool;
pub use order_status::OrderStatusTool;
pub use registry::{PreparedCall, ToolDependencies, ToolRegistry, ToolRegistryBuilder};
pub use returns::InitiateReturnTool;
pub use style_advisor::StyleAdviceTool;
pub use webhook::{HandoffRequest, HandoffSink, WebhookSink};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::agent::tool::ToolDefinition;
use crate::error::ToolError;

/// Result of a tool invocation. Both variants become observation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool did what was asked.
    Success(String),
    /// The request was understood but could not be fulfilled.
    BusinessFailure(String),
}

impl ToolOutcome {
    /// Observation text for the model.
    #[must_use]
    pub fn into_observation(self) -> String {
        match self {
            Self::Success(text) | Self::BusinessFailure(text) => text,
        }
    }

    /// Whether this is a business failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::BusinessFailure(_))
    }
}

/// Capability contract for a single tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    const NAME: &'static str;

    /// Typed input.
    type Input: DeserializeOwned + JsonSchema + Send + 'static;

    /// Description shown to the model.
    fn description(&self) -> &'static str;

    /// Semantic checks beyond the schema.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason the input is unusable.
    fn validate(&self, _input: &Self::Input) -> Result<(), String> {
        Ok(())
    }

    /// Builds input from a bare string, for models that send
    /// `"action_input": "ORD-12345"` instead of an object.
    fn input_from_text(&self, _text: &str) -> Option<Self::Input> {
        None
    }

    /// Runs the tool.
    async fn invoke(&self, input: Self::Input) -> ToolOutcome;
}

/// Function-calling definition for a tool.
#[must_use]
pub fn definition_of<T: Tool>(tool: &T) -> ToolDefinition {
    let mut parameters = serde_json::to_value(schemars::schema_for!(T::Input))
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(obj) = parameters.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    ToolDefinition {
        name: T::NAME.to_string(),
        description: tool.description().to_string(),
        parameters,
    }
}

/// Decodes and validates raw JSON arguments for `tool`.
///
/// # Errors
///
/// Returns [`ToolError::InvalidToolInput`] when the arguments do not match
/// the input type or fail validation.
pub fn decode_input<T: Tool>(tool: &T, arguments: &Value) -> Result<T::Input, ToolError> {
    let invalid = |message: String| ToolError::InvalidToolInput {
        name: T::NAME.to_string(),
        message,
    };

    let input = match arguments {
        Value::String(text) => tool
            .input_from_text(text)
            .ok_or_else(|| invalid("expected a JSON object".to_string()))?,
        Value::Null => serde_json::from_value(Value::Object(serde_json::Map::new()))
            .map_err(|e| invalid(e.to_string()))?,
        other => serde_json::from_value(other.clone()).map_err(|e| invalid(e.to_string()))?,
    };
    tool.validate(&input).map_err(invalid)?;
    Ok(input)
}

/// The closed set of tools.
pub enum RegisteredTool {
    /// Product and FAQ lookup.
    KnowledgeSearch(KnowledgeSearchTool),
    /// Order tracking.
    OrderStatus(OrderStatusTool),
    /// Return initiation.
    InitiateReturn(InitiateReturnTool),
    /// Style recommendations.
    StyleAdvice(StyleAdviceTool),
    /// Customer-detail handoff.
    CustomerHandoff(CustomerHandoffTool),
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RegisteredTool").field(&self.name()).finish()
    }
}

impl RegisteredTool {
    /// Tool name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::KnowledgeSearch(_) => KnowledgeSearchTool::NAME,
            Self::OrderStatus(_) => OrderStatusTool::NAME,
            Self::InitiateReturn(_) => InitiateReturnTool::NAME,
            Self::StyleAdvice(_) => StyleAdviceTool::NAME,
            Self::CustomerHandoff(_) => CustomerHandoffTool::NAME,
        }
    }

    /// Function-calling definition.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        match self {
            Self::KnowledgeSearch(t) => definition_of(t),
            Self::OrderStatus(t) => definition_of(t),
            Self::InitiateReturn(t) => definition_of(t),
            Self::StyleAdvice(t) => definition_of(t),
            Self::CustomerHandoff(t) => definition_of(t),
        }
    }
}

impl From<KnowledgeSearchTool> for RegisteredTool {
    fn from(t: KnowledgeSearchTool) -> Self {
        Self::KnowledgeSearch(t)
    }
}

impl From<OrderStatusTool> for RegisteredTool {
    fn from(t: OrderStatusTool) -> Self {
        Self::OrderStatus(t)
    }
}

impl From<InitiateReturnTool> for RegisteredTool {
    fn from(t: InitiateReturnTool) -> Self {
        Self::InitiateReturn(t)
    }
}

impl From<StyleAdviceTool> for RegisteredTool {
    fn from(t: StyleAdviceTool) -> Self {
        Self::StyleAdvice(t)
    }
}

impl From<CustomerHandoffTool> for RegisteredTool {
    fn from(t: CustomerHandoffTool) -> Self {
        Self::CustomerHandoff(t)
    }
}

/// Normalises an order id: trimmed and upper-cased.
#[must_use]
pub fn normalize_order_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Checks a normalised order id is safe to put in a URL path.
pub(crate) fn validate_order_id(order_id: &str) -> Result<(), String> {
    let id = normalize_order_id(order_id);
    if id.is_empty() {
        return Err("order_id must not be empty".to_string());
    }
    if id.len() > 64 || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(format!("'{}' is not a valid order id", order_id.trim()));
    }
    Ok(())
}
