//! Tool registration and dispatch.
//!
//! Dispatch is split in two so the agent loop can validate every call in a
//! model response before running any of them: [`ToolRegistry::prepare`]
//! resolves the tool and decodes its typed input, [`ToolRegistry::execute`]
//! runs a prepared call and always yields observation text.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::customer_handoff::CustomerHandoffInput;
use super::knowledge_search::KnowledgeSearchInput;
use super::order_status::OrderStatusInput;
use super::returns::InitiateReturnInput;
use super::style_advisor::StyleAdviceInput;
use super::{
    CommerceBackend, CustomerHandoffTool, HandoffSink, InitiateReturnTool, KnowledgeSearchTool,
    OrderStatusTool, RegisteredTool, StyleAdviceTool, Tool, decode_input,
};
use crate::agent::tool::{ToolCall, ToolDefinition};
use crate::error::{RegistryError, ToolError};
use crate::knowledge::KnowledgeStore;

/// Maximum raw byte length of tool argument JSON from the model.
const MAX_TOOL_ARGS_LEN: usize = 16_384;

/// Typed input matching one [`RegisteredTool`] variant.
#[derive(Debug, Clone)]
enum PreparedInput {
    KnowledgeSearch(KnowledgeSearchInput),
    OrderStatus(OrderStatusInput),
    InitiateReturn(InitiateReturnInput),
    StyleAdvice(StyleAdviceInput),
    CustomerHandoff(CustomerHandoffInput),
}

/// A validated tool call, ready to execute.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    /// Provider-assigned call id.
    pub call_id: String,
    /// Resolved tool name.
    pub tool_name: &'static str,
    /// Arguments as sent by the model, for logging and run records.
    pub arguments: Value,
    input: PreparedInput,
}

/// Collaborators needed by the standard customer-service tool set.
#[derive(Clone)]
pub struct ToolDependencies {
    /// Product and FAQ knowledge.
    pub knowledge: Arc<KnowledgeStore>,
    /// Orders and returns.
    pub commerce: Arc<dyn CommerceBackend>,
    /// Customer handoff channel, if configured.
    pub handoff: Option<Arc<dyn HandoffSink>>,
    /// Documents returned per knowledge search.
    pub retrieval_results: usize,
}

/// Collects tools, rejecting duplicate names.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if a tool with the same name
    /// is already registered.
    pub fn register(&mut self, tool: impl Into<RegisteredTool>) -> Result<&mut Self, RegistryError> {
        let tool = tool.into();
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(RegistryError::DuplicateTool {
                name: tool.name().to_string(),
            });
        }
        self.tools.push(tool);
        Ok(self)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

/// Immutable set of tools, in registration order.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Starts a registry.
    #[must_use]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// The five customer-service tools.
    ///
    /// # Errors
    ///
    /// Never fails in practice; registration errors are propagated for
    /// consistency with [`ToolRegistryBuilder::register`].
    pub fn customer_service(deps: ToolDependencies) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        builder
            .register(KnowledgeSearchTool::new(
                Arc::clone(&deps.knowledge),
                deps.retrieval_results,
            ))?
            .register(OrderStatusTool::new(Arc::clone(&deps.commerce)))?
            .register(InitiateReturnTool::new(Arc::clone(&deps.commerce)))?
            .register(StyleAdviceTool::new(deps.knowledge))?
            .register(CustomerHandoffTool::new(deps.handoff))?;
        Ok(builder.build())
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(RegisteredTool::name).collect()
    }

    /// Function-calling definitions for every tool.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(RegisteredTool::definition).collect()
    }

    fn find(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Resolves and validates a model tool call.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for an unregistered name and
    /// [`ToolError::InvalidToolInput`] for arguments that are oversized, not
    /// JSON, or do not match the tool's input.
    pub fn prepare(&self, call: &ToolCall) -> Result<PreparedCall, ToolError> {
        let name = call.name.trim();
        let tool = self.find(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;

        let invalid = |message: String| ToolError::InvalidToolInput {
            name: tool.name().to_string(),
            message,
        };
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return Err(invalid(format!(
                "arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                call.arguments.len()
            )));
        }
        let arguments = if call.arguments.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&call.arguments)
                .map_err(|e| invalid(format!("arguments are not valid JSON: {e}")))?
        };

        let input = match tool {
            RegisteredTool::KnowledgeSearch(t) => {
                PreparedInput::KnowledgeSearch(decode_input(t, &arguments)?)
            }
            RegisteredTool::OrderStatus(t) => {
                PreparedInput::OrderStatus(decode_input(t, &arguments)?)
            }
            RegisteredTool::InitiateReturn(t) => {
                PreparedInput::InitiateReturn(decode_input(t, &arguments)?)
            }
            RegisteredTool::StyleAdvice(t) => {
                PreparedInput::StyleAdvice(decode_input(t, &arguments)?)
            }
            RegisteredTool::CustomerHandoff(t) => {
                PreparedInput::CustomerHandoff(decode_input(t, &arguments)?)
            }
        };

        Ok(PreparedCall {
            call_id: call.id.clone(),
            tool_name: tool.name(),
            arguments,
            input,
        })
    }

    /// Runs a prepared call and returns its observation text.
    pub async fn execute(&self, call: PreparedCall) -> String {
        debug!(tool = call.tool_name, call_id = %call.call_id, "executing tool");
        let Some(tool) = self.find(call.tool_name) else {
            return format!("Tool '{}' is not available.", call.tool_name);
        };

        let outcome = match (tool, call.input) {
            (RegisteredTool::KnowledgeSearch(t), PreparedInput::KnowledgeSearch(i)) => {
                t.invoke(i).await
            }
            (RegisteredTool::OrderStatus(t), PreparedInput::OrderStatus(i)) => t.invoke(i).await,
            (RegisteredTool::InitiateReturn(t), PreparedInput::InitiateReturn(i)) => {
                t.invoke(i).await
            }
            (RegisteredTool::StyleAdvice(t), PreparedInput::StyleAdvice(i)) => t.invoke(i).await,
            (RegisteredTool::CustomerHandoff(t), PreparedInput::CustomerHandoff(i)) => {
                t.invoke(i).await
            }
            _ => return format!("Tool '{}' received mismatched input.", call.tool_name),
        };
        outcome.into_observation()
    }

    /// Validates and runs a call in one step.
    ///
    /// # Errors
    ///
    /// See [`ToolRegistry::prepare`].
    pub async fn invoke(&self, name: &str, input: &Value) -> Result<String, ToolError> {
        let call = ToolCall {
            id: format!("direct-{name}"),
            name: name.to_string(),
            arguments: input.to_string(),
        };
        let prepared = self.prepare(&call)?;
        Ok(self.execute(prepared).await)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::tools::InMemoryCommerce;
    use serde_json::json;

    fn deps() -> ToolDependencies {
        ToolDependencies {
            knowledge: Arc::new(KnowledgeStore::new(Arc::new(HashEmbedder::new(64)))),
            commerce: Arc::new(InMemoryCommerce::default()),
            handoff: None,
            retrieval_results: 5,
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::customer_service(deps()).unwrap_or_else(|e| panic!("registry: {e}"))
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_standard_tool_set() {
        let reg = registry();
        assert_eq!(
            reg.names(),
            vec![
                "knowledge_search",
                "order_status",
                "initiate_return",
                "style_advice",
                "customer_handoff"
            ]
        );
        for def in reg.definitions() {
            assert_eq!(def.parameters["type"], "object");
            assert!(def.parameters.get("$schema").is_none());
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn test_order_status_schema_lists_required_field() {
        let defs = registry().definitions();
        let order = defs
            .iter()
            .find(|d| d.name == "order_status")
            .unwrap_or_else(|| panic!("order_status missing"));
        assert_eq!(order.parameters["required"], json!(["order_id"]));
        assert_eq!(order.parameters["additionalProperties"], json!(false));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let d = deps();
        let mut builder = ToolRegistry::builder();
        builder
            .register(OrderStatusTool::new(Arc::clone(&d.commerce)))
            .unwrap_or_else(|e| panic!("first: {e}"));
        let err = builder
            .register(OrderStatusTool::new(d.commerce))
            .err()
            .unwrap_or_else(|| panic!("duplicate accepted"));
        assert_eq!(
            err,
            RegistryError::DuplicateTool {
                name: "order_status".to_string()
            }
        );
    }

    #[test]
    fn test_prepare_rejects_unknown_and_invalid() {
        let reg = registry();
        assert!(matches!(
            reg.prepare(&call("teleport", "{}")),
            Err(ToolError::UnknownTool { .. })
        ));
        assert!(matches!(
            reg.prepare(&call("order_status", "{\"order\": \"ORD-1\"}")),
            Err(ToolError::InvalidToolInput { .. })
        ));
        assert!(matches!(
            reg.prepare(&call("order_status", "not json")),
            Err(ToolError::InvalidToolInput { .. })
        ));
        assert!(matches!(
            reg.prepare(&call("order_status", "")),
            Err(ToolError::InvalidToolInput { .. })
        ));
        let huge = format!("{{\"order_id\": \"{}\"}}", "A".repeat(MAX_TOOL_ARGS_LEN));
        assert!(matches!(
            reg.prepare(&call("order_status", &huge)),
            Err(ToolError::InvalidToolInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_prepare_then_execute() {
        let reg = registry();
        let prepared = reg
            .prepare(&call("order_status", "{\"order_id\": \"ORD-12345\"}"))
            .unwrap_or_else(|e| panic!("prepare: {e}"));
        assert_eq!(prepared.tool_name, "order_status");
        let out = reg.execute(prepared).await;
        assert!(out.contains("Status: Delivered"));
    }

    #[tokio::test]
    async fn test_invoke_business_failure_is_text() {
        let out = registry()
            .invoke("order_status", &json!({"order_id": "ORD-00000"}))
            .await
            .unwrap_or_else(|e| panic!("invoke: {e}"));
        assert_eq!(out, "Order with ID 'ORD-00000' not found.");
    }

    #[tokio::test]
    async fn test_bare_string_action_input() {
        let out = registry()
            .invoke("order_status", &json!("ord-87654"))
            .await
            .unwrap_or_else(|e| panic!("invoke: {e}"));
        assert!(out.contains("Status: Shipped"));
    }
}
