//! MCP tool parameter types.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::SourceKind;

/// Parameters for the `chat` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatParams {
    /// The customer's message.
    pub message: String,

    /// Session to continue. A new session is started when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Parameters for the `search_knowledge` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchKnowledgeParams {
    /// Text to search for.
    pub query: String,

    /// Maximum number of documents to return (default 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_results: Option<usize>,

    /// Restrict results to products or FAQs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<SourceKind>,

    /// Restrict results to one category (exact match).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
