//! MCP server implementation for luxe-assist.
//!
//! Exposes the assistant and knowledge search as MCP tools. Knowledge
//! queries embed text synchronously, so they run on `spawn_blocking`.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::agent::{AgentConfig, Assistant};
use crate::error::{AgentError, RetrievalError};
use crate::knowledge::QueryFilter;

use super::params::{ChatParams, SearchKnowledgeParams};

/// Default number of documents for `search_knowledge`.
const DEFAULT_SEARCH_RESULTS: usize = 5;
/// Upper bound on `n_results` for `search_knowledge`.
const MAX_SEARCH_RESULTS: usize = 50;

/// luxe-assist MCP server.
#[derive(Clone)]
pub struct AssistantMcpServer {
    tool_router: ToolRouter<Self>,
    assistant: Arc<Assistant>,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl AssistantMcpServer {
    /// Send a customer message to the assistant.
    #[tool(
        name = "chat",
        description = "Send a customer message to the home-decor store assistant. The assistant can look up orders, start returns, search products and store policies, suggest decor, and pass contact details to the sales team. Pass the returned session_id on follow-up messages to keep the conversation context. Returns JSON with the answer, session_id, stop_reason and the tool steps taken."
    )]
    async fn chat(
        &self,
        Parameters(params): Parameters<ChatParams>,
    ) -> Result<CallToolResult, McpError> {
        let reply = self
            .assistant
            .respond(params.session_id.as_deref(), &params.message)
            .await
            .map_err(|e| match e {
                AgentError::InvalidQuery { message } => McpError::invalid_params(message, None),
                other => McpError::internal_error(other.to_string(), None),
            })?;
        to_json(&reply)
    }

    /// Search the product and FAQ knowledge base.
    #[tool(
        name = "search_knowledge",
        description = "Similarity search over the store's product catalog and FAQs. Optionally restrict to document_type \"product\" or \"faq\" and to an exact category. Returns JSON hits ordered by ascending cosine distance."
    )]
    async fn search_knowledge(
        &self,
        Parameters(params): Parameters<SearchKnowledgeParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err(McpError::invalid_params("query must not be empty", None));
        }
        let n_results = params
            .n_results
            .unwrap_or(DEFAULT_SEARCH_RESULTS)
            .clamp(1, MAX_SEARCH_RESULTS);
        let filter = QueryFilter {
            source: params.document_type,
            category: params.category,
            ..QueryFilter::default()
        };

        let knowledge = Arc::clone(self.assistant.knowledge());
        let hits = tokio::task::spawn_blocking(move || {
            knowledge.query(&query, n_results, Some(&filter))
        })
        .await
        .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?
        .map_err(|e| match e {
            RetrievalError::IndexUnavailable => McpError::internal_error(
                "Knowledge base not loaded. Run `luxe-assist ingest` first.",
                None,
            ),
            other => McpError::internal_error(format!("Search failed: {other}"), None),
        })?;

        to_json(&hits)
    }
}

#[tool_handler]
impl ServerHandler for AssistantMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "luxe-assist".to_string(),
                title: Some("Luxe Assist MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Customer-service assistant for a home-decor store. Use `chat` to answer \
                 customer messages (keep the returned session_id for follow-ups) and \
                 `search_knowledge` to look up products and FAQs directly."
                    .to_string(),
            ),
        }
    }
}

impl AssistantMcpServer {
    /// Wraps an existing assistant.
    #[must_use]
    pub fn with_assistant(assistant: Arc<Assistant>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            assistant,
        }
    }

    /// Creates a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the assistant cannot be built (see
    /// [`Assistant::from_config`]).
    pub fn new(config: &AgentConfig) -> Result<Self, crate::error::Error> {
        Ok(Self::with_assistant(Arc::new(Assistant::from_config(
            config,
        )?)))
    }

    /// The assistant behind the tools.
    #[must_use]
    pub const fn assistant(&self) -> &Arc<Assistant> {
        &self.assistant
    }
}
