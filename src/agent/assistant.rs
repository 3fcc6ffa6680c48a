//! Request-level assistant.
//!
//! Ties a session's history to one agent run and records the outcome.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use super::agentic_loop::{LoopSettings, agentic_loop};
use super::client::create_provider;
use super::config::AgentConfig;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::run::{AgentStep, StopReason};
use crate::core::Turn;
use crate::embedding::create_embedder;
use crate::error::{AgentError, Result};
use crate::knowledge::KnowledgeStore;
use crate::session::SessionStore;
use crate::tools::{
    CommerceBackend, HandoffSink, HttpCommerce, InMemoryCommerce, ToolDependencies, ToolRegistry,
    WebhookSink,
};

/// Longest accepted query, in bytes.
pub const MAX_QUERY_BYTES: usize = 10_000;

/// The answer to one customer message.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    /// Session the turn was recorded in.
    pub session_id: String,
    /// Answer text. Never empty.
    pub answer: String,
    /// Why the run ended.
    pub stop_reason: StopReason,
    /// Tool-calling rounds used.
    pub iterations_used: usize,
    /// Tool calls made while answering.
    pub steps: Vec<AgentStep>,
    /// Wall-clock time spent.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Customer-service assistant.
pub struct Assistant {
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    knowledge: Arc<KnowledgeStore>,
    sessions: SessionStore,
    prompts: PromptSet,
    settings: LoopSettings,
}

impl Assistant {
    /// Assembles an assistant from its parts.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: ToolRegistry,
        knowledge: Arc<KnowledgeStore>,
        sessions: SessionStore,
        prompts: PromptSet,
        settings: LoopSettings,
    ) -> Self {
        Self {
            provider,
            registry,
            knowledge,
            sessions,
            prompts,
            settings,
        }
    }

    /// Builds the assistant described by `config`.
    ///
    /// Opens the index snapshot at `index_path`, ingests `knowledge_dir`
    /// when set, and wires the commerce backend and handoff webhook.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unknown, a backend client cannot
    /// be built, or the knowledge sources cannot be loaded.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let provider = create_provider(config)?;

        let knowledge = Arc::new(KnowledgeStore::open(
            create_embedder(),
            config.index_path.as_deref(),
        )?);
        if let Some(dir) = &config.knowledge_dir {
            knowledge.ingest_dir(dir)?;
        }

        let commerce: Arc<dyn CommerceBackend> = match &config.commerce_url {
            Some(url) => Arc::new(HttpCommerce::new(url).map_err(|e| backend_config(&e))?),
            None => Arc::new(InMemoryCommerce::default()),
        };
        let handoff = match &config.handoff_webhook_url {
            Some(url) => Some(
                Arc::new(WebhookSink::new(url).map_err(|e| backend_config(&e))?)
                    as Arc<dyn HandoffSink>,
            ),
            None => None,
        };

        let registry = ToolRegistry::customer_service(ToolDependencies {
            knowledge: Arc::clone(&knowledge),
            commerce,
            handoff,
            retrieval_results: config.retrieval_results,
        })?;

        info!(
            provider = provider.name(),
            model = %config.model,
            documents = knowledge.document_count(),
            tools = registry.len(),
            "assistant ready"
        );

        Ok(Self::new(
            provider,
            registry,
            knowledge,
            SessionStore::new(config.history_turns),
            PromptSet::load(config.prompt_dir.as_deref()),
            LoopSettings::from_config(config),
        ))
    }

    /// Answers `query` within a session.
    ///
    /// A blank or missing `session_id` starts a new session. The turn pair
    /// is appended to the session once the run ends.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidQuery`] for an empty query or one longer
    /// than [`MAX_QUERY_BYTES`]. Everything past validation yields a reply.
    pub async fn respond(
        &self,
        session_id: Option<&str>,
        query: &str,
    ) -> std::result::Result<AssistantReply, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidQuery {
                message: "query must not be empty".to_string(),
            });
        }
        if query.len() > MAX_QUERY_BYTES {
            return Err(AgentError::InvalidQuery {
                message: format!(
                    "query is {} bytes, the limit is {MAX_QUERY_BYTES}",
                    query.len()
                ),
            });
        }

        let session_id = session_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(SessionStore::new_session_id, str::to_string);
        let history = self.sessions.get(&session_id);

        let run = agentic_loop(
            self.provider.as_ref(),
            &self.registry,
            &self.prompts,
            &self.settings,
            &history,
            query,
        )
        .await;

        self.sessions.append(
            &session_id,
            Turn::user(query),
            Turn::assistant(run.final_output.clone()),
        );

        Ok(AssistantReply {
            session_id,
            answer: run.final_output,
            stop_reason: run.stop_reason,
            iterations_used: run.iterations_used,
            steps: run.steps,
            elapsed: run.elapsed_time,
        })
    }

    /// Knowledge store backing the retrieval tools.
    #[must_use]
    pub const fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    /// Session history.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Registered tools.
    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("provider", &self.provider.name())
            .field("tools", &self.registry.names())
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn backend_config(err: &crate::error::BackendError) -> AgentError {
    AgentError::InvalidConfig {
        message: format!("backend client: {err}"),
    }
}
