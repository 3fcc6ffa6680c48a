//! The conversational agent.
//!
//! Provides the bounded tool-calling loop behind the assistant and the
//! pluggable completion provider it talks to.
//!
//! # Architecture
//!
//! ```text
//! Customer query → Assistant
//!   ├── SessionStore (history for the session)
//!   ├── agentic_loop (bounded by iterations and a deadline)
//!   │   ├── LlmProvider::chat → ModelAction
//!   │   └── ToolRegistry::prepare / execute → observations
//!   └── SessionStore (append the turn pair)
//! ```

pub mod action;
pub mod agentic_loop;
pub mod assistant;
pub mod client;
pub mod config;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod run;
pub mod tool;

pub use action::ModelAction;
pub use agentic_loop::{LoopSettings, agentic_loop};
pub use assistant::{Assistant, AssistantReply, MAX_QUERY_BYTES};
pub use client::create_provider;
pub use config::{AgentConfig, AgentConfigBuilder};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use run::{AgentRun, AgentStep, FALLBACK_ANSWER, StopReason};
pub use tool::{ToolCall, ToolDefinition};
