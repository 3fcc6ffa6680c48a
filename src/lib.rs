//! # luxe-assist
//!
//! Customer-service assistant for a home-decor store.
//!
//! The crate has three layers:
//!
//! - **Knowledge**: product and FAQ records are embedded into an in-memory
//!   vector index ([`knowledge::KnowledgeStore`]) that is published
//!   atomically and snapshotted to SQLite.
//! - **Tools**: a fixed registry of five customer-service tools
//!   ([`tools::ToolRegistry`]) with JSON-schema inputs and plain-text
//!   observations.
//! - **Agent**: a bounded tool-routing loop ([`agent::agentic_loop`]) that
//!   alternates completion calls and tool calls under an iteration and
//!   wall-clock budget, wrapped by [`agent::Assistant`] which keeps
//!   per-session history.
//!
//! ## Example
//!
//! ```no_run
//! use luxe_assist::agent::{AgentConfig, Assistant};
//!
//! # async fn run() -> luxe_assist::Result<()> {
//! let config = AgentConfig::builder()
//!     .knowledge_dir("data/knowledge")
//!     .from_env()
//!     .build()?;
//! let assistant = Assistant::from_config(&config)?;
//! let reply = assistant.respond(None, "Where is my order ORD-87654?").await?;
//! println!("{}", reply.answer);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod embedding;
pub mod error;
pub mod knowledge;
pub mod logging;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod session;
pub mod tools;

pub use agent::{AgentConfig, AgentRun, Assistant, AssistantReply, StopReason};
pub use core::{Document, DocumentMetadata, SourceKind, Turn, TurnRole};
pub use error::{Error, Result};
pub use knowledge::{KnowledgeStore, QueryFilter, QueryHit};
pub use session::SessionStore;
pub use tools::ToolRegistry;
