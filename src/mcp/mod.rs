//! MCP (Model Context Protocol) server for luxe-assist.
//!
//! Exposes the assistant and the knowledge index as MCP tools so other
//! agents can hand customer conversations to it.
//!
//! # Feature Gate
//!
//! This module requires the `mcp` feature flag:
//! ```toml
//! [dependencies]
//! luxe-assist = { version = "...", features = ["mcp"] }
//! ```
//!
//! # Architecture
//!
//! ```text
//! MCP Client
//!   ├── chat(message, session_id?) → Assistant::respond → AssistantReply JSON
//!   └── search_knowledge(query, …) → spawn_blocking(KnowledgeStore::query) → hits JSON
//! ```

pub mod params;
pub mod server;
pub mod transport;

pub use params::{ChatParams, SearchKnowledgeParams};
pub use server::AssistantMcpServer;
pub use transport::{serve_http, serve_stdio};
