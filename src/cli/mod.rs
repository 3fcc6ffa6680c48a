//! CLI layer for luxe-assist.
//!
//! Provides the command-line interface using clap, with commands for
//! building and searching the knowledge index and talking to the assistant.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
#[cfg(feature = "mcp")]
pub use parser::McpCommands;
pub use parser::{AgentArgs, Cli, Commands};
