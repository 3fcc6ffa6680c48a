//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Default location of the knowledge index snapshot.
pub const DEFAULT_INDEX_PATH: &str = ".luxe/knowledge.db";

/// luxe-assist: customer-service assistant for a home-decor store.
///
/// Indexes product and FAQ knowledge, and answers customer messages with
/// an LLM agent that can search knowledge, track orders, start returns,
/// suggest decor and hand customers over to the sales team.
#[derive(Parser, Debug)]
#[command(name = "luxe-assist")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the knowledge index snapshot.
    ///
    /// Defaults to `.luxe/knowledge.db` in the current directory.
    #[arg(long, env = "LUXE_INDEX_PATH", global = true)]
    pub index_path: Option<PathBuf>,

    /// Directory (or file) of knowledge sources to ingest.
    #[arg(long, env = "LUXE_KNOWLEDGE_DIR", global = true)]
    pub knowledge_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the knowledge index from product and FAQ files.
    ///
    /// Reads `.json` (array or object) and `.jsonl` files, replaces the
    /// index and writes the snapshot.
    #[command(after_help = r#"Examples:
  luxe-assist ingest data/knowledge                   # Index a directory
  luxe-assist ingest catalog.json                     # Index a single file
  luxe-assist --knowledge-dir data/knowledge ingest   # Use the configured directory
"#)]
    Ingest {
        /// Directory or file to ingest (defaults to --knowledge-dir).
        path: Option<PathBuf>,
    },

    /// Search the knowledge index.
    #[command(after_help = r#"Examples:
  luxe-assist search "return policy"                  # Top 5 documents
  luxe-assist search "sofa" --type product -n 3       # Products only
  luxe-assist search "rug" --category Rugs
  luxe-assist --format json search "delivery" | jq '.[].id'
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'n', long, default_value = "5")]
        n_results: usize,

        /// Restrict to a document type (product, faq).
        #[arg(short = 't', long = "type")]
        document_type: Option<String>,

        /// Restrict to an exact category.
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show knowledge index status.
    Status,

    /// Send one message to the assistant.
    #[command(after_help = r#"Examples:
  luxe-assist chat "Where is my order ORD-87654?"
  luxe-assist chat "What is your return policy?" --format json
  LUXE_PROVIDER=groq GROQ_API_KEY=gsk-... luxe-assist chat "Suggest a rug for my living room"
"#)]
    Chat {
        /// The customer's message.
        message: String,

        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Interactive conversation with the assistant (type `exit` to quit).
    Repl {
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Write the default prompt templates for customization.
    InitPrompts {
        /// Target directory (defaults to `~/.config/luxe-assist/prompts`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Start MCP (Model Context Protocol) server.
    #[cfg(feature = "mcp")]
    #[command(subcommand)]
    Mcp(McpCommands),
}

/// Assistant options shared by `chat` and `repl`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AgentArgs {
    /// Session to continue.
    #[arg(short, long)]
    pub session: Option<String>,

    /// Completion provider (openai, groq).
    #[arg(long)]
    pub provider: Option<String>,

    /// Model identifier.
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the completion provider.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Maximum tool-calling rounds per message.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Time budget per message, in seconds.
    #[arg(long)]
    pub max_execution_secs: Option<u64>,

    /// Directory containing prompt template files.
    #[arg(long)]
    pub prompt_dir: Option<PathBuf>,

    /// Show the tool steps taken for each answer.
    #[arg(long)]
    pub show_steps: bool,
}

/// MCP server transport options.
#[cfg(feature = "mcp")]
#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Start MCP server with stdio transport.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  luxe-assist mcp stdio                          # Start stdio MCP server
  OPENAI_API_KEY=sk-... luxe-assist mcp stdio    # With API key
"#)]
    Stdio,

    /// Start MCP server with streamable HTTP transport.
    #[command(after_help = r#"Examples:
  luxe-assist mcp http                           # Listen on 127.0.0.1:3000
  luxe-assist mcp http --host 0.0.0.0 --port 8080
"#)]
    Http {
        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

impl Cli {
    /// Returns the index snapshot path, using the default if not specified.
    #[must_use]
    pub fn get_index_path(&self) -> PathBuf {
        self.index_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_PATH))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_index_path() {
        let cli = Cli {
            index_path: None,
            knowledge_dir: None,
            verbose: 0,
            format: "text".to_string(),
            command: Commands::Status,
        };
        assert_eq!(cli.get_index_path(), PathBuf::from(DEFAULT_INDEX_PATH));
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "luxe-assist",
            "-vv",
            "--index-path",
            "/tmp/k.db",
            "search",
            "sofa",
            "--type",
            "product",
            "-n",
            "3",
        ])
        .unwrap_or_else(|e| panic!("parse: {e}"));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.get_index_path(), PathBuf::from("/tmp/k.db"));
        let Commands::Search {
            query,
            n_results,
            document_type,
            category,
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(query, "sofa");
        assert_eq!(n_results, 3);
        assert_eq!(document_type.as_deref(), Some("product"));
        assert!(category.is_none());
    }

    #[test]
    fn test_chat_arguments() {
        let cli = Cli::try_parse_from([
            "luxe-assist",
            "chat",
            "hello",
            "--session",
            "abc",
            "--provider",
            "groq",
        ])
        .unwrap_or_else(|e| panic!("parse: {e}"));
        let Commands::Chat { message, agent } = cli.command else {
            panic!("expected chat");
        };
        assert_eq!(message, "hello");
        assert_eq!(agent.session.as_deref(), Some("abc"));
        assert_eq!(agent.provider.as_deref(), Some("groq"));
    }
}
