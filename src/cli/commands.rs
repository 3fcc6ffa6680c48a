//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Commands return their
//! output as a string; only `repl` writes as it goes.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::agent::{AgentConfig, Assistant, PromptSet};
use crate::cli::output::{
    IndexStatus, OutputFormat, format_hits, format_ingest_report, format_prompts_written,
    format_reply, format_status,
};
#[cfg(feature = "mcp")]
use crate::cli::parser::McpCommands;
use crate::cli::parser::{AgentArgs, Cli, Commands};
use crate::core::SourceKind;
use crate::embedding::create_embedder;
use crate::error::{AgentError, CommandError, Result};
use crate::knowledge::{KnowledgeStore, QueryFilter};
use crate::session::SessionStore;

/// Parameters for the search command.
#[derive(Debug, Clone)]
pub struct SearchParams<'a> {
    /// Search query text.
    pub query: &'a str,
    /// Maximum number of results.
    pub n_results: usize,
    /// Document type filter (product, faq).
    pub document_type: Option<&'a str>,
    /// Category filter.
    pub category: Option<&'a str>,
}

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let index_path = cli.get_index_path();

    match &cli.command {
        Commands::Ingest { path } => {
            let source = path.as_deref().or(cli.knowledge_dir.as_deref());
            cmd_ingest(source, &index_path, format)
        }
        Commands::Search {
            query,
            n_results,
            document_type,
            category,
        } => {
            let params = SearchParams {
                query,
                n_results: *n_results,
                document_type: document_type.as_deref(),
                category: category.as_deref(),
            };
            cmd_search(&index_path, &params, format)
        }
        Commands::Status => cmd_status(&index_path, format),
        Commands::Chat { message, agent } => cmd_chat(cli, agent, message, format),
        Commands::Repl { agent } => cmd_repl(cli, agent, format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
        #[cfg(feature = "mcp")]
        Commands::Mcp(sub) => cmd_mcp(cli, sub),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

/// Opens an existing index snapshot.
fn open_index(index_path: &Path) -> Result<KnowledgeStore> {
    if !index_path.exists() {
        return Err(CommandError::ExecutionFailed(format!(
            "Knowledge index not found at {}. Run `luxe-assist ingest <dir>` first.",
            index_path.display()
        ))
        .into());
    }
    Ok(KnowledgeStore::open(create_embedder(), Some(index_path))?)
}

/// Builds assistant configuration: CLI flags, then environment, then defaults.
fn agent_config(cli: &Cli, args: &AgentArgs) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().index_path(cli.get_index_path());
    if let Some(dir) = &cli.knowledge_dir {
        builder = builder.knowledge_dir(dir);
    }
    if let Some(provider) = &args.provider {
        builder = builder.provider(provider);
    }
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(n) = args.max_iterations {
        builder = builder.max_iterations(n);
    }
    if let Some(secs) = args.max_execution_secs {
        builder = builder.max_execution_time(std::time::Duration::from_secs(secs));
    }
    if let Some(dir) = &args.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    Ok(builder.from_env().build()?)
}

fn cmd_ingest(source: Option<&Path>, index_path: &Path, format: OutputFormat) -> Result<String> {
    let source = source.ok_or_else(|| {
        CommandError::ExecutionFailed(
            "No knowledge source: pass a path or set --knowledge-dir / LUXE_KNOWLEDGE_DIR"
                .to_string(),
        )
    })?;

    let store = KnowledgeStore::open(create_embedder(), Some(index_path))?;
    let report = store.ingest_dir(source)?;
    format_ingest_report(&report, source, index_path, format)
}

fn cmd_search(index_path: &Path, params: &SearchParams<'_>, format: OutputFormat) -> Result<String> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(CommandError::ExecutionFailed("Search query must not be empty".to_string()).into());
    }
    let source = params
        .document_type
        .map(|t| {
            SourceKind::parse(t).ok_or_else(|| {
                CommandError::ExecutionFailed(format!(
                    "Unknown document type '{t}' (expected product or faq)"
                ))
            })
        })
        .transpose()?;
    let filter = QueryFilter {
        source,
        category: params.category.map(str::to_string),
        ..QueryFilter::default()
    };

    let store = open_index(index_path)?;
    let hits = store.query(query, params.n_results, Some(&filter))?;
    debug!(hits = hits.len(), "search complete");
    format_hits(&hits, format)
}

fn cmd_status(index_path: &Path, format: OutputFormat) -> Result<String> {
    let exists = index_path.exists();
    let embedder = create_embedder();
    let embedder_name = embedder.model_name().to_string();
    let store = if exists {
        Some(KnowledgeStore::open(embedder, Some(index_path))?)
    } else {
        None
    };

    let documents = store.as_ref().map(KnowledgeStore::documents).unwrap_or_default();
    let count = |kind: SourceKind| documents.iter().filter(|d| d.metadata.source == kind).count();
    let status = IndexStatus {
        index_path: index_path.to_path_buf(),
        exists,
        ready: store.as_ref().is_some_and(KnowledgeStore::is_ready),
        documents: documents.len(),
        products: count(SourceKind::Product),
        faqs: count(SourceKind::Faq),
        embedder: embedder_name,
    };
    format_status(&status, format)
}

fn cmd_chat(cli: &Cli, args: &AgentArgs, message: &str, format: OutputFormat) -> Result<String> {
    let config = agent_config(cli, args)?;
    let assistant = Assistant::from_config(&config)?;
    let rt = runtime()?;

    let reply = rt.block_on(assistant.respond(args.session.as_deref(), message))?;
    format_reply(&reply, args.show_steps, format)
}

fn cmd_repl(cli: &Cli, args: &AgentArgs, format: OutputFormat) -> Result<String> {
    let config = agent_config(cli, args)?;
    let assistant = Assistant::from_config(&config)?;
    let rt = runtime()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl(
        &assistant,
        &rt,
        args,
        format,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )?;
    Ok(String::new())
}

/// Reads messages line by line until EOF or `exit`/`quit`, answering each
/// within one session.
fn run_repl(
    assistant: &Assistant,
    rt: &tokio::runtime::Runtime,
    args: &AgentArgs,
    format: OutputFormat,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let session_id = args
        .session
        .clone()
        .unwrap_or_else(SessionStore::new_session_id);
    if format == OutputFormat::Text {
        writeln!(output, "Session {session_id}. Type `exit` to quit.")?;
    }

    let mut line = String::new();
    loop {
        if format == OutputFormat::Text {
            write!(output, "you> ")?;
            output.flush()?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        match rt.block_on(assistant.respond(Some(&session_id), message)) {
            Ok(reply) => output.write_all(format_reply(&reply, args.show_steps, format)?.as_bytes())?,
            Err(AgentError::InvalidQuery { message }) => writeln!(output, "({message})")?,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    format_prompts_written(&target_dir, &written, format)
}

#[cfg(feature = "mcp")]
fn cmd_mcp(cli: &Cli, cmd: &McpCommands) -> Result<String> {
    use crate::mcp::{AssistantMcpServer, serve_http, serve_stdio};

    let config = agent_config(cli, &AgentArgs::default())?;
    let server = AssistantMcpServer::new(&config)?;
    let rt = runtime()?;

    rt.block_on(async {
        match cmd {
            McpCommands::Stdio => serve_stdio(server).await,
            McpCommands::Http { host, port } => serve_http(server, host, *port).await,
        }
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}
