//! Output formatting for CLI commands.
//!
//! Every command renders either human-readable text or pretty JSON.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::agent::{AgentStep, AssistantReply};
use crate::error::{CommandError, Result};
use crate::knowledge::{IngestReport, QueryHit};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything but `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Serializes `value` as pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`CommandError::OutputFormat`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::OutputFormat(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

/// Formats an ingestion report.
pub fn format_ingest_report(
    report: &IngestReport,
    source: &Path,
    index_path: &Path,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Out<'a> {
                source: &'a Path,
                index_path: &'a Path,
                #[serde(flatten)]
                report: &'a IngestReport,
            }
            to_json(&Out {
                source,
                index_path,
                report,
            })
        }
        OutputFormat::Text => {
            let mut out = format!(
                "Indexed {} document(s) from {}\n",
                report.documents_indexed,
                source.display()
            );
            let _ = writeln!(
                out,
                "  records: {} seen, {} skipped",
                report.records_seen, report.records_skipped
            );
            let _ = writeln!(
                out,
                "  files:   {} read, {} skipped",
                report.files_read, report.files_skipped
            );
            let _ = writeln!(out, "  index:   {}", index_path.display());
            Ok(out)
        }
    }
}

/// Formats search hits.
pub fn format_hits(hits: &[QueryHit], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(hits),
        OutputFormat::Text => {
            if hits.is_empty() {
                return Ok("No matching documents.\n".to_string());
            }
            let mut out = String::new();
            for (rank, hit) in hits.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} [{} / {}] distance {:.4}",
                    rank + 1,
                    hit.id,
                    hit.metadata.source,
                    hit.metadata.category,
                    hit.distance
                );
                if let Some(price) = hit.metadata.price {
                    let _ = writeln!(out, "   price: ${price:.2}");
                }
                let _ = writeln!(out, "   {}", hit.text);
            }
            Ok(out)
        }
    }
}

/// Index status for `status`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    /// Snapshot location.
    pub index_path: PathBuf,
    /// Whether the snapshot file exists.
    pub exists: bool,
    /// Whether an index was loaded.
    pub ready: bool,
    /// Indexed documents.
    pub documents: usize,
    /// Indexed products.
    pub products: usize,
    /// Indexed FAQs.
    pub faqs: usize,
    /// Embedding model in use.
    pub embedder: String,
}

/// Formats index status.
pub fn format_status(status: &IndexStatus, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(status),
        OutputFormat::Text => {
            let mut out = format!("Index: {}\n", status.index_path.display());
            if !status.ready {
                out.push_str("  not built yet (run `luxe-assist ingest <dir>`)\n");
                return Ok(out);
            }
            let _ = writeln!(
                out,
                "  documents: {} ({} products, {} FAQs)",
                status.documents, status.products, status.faqs
            );
            let _ = writeln!(out, "  embedder:  {}", status.embedder);
            Ok(out)
        }
    }
}

/// Formats an assistant reply.
pub fn format_reply(reply: &AssistantReply, show_steps: bool, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(reply),
        OutputFormat::Text => {
            let mut out = String::new();
            if show_steps {
                out.push_str(&format_steps(&reply.steps));
            }
            out.push_str(&reply.answer);
            out.push('\n');
            if show_steps {
                let _ = writeln!(
                    out,
                    "\n[session {} | {} | {} round(s) | {} ms]",
                    reply.session_id,
                    reply.stop_reason,
                    reply.iterations_used,
                    reply.elapsed.as_millis()
                );
            }
            Ok(out)
        }
    }
}

fn format_steps(steps: &[AgentStep]) -> String {
    let mut out = String::new();
    for step in steps {
        let _ = writeln!(out, "> {} {}", step.tool_name, step.tool_input);
        for line in step.tool_output.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    if !steps.is_empty() {
        out.push('\n');
    }
    out
}

/// Formats the result of `init-prompts`.
pub fn format_prompts_written(
    dir: &Path,
    written: &[PathBuf],
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Out<'a> {
                dir: &'a Path,
                written: &'a [PathBuf],
            }
            to_json(&Out { dir, written })
        }
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    dir.display()
                ));
            }
            let mut out = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                dir.display()
            );
            for path in written {
                let _ = writeln!(
                    out,
                    "  {}",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown")
                );
            }
            out.push_str("\nEdit these files to customize the assistant's prompts.\n");
            Ok(out)
        }
    }
}
