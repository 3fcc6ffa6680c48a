//! Error types for luxe-assist.
//!
//! Each layer has its own error enum. Recoverable failures inside a request
//! (retrieval, tool business failures, malformed model output) never reach
//! the caller as errors; only startup/configuration problems and caller
//! contract violations do.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for CLI and library entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// Knowledge store failure.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Snapshot storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Agent configuration or provider failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Tool registration failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Tool contract violation.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the agent layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured for the completion provider.
    #[error(
        "API key missing: set OPENAI_API_KEY, GROQ_API_KEY or LUXE_API_KEY, or pass --api-key"
    )]
    ApiKeyMissing,

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name from configuration.
        name: String,
    },

    /// The completion API request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error message from the SDK or transport.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The caller supplied a query the assistant will not process.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Why the query was rejected.
        message: String,
    },
}

/// Errors raised by the knowledge store.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Query issued before any index was published.
    #[error("knowledge index unavailable: no successful ingestion yet")]
    IndexUnavailable,

    /// The embedding provider failed.
    #[error("embedding failed: {message}")]
    Embedding {
        /// Provider error message.
        message: String,
    },

    /// The snapshot store failed.
    #[error("index storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The knowledge source path could not be read.
    #[error("knowledge source unavailable at {path}: {message}")]
    Source {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },
}

/// Errors raised by the SQLite snapshot store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite reported an error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The snapshot directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be decoded.
    #[error("corrupt snapshot row {id}: {message}")]
    Corrupt {
        /// Document id of the row.
        id: String,
        /// What failed to decode.
        message: String,
    },
}

/// Contract violations raised by tool dispatch.
///
/// Business-level failures (order not found, backend down) are *not* tool
/// errors: tools report them as observation text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("unknown tool '{name}'")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// The input did not match the tool's schema.
    #[error("invalid input for tool '{name}': {message}")]
    InvalidToolInput {
        /// Tool name.
        name: String,
        /// Validation failure.
        message: String,
    },
}

/// Errors raised while building the tool registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two tools share a name.
    #[error("duplicate tool registration: '{name}'")]
    DuplicateTool {
        /// The duplicated name.
        name: String,
    },
}

/// Errors from external collaborators (commerce API, handoff webhook).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request could not be sent or timed out.
    #[error("request failed: {message}")]
    Request {
        /// Transport error message.
        message: String,
    },

    /// The collaborator answered with an unexpected status.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// The response body could not be decoded.
    #[error("could not decode response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode {
                message: e.to_string(),
            }
        } else {
            Self::Request {
                message: e.to_string(),
            }
        }
    }
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_messages() {
        let err = ToolError::UnknownTool {
            name: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "unknown tool 'teleport'");

        let err = ToolError::InvalidToolInput {
            name: "order_status".to_string(),
            message: "missing field `order_id`".to_string(),
        };
        assert!(err.to_string().contains("order_status"));
        assert!(err.to_string().contains("order_id"));
    }

    #[test]
    fn test_retrieval_error_converts_into_top_level() {
        let err: Error = RetrievalError::IndexUnavailable.into();
        assert!(matches!(err, Error::Retrieval(RetrievalError::IndexUnavailable)));
    }

    #[test]
    fn test_api_key_missing_mentions_env_vars() {
        let msg = AgentError::ApiKeyMissing.to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
    }
}
