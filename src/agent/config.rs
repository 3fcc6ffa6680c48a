//! Assistant configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use super::agentic_loop::MAX_RUN_BUDGET;
use crate::error::AgentError;

/// Default completion provider.
pub const DEFAULT_PROVIDER: &str = "openai";
/// Default model for the `openai` provider.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default model for the `groq` provider.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
/// Groq's `OpenAI`-compatible endpoint.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default tool-calling rounds per request.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
/// Default wall-clock budget per request, in seconds.
pub const DEFAULT_MAX_EXECUTION_SECS: u64 = 60;
/// Default number of turns kept per session.
pub const DEFAULT_HISTORY_TURNS: usize = 10;
/// Default number of documents returned by knowledge search.
pub const DEFAULT_RETRIEVAL_RESULTS: usize = 5;
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.0;
/// Default completion token limit.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Configuration for the assistant.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Completion provider name (`openai` or `groq`).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Tool-calling rounds allowed per request.
    pub max_iterations: usize,
    /// Wall-clock budget for one request.
    pub max_execution_time: Duration,
    /// Turns retained per session.
    pub history_turns: usize,
    /// Documents returned by each knowledge search.
    pub retrieval_results: usize,
    /// Directory of knowledge source files ingested at startup.
    pub knowledge_dir: Option<PathBuf>,
    /// `SQLite` snapshot of the knowledge index.
    pub index_path: Option<PathBuf>,
    /// Commerce REST backend; the in-memory demo backend is used when unset.
    pub commerce_url: Option<String>,
    /// Webhook receiving customer handoffs.
    pub handoff_webhook_url: Option<String>,
    /// Directory containing prompt template files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found, or
    /// [`AgentError::InvalidConfig`] for out-of-range bounds.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_iterations: Option<usize>,
    max_execution_time: Option<Duration>,
    history_turns: Option<usize>,
    retrieval_results: Option<usize>,
    knowledge_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    commerce_url: Option<String>,
    handoff_webhook_url: Option<String>,
    prompt_dir: Option<PathBuf>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = env_string("LUXE_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = env_string("OPENAI_API_KEY")
                .or_else(|| env_string("GROQ_API_KEY"))
                .or_else(|| env_string("LUXE_API_KEY"));
        }
        if self.base_url.is_none() {
            self.base_url = env_string("OPENAI_BASE_URL").or_else(|| env_string("LUXE_BASE_URL"));
        }
        if self.model.is_none() {
            self.model = env_string("LUXE_MODEL");
        }
        if self.max_iterations.is_none() {
            self.max_iterations = env_parse("LUXE_MAX_ITERATIONS");
        }
        if self.max_execution_time.is_none() {
            self.max_execution_time =
                env_parse::<u64>("LUXE_MAX_EXECUTION_SECS").map(Duration::from_secs);
        }
        if self.history_turns.is_none() {
            self.history_turns = env_parse("LUXE_HISTORY_TURNS");
        }
        if self.retrieval_results.is_none() {
            self.retrieval_results = env_parse("LUXE_RETRIEVAL_RESULTS");
        }
        if self.knowledge_dir.is_none() {
            self.knowledge_dir = env_string("LUXE_KNOWLEDGE_DIR").map(PathBuf::from);
        }
        if self.index_path.is_none() {
            self.index_path = env_string("LUXE_INDEX_PATH").map(PathBuf::from);
        }
        if self.commerce_url.is_none() {
            self.commerce_url = env_string("LUXE_COMMERCE_URL");
        }
        if self.handoff_webhook_url.is_none() {
            self.handoff_webhook_url = env_string("LUXE_HANDOFF_WEBHOOK_URL");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = env_string("LUXE_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the completion token limit.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the tool-calling round limit.
    #[must_use]
    pub const fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the per-request time budget.
    #[must_use]
    pub const fn max_execution_time(mut self, budget: Duration) -> Self {
        self.max_execution_time = Some(budget);
        self
    }

    /// Sets the session history cap.
    #[must_use]
    pub const fn history_turns(mut self, n: usize) -> Self {
        self.history_turns = Some(n);
        self
    }

    /// Sets the number of documents per knowledge search.
    #[must_use]
    pub const fn retrieval_results(mut self, n: usize) -> Self {
        self.retrieval_results = Some(n);
        self
    }

    /// Sets the knowledge source directory.
    #[must_use]
    pub fn knowledge_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.knowledge_dir = Some(dir.into());
        self
    }

    /// Sets the index snapshot path.
    #[must_use]
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    /// Sets the commerce backend URL.
    #[must_use]
    pub fn commerce_url(mut self, url: impl Into<String>) -> Self {
        self.commerce_url = Some(url.into());
        self
    }

    /// Sets the customer handoff webhook URL.
    #[must_use]
    pub fn handoff_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.handoff_webhook_url = Some(url.into());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`AgentError::InvalidConfig`] when the iteration limit, time budget or
    /// retrieval count is zero, the time budget exceeds [`MAX_RUN_BUDGET`],
    /// or the history cap cannot hold one turn pair.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let provider = self
            .provider
            .map_or_else(|| DEFAULT_PROVIDER.to_string(), |p| p.trim().to_lowercase());
        let is_groq = provider == "groq";

        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        if max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1"));
        }
        let max_execution_time = self
            .max_execution_time
            .unwrap_or(Duration::from_secs(DEFAULT_MAX_EXECUTION_SECS));
        if max_execution_time.is_zero() {
            return Err(invalid("max_execution_time must be greater than zero"));
        }
        if max_execution_time > MAX_RUN_BUDGET {
            return Err(invalid(&format!(
                "max_execution_time must be at most {} seconds",
                MAX_RUN_BUDGET.as_secs()
            )));
        }
        let history_turns = self.history_turns.unwrap_or(DEFAULT_HISTORY_TURNS);
        if history_turns < 2 {
            return Err(invalid("history_turns must be at least 2 (one user/assistant pair)"));
        }
        let retrieval_results = self.retrieval_results.unwrap_or(DEFAULT_RETRIEVAL_RESULTS);
        if retrieval_results == 0 {
            return Err(invalid("retrieval_results must be at least 1"));
        }

        Ok(AgentConfig {
            base_url: self
                .base_url
                .or_else(|| is_groq.then(|| GROQ_BASE_URL.to_string())),
            model: self.model.unwrap_or_else(|| {
                if is_groq {
                    DEFAULT_GROQ_MODEL
                } else {
                    DEFAULT_OPENAI_MODEL
                }
                .to_string()
            }),
            provider,
            api_key,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_iterations,
            max_execution_time,
            history_turns,
            retrieval_results,
            knowledge_dir: self.knowledge_dir,
            index_path: self.index_path,
            commerce_url: self.commerce_url,
            handoff_webhook_url: self.handoff_webhook_url,
            prompt_dir: self.prompt_dir,
        })
    }
}

fn invalid(message: &str) -> AgentError {
    AgentError::InvalidConfig {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.max_execution_time, Duration::from_secs(60));
        assert_eq!(config.history_turns, 10);
        assert_eq!(config.retrieval_results, 5);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AgentConfig::builder().build();
        assert!(matches!(result, Err(AgentError::ApiKeyMissing)));

        let blank = AgentConfig::builder().api_key("  ").build();
        assert!(matches!(blank, Err(AgentError::ApiKeyMissing)));
    }

    #[test]
    fn test_groq_defaults() {
        let config = AgentConfig::builder()
            .api_key("gsk")
            .provider("Groq")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "groq");
        assert_eq!(config.base_url.as_deref(), Some(GROQ_BASE_URL));
        assert_eq!(config.model, DEFAULT_GROQ_MODEL);
    }

    #[test]
    fn test_explicit_base_url_wins_for_groq() {
        let config = AgentConfig::builder()
            .api_key("gsk")
            .provider("groq")
            .base_url("http://localhost:8080/v1")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_zero_bounds_rejected() {
        let zero_iters = AgentConfig::builder().api_key("k").max_iterations(0).build();
        assert!(matches!(zero_iters, Err(AgentError::InvalidConfig { .. })));

        let zero_time = AgentConfig::builder()
            .api_key("k")
            .max_execution_time(Duration::ZERO)
            .build();
        assert!(matches!(zero_time, Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn test_oversized_budget_rejected() {
        let huge = AgentConfig::builder()
            .api_key("k")
            .max_execution_time(Duration::from_secs(u64::MAX))
            .build();
        assert!(matches!(huge, Err(AgentError::InvalidConfig { .. })));

        let at_limit = AgentConfig::builder()
            .api_key("k")
            .max_execution_time(MAX_RUN_BUDGET)
            .build();
        assert!(at_limit.is_ok());
    }

    #[test]
    fn test_history_cap_must_hold_a_pair() {
        let one = AgentConfig::builder().api_key("k").history_turns(1).build();
        assert!(matches!(one, Err(AgentError::InvalidConfig { .. })));

        let two = AgentConfig::builder().api_key("k").history_turns(2).build();
        assert!(two.is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .model("gpt-4o")
            .max_iterations(3)
            .max_execution_time(Duration::from_secs(5))
            .retrieval_results(8)
            .commerce_url("http://localhost:8000")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.max_execution_time, Duration::from_secs(5));
        assert_eq!(config.retrieval_results, 8);
        assert_eq!(config.commerce_url.as_deref(), Some("http://localhost:8000"));
    }
}
