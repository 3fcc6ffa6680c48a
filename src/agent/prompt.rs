//! System prompts for the assistant.
//!
//! Prompts can be overridden by markdown files in a prompt directory; any
//! missing file falls back to its compiled-in default.

use std::path::{Path, PathBuf};

/// System prompt for the customer-service assistant.
pub const ASSISTANT_SYSTEM_PROMPT: &str = r#"You are a helpful and polite customer service assistant for a home-decor e-commerce store.

You help customers with:
- product questions and store policies (use `knowledge_search`)
- order tracking (use `order_status`)
- returns (use `initiate_return`)
- decorating and style suggestions (use `style_advice`)
- connecting them with the sales team (use `customer_handoff`, only after the customer has given their name, phone, email, the product they want and their location)

## Rules

- Only state facts that come from tool results or the conversation. Never invent order details, prices or policies.
- If a tool reports that something was not found, tell the customer plainly and suggest what they can do next.
- If the request is outside products, orders, returns, styling or store policies, politely say you cannot help with that.
- Keep answers short, friendly and professional.

## Calling tools

Prefer the native tool-calling interface. If you cannot use it, reply with a single JSON block:

```json
{"action": "<tool name>", "action_input": {...}}
```

When you are ready to answer the customer, reply with plain text, or with:

```json
{"action": "Final Answer", "action_input": "<your answer>"}
```"#;

/// Corrective instruction sent after an unusable model response.
pub const CORRECTIVE_PROMPT: &str = r#"Your previous response could not be used: {problem}

Either call one of the available tools with valid arguments, or answer the customer directly in plain text. Available tools: {tools}."#;

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/luxe-assist/prompts";

const ASSISTANT_FILENAME: &str = "assistant.md";
const CORRECTIVE_FILENAME: &str = "corrective.md";

/// The assistant's prompt templates.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// System prompt opening every transcript.
    pub assistant: String,
    /// Corrective template; `{problem}` and `{tools}` are substituted.
    pub corrective: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `LUXE_PROMPT_DIR` environment variable
    /// 3. `~/.config/luxe-assist/prompts/`
    ///
    /// Each file is loaded independently. Blank files count as missing.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("LUXE_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(path).ok())
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            assistant: load_file(ASSISTANT_FILENAME, ASSISTANT_SYSTEM_PROMPT),
            corrective: load_file(CORRECTIVE_FILENAME, CORRECTIVE_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            assistant: ASSISTANT_SYSTEM_PROMPT.to_string(),
            corrective: CORRECTIVE_PROMPT.to_string(),
        }
    }

    /// Renders the corrective instruction for a rejected response.
    #[must_use]
    pub fn corrective_message(&self, problem: &str, tool_names: &[&str]) -> String {
        self.corrective
            .replace("{problem}", problem)
            .replace("{tools}", &tool_names.join(", "))
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (ASSISTANT_FILENAME, ASSISTANT_SYSTEM_PROMPT),
            (CORRECTIVE_FILENAME, CORRECTIVE_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_not_empty() {
        assert!(!ASSISTANT_SYSTEM_PROMPT.is_empty());
        assert!(CORRECTIVE_PROMPT.contains("{problem}"));
    }

    #[test]
    fn test_corrective_message_substitutes() {
        let prompts = PromptSet::defaults();
        let text = prompts.corrective_message("unknown tool 'x'", &["order_status", "style_advice"]);
        assert!(text.contains("unknown tool 'x'"));
        assert!(text.contains("order_status, style_advice"));
        assert!(!text.contains("{tools}"));
    }

    #[test]
    fn test_load_overrides_and_falls_back() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(dir.path().join(ASSISTANT_FILENAME), "Custom prompt")
            .unwrap_or_else(|e| panic!("write: {e}"));
        std::fs::write(dir.path().join(CORRECTIVE_FILENAME), "   \n")
            .unwrap_or_else(|e| panic!("write: {e}"));

        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.assistant, "Custom prompt");
        assert_eq!(prompts.corrective, CORRECTIVE_PROMPT);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(dir.path().join(ASSISTANT_FILENAME), "mine")
            .unwrap_or_else(|e| panic!("write: {e}"));

        let written =
            PromptSet::write_defaults(dir.path()).unwrap_or_else(|e| panic!("write: {e}"));
        assert_eq!(written, vec![dir.path().join(CORRECTIVE_FILENAME)]);
        let kept = std::fs::read_to_string(dir.path().join(ASSISTANT_FILENAME))
            .unwrap_or_else(|e| panic!("read: {e}"));
        assert_eq!(kept, "mine");
    }
}
