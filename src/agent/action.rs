//! Interpreting a completion as the model's next move.
//!
//! Models either use native function calling or, when they fall back to
//! text, emit a JSON action block:
//!
//! ```text
//! {"action": "order_status", "action_input": {"order_id": "ORD-12345"}}
//! {"action": "Final Answer", "action_input": "Your order has shipped."}
//! ```
//!
//! Anything else that is non-empty text is taken as the final answer.

use serde_json::Value;

use super::message::ChatResponse;
use super::tool::ToolCall;

/// Action name that ends the run in a text action block.
pub const FINAL_ANSWER_ACTION: &str = "Final Answer";

/// What the model asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAction {
    /// Invoke one or more tools.
    ToolCalls {
        /// Calls in the order the model issued them.
        calls: Vec<ToolCall>,
        /// `true` for provider function calls, `false` for text action blocks.
        native: bool,
    },
    /// Answer the customer.
    FinalAnswer(String),
    /// Unusable output; the text says what was wrong.
    Malformed(String),
}

impl ModelAction {
    /// Interprets a completion.
    ///
    /// `round` numbers synthetic ids for calls parsed from text.
    #[must_use]
    pub fn from_response(response: &ChatResponse, round: usize) -> Self {
        if !response.tool_calls.is_empty() {
            return Self::ToolCalls {
                calls: response.tool_calls.clone(),
                native: true,
            };
        }
        Self::from_text(&response.content, round)
    }

    /// Interprets plain completion text.
    #[must_use]
    pub fn from_text(text: &str, round: usize) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::Malformed("the response was empty".to_string());
        }

        let Some(block) = action_block(text) else {
            return Self::FinalAnswer(text.to_string());
        };

        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(block) else {
            return Self::Malformed("the JSON action block could not be parsed".to_string());
        };
        let Some(action) = map.get("action").and_then(Value::as_str).map(str::trim) else {
            return Self::Malformed("the action block has no \"action\" name".to_string());
        };
        let input = map.get("action_input").cloned().unwrap_or(Value::Null);

        if action.eq_ignore_ascii_case(FINAL_ANSWER_ACTION) {
            let answer = match input {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Self::Malformed("the final answer was empty".to_string());
            }
            return Self::FinalAnswer(answer.to_string());
        }
        if action.is_empty() {
            return Self::Malformed("the action name was empty".to_string());
        }

        Self::ToolCalls {
            calls: vec![ToolCall {
                id: format!("text-call-{round}"),
                name: action.to_string(),
                arguments: input.to_string(),
            }],
            native: false,
        }
    }
}

/// Finds a JSON action block: a fenced block or the whole text, when it is
/// an object mentioning `"action"`.
fn action_block(text: &str) -> Option<&str> {
    let candidate = fenced_body(text).unwrap_or(text).trim();
    (candidate.starts_with('{') && candidate.contains("\"action\"")).then_some(candidate)
}

/// Body of the first ```` ``` ```` fence, without its language tag.
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}
