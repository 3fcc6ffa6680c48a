//! Records of a single agent run.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::message::TokenUsage;
use crate::core::Turn;

/// Fallback answer when a run stops early without any tool observation.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I wasn't able to complete your request right now. \
     Please try again in a moment, or rephrase your question.";

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model produced a final answer.
    FinalAnswer,
    /// The tool-calling round limit was reached.
    IterationLimit,
    /// The wall-clock budget ran out.
    TimeLimit,
    /// The model produced unusable output twice in a row.
    MalformedOutput,
    /// The completion provider failed.
    ProviderError,
}

impl StopReason {
    /// Returns the reason as a `snake_case` string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinalAnswer => "final_answer",
            Self::IterationLimit => "iteration_limit",
            Self::TimeLimit => "time_limit",
            Self::MalformedOutput => "malformed_output",
            Self::ProviderError => "provider_error",
        }
    }

    /// Returns `true` when the run ended through the early-stopping policy.
    #[must_use]
    pub const fn is_early_stop(self) -> bool {
        !matches!(self, Self::FinalAnswer)
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    /// Tool that ran.
    pub tool_name: String,
    /// Arguments it received.
    pub tool_input: Value,
    /// Observation it produced.
    pub tool_output: String,
}

/// The full record of one request's run through the loop.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    /// Customer query.
    pub query: String,
    /// History the run started from.
    pub history_snapshot: Vec<Turn>,
    /// Executed tool calls, in order.
    pub steps: Vec<AgentStep>,
    /// Answer returned to the customer. Never empty.
    pub final_output: String,
    /// Tool-calling rounds used.
    pub iterations_used: usize,
    /// Wall-clock time spent.
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed_time: Duration,
    /// Why the run ended.
    pub stop_reason: StopReason,
    /// Tokens consumed across all completions.
    pub usage: TokenUsage,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Answer for a run that stopped early: the latest non-empty observation,
/// otherwise [`FALLBACK_ANSWER`].
#[must_use]
pub fn early_stop_answer(steps: &[AgentStep]) -> String {
    steps
        .iter()
        .rev()
        .map(|s| s.tool_output.trim())
        .find(|o| !o.is_empty())
        .map_or_else(|| FALLBACK_ANSWER.to_string(), str::to_string)
}

/// Answer for a completed run: step outputs in call order, then the
/// model's closing text, separated by blank lines.
#[must_use]
pub fn compose_answer(steps: &[AgentStep], closing: &str) -> String {
    let parts: Vec<&str> = steps
        .iter()
        .map(|s| s.tool_output.trim())
        .chain(std::iter::once(closing.trim()))
        .filter(|p| !p.is_empty())
        .collect();
    let joined = parts.join("\n\n");
    if joined.is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(output: &str) -> AgentStep {
        AgentStep {
            tool_name: "order_status".to_string(),
            tool_input: serde_json::json!({"order_id": "ORD-1"}),
            tool_output: output.to_string(),
        }
    }

    #[test]
    fn test_early_stop_prefers_latest_observation() {
        let steps = vec![step("first"), step("second"), step("  ")];
        assert_eq!(early_stop_answer(&steps), "second");
        assert_eq!(early_stop_answer(&[]), FALLBACK_ANSWER);
    }

    #[test]
    fn test_compose_answer_joins_in_order() {
        let steps = vec![step("Order ID: ORD-1\nStatus: Shipped\n"), step("")];
        assert_eq!(
            compose_answer(&steps, " It should arrive soon. "),
            "Order ID: ORD-1\nStatus: Shipped\n\nIt should arrive soon."
        );
        assert_eq!(compose_answer(&[], "Hello"), "Hello");
        assert_eq!(compose_answer(&[], "  "), FALLBACK_ANSWER);
    }

    #[test]
    fn test_stop_reason_strings() {
        assert_eq!(StopReason::TimeLimit.to_string(), "time_limit");
        assert!(!StopReason::FinalAnswer.is_early_stop());
        assert!(StopReason::ProviderError.is_early_stop());
        let json = serde_json::to_string(&StopReason::IterationLimit).unwrap_or_default();
        assert_eq!(json, "\"iteration_limit\"");
    }
}
