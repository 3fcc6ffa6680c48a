//! Bounded tool-calling loop.
//!
//! Drives the model ↔ tool round-trip for one request: asks the model for
//! its next action, validates and executes any tool calls, appends the
//! observations and repeats until the model answers. Every provider and
//! tool call runs under the request deadline, and the loop always ends
//! with a non-empty answer.

use std::time::{Duration, Instant};

use tokio::time::timeout_at;
use tracing::{debug, info, warn};

use super::action::ModelAction;
use super::config::AgentConfig;
use super::message::{
    ChatRequest, TokenUsage, assistant_message, assistant_tool_calls_message, system_message,
    tool_message, turn_message, user_message,
};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::run::{AgentRun, AgentStep, StopReason, compose_answer, early_stop_answer};
use super::tool::ToolCall;
use crate::core::Turn;
use crate::error::ToolError;
use crate::tools::{PreparedCall, ToolRegistry};

/// Consecutive unusable responses tolerated before giving up.
const MAX_MALFORMED_STREAK: usize = 2;

/// Longest wall-clock budget a run honours, whatever the settings say.
pub const MAX_RUN_BUDGET: Duration = Duration::from_secs(24 * 60 * 60);

/// Model parameters and bounds for one run.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Completion token limit.
    pub max_tokens: Option<u32>,
    /// Tool-calling rounds allowed.
    pub max_iterations: usize,
    /// Wall-clock budget.
    pub max_execution_time: Duration,
}

impl LoopSettings {
    /// Takes the loop settings from assistant configuration.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            max_iterations: config.max_iterations,
            max_execution_time: config.max_execution_time,
        }
    }
}

/// Runs one request through the loop.
///
/// The transcript is the system prompt, then `history`, then `query`.
/// Unknown tools and invalid tool input are treated like malformed output:
/// the model gets one corrective re-prompt, and a second consecutive
/// failure ends the run. Provider errors, the iteration limit and the
/// deadline end the run through the early-stopping policy.
#[allow(clippy::future_not_send, clippy::too_many_lines)]
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    registry: &ToolRegistry,
    prompts: &PromptSet,
    settings: &LoopSettings,
    history: &[Turn],
    query: &str,
) -> AgentRun {
    let started = Instant::now();
    let deadline = run_deadline(tokio::time::Instant::now(), settings.max_execution_time);

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(system_message(&prompts.assistant));
    messages.extend(history.iter().map(turn_message));
    messages.push(user_message(query));

    let mut request = ChatRequest {
        model: settings.model.clone(),
        messages,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        tools: registry.definitions(),
    };

    let mut steps: Vec<AgentStep> = Vec::new();
    let mut usage = TokenUsage::default();
    let mut iterations = 0;
    let mut malformed_streak = 0;
    let mut round = 0;

    let (final_output, stop_reason) = 'rounds: loop {
        round += 1;
        let response = match timeout_at(deadline, provider.chat(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "completion failed");
                break (early_stop_answer(&steps), StopReason::ProviderError);
            }
            Err(_) => {
                warn!(round, "time budget exhausted waiting for the model");
                break (early_stop_answer(&steps), StopReason::TimeLimit);
            }
        };
        usage.accumulate(response.usage);

        let problem = match ModelAction::from_response(&response, round) {
            ModelAction::FinalAnswer(text) => {
                break (compose_answer(&steps, &text), StopReason::FinalAnswer);
            }
            ModelAction::Malformed(problem) => {
                if !response.content.trim().is_empty() {
                    request.messages.push(assistant_message(&response.content));
                }
                problem
            }
            ModelAction::ToolCalls { calls, native } => match prepare_all(registry, &calls) {
                Ok(prepared) => {
                    malformed_streak = 0;
                    iterations += 1;
                    debug!(
                        iteration = iterations,
                        tool_count = prepared.len(),
                        "executing tool calls"
                    );
                    push_call_message(&mut request, &response.content, calls, native);

                    for call in prepared {
                        let call_id = call.call_id.clone();
                        let tool_name = call.tool_name;
                        let tool_input = call.arguments.clone();
                        let Ok(output) = timeout_at(deadline, registry.execute(call)).await else {
                            warn!(tool = tool_name, "time budget exhausted during tool call");
                            break 'rounds (early_stop_answer(&steps), StopReason::TimeLimit);
                        };
                        debug!(tool = tool_name, input = %tool_input, output = %output, "tool call complete");

                        if native {
                            request.messages.push(tool_message(&call_id, &output));
                        } else {
                            request.messages.push(user_message(&format!(
                                "Observation from {tool_name}:\n{output}"
                            )));
                        }
                        steps.push(AgentStep {
                            tool_name: tool_name.to_string(),
                            tool_input,
                            tool_output: output,
                        });
                    }

                    if iterations >= settings.max_iterations {
                        warn!(iterations, "iteration limit reached");
                        break (early_stop_answer(&steps), StopReason::IterationLimit);
                    }
                    continue;
                }
                Err(e) => {
                    let problem = e.to_string();
                    push_rejected_calls(&mut request, &response.content, calls, native, &problem);
                    problem
                }
            },
        };

        malformed_streak += 1;
        debug!(round, malformed_streak, problem = %problem, "unusable model response");
        if malformed_streak >= MAX_MALFORMED_STREAK {
            warn!(round, "model output unusable after corrective retry");
            break (early_stop_answer(&steps), StopReason::MalformedOutput);
        }
        request.messages.push(user_message(
            &prompts.corrective_message(&problem, &registry.names()),
        ));
    };

    let run = AgentRun {
        query: query.to_string(),
        history_snapshot: history.to_vec(),
        steps,
        final_output,
        iterations_used: iterations,
        elapsed_time: started.elapsed(),
        stop_reason,
        usage,
    };
    info!(
        stop_reason = %run.stop_reason,
        iterations = run.iterations_used,
        steps = run.steps.len(),
        total_tokens = run.usage.total_tokens,
        elapsed_ms = u64::try_from(run.elapsed_time.as_millis()).unwrap_or(u64::MAX),
        "agent run complete"
    );
    run
}

/// Deadline `budget` after `start`, capped at [`MAX_RUN_BUDGET`].
fn run_deadline(start: tokio::time::Instant, budget: Duration) -> tokio::time::Instant {
    let budget = budget.min(MAX_RUN_BUDGET);
    start.checked_add(budget).unwrap_or(start)
}

/// Validates every call before any of them runs.
fn prepare_all(registry: &ToolRegistry, calls: &[ToolCall]) -> Result<Vec<PreparedCall>, ToolError> {
    calls.iter().map(|call| registry.prepare(call)).collect()
}

fn push_call_message(request: &mut ChatRequest, content: &str, calls: Vec<ToolCall>, native: bool) {
    if native {
        request
            .messages
            .push(assistant_tool_calls_message(content, calls));
    } else {
        request.messages.push(assistant_message(content));
    }
}

/// Records a rejected response so the transcript stays well-formed: native
/// calls each get an error result, since providers require one per call id.
fn push_rejected_calls(
    request: &mut ChatRequest,
    content: &str,
    calls: Vec<ToolCall>,
    native: bool,
    problem: &str,
) {
    if native {
        let ids: Vec<String> = calls.iter().map(|c| c.id.clone()).collect();
        request
            .messages
            .push(assistant_tool_calls_message(content, calls));
        for id in ids {
            request
                .messages
                .push(tool_message(&id, &format!("Error: {problem}")));
        }
    } else if !content.trim().is_empty() {
        request.messages.push(assistant_message(content));
    }
}
