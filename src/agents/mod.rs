//! Agent layer - one LLM round-trip per invocation
//!
//! `Agent` wraps a single call so every agent uniformly gets the cost guard,
//! structured logging, retry with backoff on transient provider errors, and
//! tolerant JSON parsing. Fan-out across calls belongs to the orchestrator,
//! never to an agent.

pub mod analyzer;
pub mod expander;
pub mod gaps;
pub mod planner;
pub mod prompts;
pub mod researcher;
pub mod validator;

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::cost::CostTracker;
use crate::error::{Result, ScoutError};
use crate::llm::{CompletionRequest, LlmClient, ToolCall, estimate_tokens};
use crate::logging::RunLogger;

pub use analyzer::{ContentAnalyzer, ContextAnalysis};
pub use expander::TermExpander;
pub use gaps::{CategoryGapAnalysis, GapAnalyzer};
pub use planner::QueryPlanner;
pub use researcher::{RawHit, Researcher};
pub use validator::{ValidatedLink, Validator};

/// Transient-error retry schedule: attempts beyond the first, base delay.
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Usage record for one completed call.
#[derive(Debug, Clone)]
pub struct CallUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub elapsed_secs: f64,
    pub cost_usd: f64,
}

/// Outcome of one agent call.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: CallUsage,
}

/// Shared per-agent call wrapper.
#[derive(Clone)]
pub struct Agent {
    name: &'static str,
    model: String,
    client: Arc<dyn LlmClient>,
    cost: Arc<CostTracker>,
    logger: Arc<RunLogger>,
}

impl Agent {
    pub fn new(
        name: &'static str,
        model: impl Into<String>,
        client: Arc<dyn LlmClient>,
        cost: Arc<CostTracker>,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            name,
            model: model.into(),
            client,
            cost,
            logger,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One guarded, logged LLM round-trip.
    ///
    /// The ceiling check runs before the call; ceiling and wall-time are
    /// never retried, transient provider errors are.
    pub async fn call(&self, request: CompletionRequest) -> Result<AgentReply> {
        let estimate = self.estimate(&request);
        self.cost.check_ceiling(&self.model, estimate)?;

        let request = if request.model.is_none() {
            request.with_model(self.model.clone())
        } else {
            request
        };
        let messages_json = request.messages_json();
        let system = request.system.clone();

        let started = Instant::now();
        let response = self.complete_with_retry(request).await?;
        let elapsed_secs = started.elapsed().as_secs_f64();

        let cost_usd = self.cost.track_usage(
            &self.model,
            response.usage.input_tokens,
            response.usage.output_tokens,
            self.name,
            serde_json::json!({ "elapsed_secs": elapsed_secs }),
        );

        self.logger.llm_call(
            "call",
            self.name,
            &self.model,
            &system,
            &messages_json,
            &response.content,
            response.usage.input_tokens,
            response.usage.output_tokens,
            cost_usd,
            elapsed_secs,
        );
        self.logger.event(
            crate::logging::Component::Cost,
            crate::logging::Level::Debug,
            "call",
            "usage",
            serde_json::json!({
                "agent": self.name,
                "model": self.model,
                "cost_usd": cost_usd,
                "running_total_usd": self.cost.total(),
            }),
        );

        Ok(AgentReply {
            text: response.content,
            tool_calls: response.tool_calls,
            usage: CallUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
                elapsed_secs,
                cost_usd,
            },
        })
    }

    /// Call expecting a JSON completion. A decode failure gets exactly one
    /// retry with a repair hint appended; the second failure propagates.
    pub async fn call_json<T: DeserializeOwned>(&self, request: CompletionRequest) -> Result<T> {
        let reply = self.call(request.clone()).await?;
        match parse_json_completion::<T>(&reply.text) {
            Ok(parsed) => Ok(parsed),
            Err(first_error) => {
                warn!("{}: {}; retrying with repair hint", self.name, first_error);
                self.logger.error(
                    crate::logging::Component::Agent,
                    "call_json",
                    "call_json",
                    &first_error,
                );
                let repair = request.with_user_message(format!(
                    "Your previous reply was not valid JSON ({}). \
                     Respond again with ONLY the JSON, no prose, no code fences.",
                    first_error
                ));
                let reply = self.call(repair).await?;
                parse_json_completion::<T>(&reply.text)
            }
        }
    }

    fn estimate(&self, request: &CompletionRequest) -> Option<u64> {
        request.max_tokens.map(|max| {
            let prompt: u64 = estimate_tokens(&request.system)
                + request
                    .messages
                    .iter()
                    .map(|m| estimate_tokens(&m.content))
                    .sum::<u64>();
            prompt + max as u64
        })
    }

    async fn complete_with_retry(
        &self,
        request: CompletionRequest,
    ) -> Result<crate::llm::CompletionResponse> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) if error.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let delay = match &error {
                        crate::llm::LlmError::RateLimited { retry_after } => *retry_after,
                        _ => BACKOFF_BASE * 2u32.pow(attempt - 1),
                    };
                    debug!(
                        "{}: attempt {} failed ({}), retrying in {:?}",
                        self.name, attempt, error, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    self.logger.error(
                        crate::logging::Component::Agent,
                        "llm_call",
                        "complete_with_retry",
                        &error,
                    );
                    return Err(ScoutError::Llm(error.to_string()));
                }
            }
        }
    }
}

/// Parse a JSON completion, tolerating ```json fenced blocks and surrounding
/// prose-free whitespace. Decode failures surface a preview of the text.
pub fn parse_json_completion<T: DeserializeOwned>(text: &str) -> Result<T> {
    let stripped = strip_code_fences(text);
    serde_json::from_str(stripped).map_err(|e| ScoutError::JsonParse {
        reason: e.to_string(),
        preview: stripped.chars().take(200).collect(),
    })
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence, then the closing fence.
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}
