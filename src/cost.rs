//! Cost tracking and ceiling enforcement
//!
//! Records per-call token usage and USD cost, and exposes a pre-call guard
//! that denies work projected to meet or exceed the ceiling. The guard and
//! the subsequent call are not an atomic pair: concurrent callers can each
//! pass the check and jointly overshoot the ceiling by at most one call each.

use std::collections::HashMap;
use std::sync::Mutex;

use log::warn;
use serde_json::Value;

use crate::error::{Result, ScoutError};

/// Per-million-token USD rates (input, output), keyed by model identifier.
const PRICING: &[(&str, f64, f64)] = &[
    ("claude-opus-4-5-20250514", 15.0, 75.0),
    ("claude-sonnet-4-20250514", 3.0, 15.0),
    ("claude-3-7-sonnet-20250219", 3.0, 15.0),
    ("claude-3-5-haiku-20241022", 0.80, 4.0),
    ("claude-3-haiku-20240307", 0.25, 1.25),
];

/// Default token estimate when the caller does not supply one. Errs high.
pub const DEFAULT_ESTIMATE_TOKENS: u64 = 2_000;

/// One recorded LLM call.
#[derive(Debug, Clone)]
pub struct UsageEntry {
    pub model: String,
    pub agent: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub metadata: Value,
}

#[derive(Debug, Default, Clone)]
struct Totals {
    input_tokens: u64,
    output_tokens: u64,
    cost_usd: f64,
}

#[derive(Debug, Default)]
struct CostState {
    total_usd: f64,
    by_model: HashMap<String, Totals>,
    by_agent: HashMap<String, Totals>,
    entries: Vec<UsageEntry>,
}

/// Process-lifetime cost tracker shared by every agent.
#[derive(Debug)]
pub struct CostTracker {
    ceiling_usd: f64,
    state: Mutex<CostState>,
}

impl CostTracker {
    pub fn new(ceiling_usd: f64) -> Self {
        Self {
            ceiling_usd,
            state: Mutex::new(CostState::default()),
        }
    }

    /// Price a call in USD. Unknown models price at zero and log a warning;
    /// they do not stop the run.
    pub fn price(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        match PRICING.iter().find(|(id, _, _)| *id == model) {
            Some((_, input_rate, output_rate)) => {
                (input_tokens as f64 / 1_000_000.0) * input_rate
                    + (output_tokens as f64 / 1_000_000.0) * output_rate
            }
            None => {
                warn!("unknown model '{}', pricing at $0", model);
                0.0
            }
        }
    }

    /// Pre-call guard. Fails when `current_total + price(model, estimate)`
    /// meets or exceeds the ceiling. Equality denies, so a zero ceiling
    /// rejects the very first call.
    pub fn check_ceiling(&self, model: &str, estimated_tokens: Option<u64>) -> Result<()> {
        let estimate = estimated_tokens.unwrap_or(DEFAULT_ESTIMATE_TOKENS);
        // The estimate is projected at both input and output rates.
        let projected_call = Self::price(model, estimate, estimate);
        let current = self.state.lock().unwrap().total_usd;
        let projected = current + projected_call;
        if projected >= self.ceiling_usd {
            return Err(ScoutError::CeilingExceeded {
                projected,
                ceiling: self.ceiling_usd,
            });
        }
        Ok(())
    }

    /// Record one call's usage and return its incremental cost.
    pub fn track_usage(
        &self,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
        agent: &str,
        metadata: Value,
    ) -> f64 {
        let cost = Self::price(model, input_tokens, output_tokens);
        let mut state = self.state.lock().unwrap();
        state.total_usd += cost;

        let by_model = state.by_model.entry(model.to_string()).or_default();
        by_model.input_tokens += input_tokens;
        by_model.output_tokens += output_tokens;
        by_model.cost_usd += cost;

        let by_agent = state.by_agent.entry(agent.to_string()).or_default();
        by_agent.input_tokens += input_tokens;
        by_agent.output_tokens += output_tokens;
        by_agent.cost_usd += cost;

        state.entries.push(UsageEntry {
            model: model.to_string(),
            agent: agent.to_string(),
            input_tokens,
            output_tokens,
            cost_usd: cost,
            metadata,
        });
        cost
    }

    /// Total spend so far in USD.
    pub fn total(&self) -> f64 {
        self.state.lock().unwrap().total_usd
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling_usd
    }

    /// USD spent by one agent.
    pub fn by_agent(&self, name: &str) -> f64 {
        self.state
            .lock()
            .unwrap()
            .by_agent
            .get(name)
            .map(|t| t.cost_usd)
            .unwrap_or(0.0)
    }

    /// USD spent on one model.
    pub fn by_model(&self, name: &str) -> f64 {
        self.state
            .lock()
            .unwrap()
            .by_model
            .get(name)
            .map(|t| t.cost_usd)
            .unwrap_or(0.0)
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// Serializable breakdown for the research report.
    pub fn summary(&self) -> Value {
        let state = self.state.lock().unwrap();
        let by_model: HashMap<&str, Value> = state
            .by_model
            .iter()
            .map(|(model, t)| {
                (
                    model.as_str(),
                    serde_json::json!({
                        "input_tokens": t.input_tokens,
                        "output_tokens": t.output_tokens,
                        "cost_usd": t.cost_usd,
                    }),
                )
            })
            .collect();
        let by_agent: HashMap<&str, Value> = state
            .by_agent
            .iter()
            .map(|(agent, t)| {
                (
                    agent.as_str(),
                    serde_json::json!({
                        "input_tokens": t.input_tokens,
                        "output_tokens": t.output_tokens,
                        "cost_usd": t.cost_usd,
                    }),
                )
            })
            .collect();
        serde_json::json!({
            "total_usd": state.total_usd,
            "ceiling_usd": self.ceiling_usd,
            "calls": state.entries.len(),
            "by_model": by_model,
            "by_agent": by_agent,
        })
    }
}
