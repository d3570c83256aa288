//! Validation agent
//!
//! LLM-backed check that a candidate is reachable, substantial, and on-topic,
//! sharpened by the content analysis. Candidates are judged in small batches;
//! a dropped candidate is logged with its reason and never retried.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Agent, ContextAnalysis, prompts};
use crate::error::Result;
use crate::llm::CompletionRequest;
use crate::logging::{Component, Level, RunLogger};
use crate::score::ScoredCandidate;

/// One accepted link, as written to `validated_links.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedLink {
    pub url: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub quality_score: f64,
}

#[derive(Debug, Deserialize)]
struct VerdictSheet {
    #[serde(default)]
    verdicts: Vec<Verdict>,
    #[serde(flatten)]
    _rest: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Verdict {
    url: String,
    accept: bool,
    #[serde(default)]
    reason: String,
}

pub struct Validator {
    agent: Agent,
    logger: Arc<RunLogger>,
    batch_size: usize,
}

impl Validator {
    pub const NAME: &'static str = "validator";

    pub fn new(agent: Agent, logger: Arc<RunLogger>, batch_size: usize) -> Self {
        Self {
            agent,
            logger,
            batch_size: batch_size.max(1),
        }
    }

    /// Validate the ranked candidates, preserving rank order among survivors.
    /// A batch whose call fails drops that batch's candidates, not the run.
    pub async fn validate(
        &self,
        candidates: &[ScoredCandidate],
        context: &ContextAnalysis,
    ) -> Result<Vec<ValidatedLink>> {
        let mut accepted = Vec::new();
        for batch in candidates.chunks(self.batch_size) {
            match self.validate_batch(batch, context).await {
                Ok(mut links) => accepted.append(&mut links),
                Err(error) if error.is_soft_termination() => return Err(error),
                Err(error) => {
                    self.logger
                        .error(Component::Validation, "validation", "validate", &error);
                    self.logger.event(
                        Component::Validation,
                        Level::Warning,
                        "validate",
                        "batch dropped after validation call failed",
                        json!({ "batch_size": batch.len() }),
                    );
                }
            }
        }
        Ok(accepted)
    }

    async fn validate_batch(
        &self,
        batch: &[ScoredCandidate],
        context: &ContextAnalysis,
    ) -> Result<Vec<ValidatedLink>> {
        let rows: Vec<(String, String, String, String)> = batch
            .iter()
            .map(|c| {
                (
                    c.result.url.clone(),
                    c.result.title.clone(),
                    c.result.description.clone(),
                    c.result.category.clone(),
                )
            })
            .collect();

        let request = CompletionRequest::new(prompts::validator_system(
            &context.primary_domain,
            &context.audience,
        ))
        .with_user_message(prompts::validator_user(&rows))
        .with_max_tokens(1024);

        let sheet: VerdictSheet = self.agent.call_json(request).await?;

        let mut accepted = Vec::new();
        for candidate in batch {
            let verdict = sheet.verdicts.iter().find(|v| v.url == candidate.result.url);
            match verdict {
                Some(v) if v.accept => {
                    accepted.push(ValidatedLink {
                        url: candidate.result.url.clone(),
                        title: candidate.result.title.clone(),
                        description: candidate.result.description.clone(),
                        category: candidate.result.category.clone(),
                        quality_score: candidate.score,
                    });
                }
                Some(v) => {
                    self.logger.event(
                        Component::Validation,
                        Level::Info,
                        "validate_batch",
                        "candidate rejected",
                        json!({ "url": candidate.result.url, "reason": v.reason }),
                    );
                }
                // No verdict row for this URL: treat as a drop.
                None => {
                    self.logger.event(
                        Component::Validation,
                        Level::Warning,
                        "validate_batch",
                        "candidate had no verdict",
                        json!({ "url": candidate.result.url }),
                    );
                }
            }
        }
        Ok(accepted)
    }
}
