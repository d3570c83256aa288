//! Progressive search orchestrator
//!
//! The per-category control loop: issue the planned queries, admit results
//! through Search Memory, observe yield, and refine. Rounds stop when the
//! category's gap closes, `max_rounds` is reached, or yield stalls below
//! `min_new_per_round`. Queries within a round run concurrently; duplicate
//! races resolve through Search Memory's atomic add - first committer wins.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde_json::json;

use crate::agents::{QueryPlanner, Researcher};
use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::logging::{Component, Level, RunLogger};
use crate::memory::{SearchMemory, SearchResult, canonicalize};

/// Bounds for one category's progressive search.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub max_rounds: u32,
    pub queries_per_round: usize,
    pub min_new_per_round: usize,
    pub target_per_category: usize,
}

/// What one category's search accomplished.
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: String,
    pub accepted: usize,
    pub rounds_run: u32,
    pub queries_issued: usize,
}

pub struct SearchOrchestrator {
    planner: QueryPlanner,
    researcher: Researcher,
    memory: Arc<Mutex<SearchMemory>>,
    logger: Arc<RunLogger>,
    cancel: CancelFlag,
    /// Canonical URLs already present in the original list; hits matching
    /// these are filtered before they ever reach Search Memory.
    original_urls: HashSet<String>,
    limits: SearchLimits,
}

impl SearchOrchestrator {
    pub fn new(
        planner: QueryPlanner,
        researcher: Researcher,
        memory: Arc<Mutex<SearchMemory>>,
        logger: Arc<RunLogger>,
        cancel: CancelFlag,
        original_urls: HashSet<String>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            planner,
            researcher,
            memory,
            logger,
            cancel,
            original_urls,
            limits,
        }
    }

    /// Run the progressive loop for one category, starting from its planned
    /// queries. A category that yields nothing is reported, not an error;
    /// only soft terminations (ceiling, wall-time) propagate.
    pub async fn run_category(
        &self,
        category: &str,
        planned_queries: &[String],
    ) -> Result<CategoryOutcome> {
        let mut used_queries: HashSet<String> = HashSet::new();
        let mut total_accepted = 0usize;
        let mut queries_issued = 0usize;
        let mut rounds_run = 0u32;

        for round in 1..=self.limits.max_rounds {
            if self.cancel.is_cancelled() {
                break;
            }
            let gap = self
                .memory
                .lock()
                .unwrap()
                .gaps(category, self.limits.target_per_category);
            if gap.needed == 0 {
                break;
            }

            let queries = if round == 1 {
                planned_queries
                    .iter()
                    .take(self.limits.queries_per_round)
                    .cloned()
                    .collect::<Vec<_>>()
            } else {
                let hints = self.memory.lock().unwrap().refinement_hints(category);
                match self
                    .planner
                    .refine(category, &gap, &hints, &used_queries, self.limits.queries_per_round)
                    .await
                {
                    Ok(queries) => queries,
                    Err(error) if error.is_soft_termination() => return Err(error),
                    Err(error) => {
                        self.logger.error(
                            Component::Search,
                            "progressive_search",
                            "run_category",
                            &error,
                        );
                        break;
                    }
                }
            };
            if queries.is_empty() {
                break;
            }

            rounds_run = round;
            queries_issued += queries.len();
            used_queries.extend(queries.iter().cloned());

            let accepted_this_round = self.run_round(category, round, &queries).await?;
            total_accepted += accepted_this_round;

            self.logger.event(
                Component::Search,
                Level::Info,
                "run_category",
                "round complete",
                json!({
                    "category": category,
                    "round": round,
                    "queries": queries,
                    "accepted": accepted_this_round,
                }),
            );

            // Diminishing returns: refinement that stops paying stops running.
            if round > 1 && accepted_this_round < self.limits.min_new_per_round {
                break;
            }
        }

        Ok(CategoryOutcome {
            category: category.to_string(),
            accepted: total_accepted,
            rounds_run,
            queries_issued,
        })
    }

    /// Execute one round's queries concurrently and admit the survivors.
    /// Returns the number of results Search Memory accepted.
    async fn run_round(&self, category: &str, round: u32, queries: &[String]) -> Result<usize> {
        let searches = queries.iter().map(|query| self.researcher.search(query, category));
        let outcomes = join_all(searches).await;

        let mut accepted = 0usize;
        for (query, outcome) in queries.iter().zip(outcomes) {
            let hits = match outcome {
                Ok(hits) => hits,
                Err(error) if error.is_soft_termination() => return Err(error),
                // One failed query never aborts its category.
                Err(error) => {
                    self.logger.error(
                        Component::Search,
                        "progressive_search",
                        "run_round",
                        &error,
                    );
                    continue;
                }
            };

            for hit in hits {
                if self.original_urls.contains(&canonicalize(&hit.url)) {
                    continue;
                }
                // Pre-filter before constructing anything; add() re-checks
                // atomically, so a losing race just returns false.
                let mut memory = self.memory.lock().unwrap();
                if memory.is_duplicate(&hit.url, &hit.title, &hit.description) {
                    continue;
                }
                let result = SearchResult::new(
                    hit.url,
                    hit.title,
                    hit.description,
                    category,
                    query.clone(),
                );
                if memory.add(result) {
                    accepted += 1;
                }
            }
        }

        self.logger.event(
            Component::Memory,
            Level::Debug,
            "run_round",
            "round admissions",
            json!({ "category": category, "round": round, "accepted": accepted }),
        );
        Ok(accepted)
    }
}
