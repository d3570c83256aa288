//! Query planning agent
//!
//! Turns expanded and gap terms into concrete web-search queries, and - on
//! refinement rounds - produces new queries steered away from what has
//! already been tried and from overrepresented domains. With a seed, query
//! selection from the model's list is reproducible.

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Agent, prompts};
use crate::error::Result;
use crate::llm::CompletionRequest;
use crate::memory::CategoryGap;

#[derive(Debug, Deserialize)]
struct PlannedQueries {
    #[serde(default)]
    queries: Vec<String>,
    #[serde(flatten)]
    _rest: Map<String, Value>,
}

pub struct QueryPlanner {
    agent: Agent,
    seed: Option<u64>,
}

impl QueryPlanner {
    pub const NAME: &'static str = "query_planner";

    pub fn new(agent: Agent, seed: Option<u64>) -> Self {
        Self { agent, seed }
    }

    /// Plan the initial ordered query list for a category.
    pub async fn plan(
        &self,
        category: &str,
        terms: &[String],
        existing_urls: &[String],
        count: usize,
    ) -> Result<Vec<String>> {
        let request = CompletionRequest::new(prompts::planner_system())
            .with_user_message(prompts::planner_user(category, terms, existing_urls, count))
            .with_max_tokens(512);
        let planned: PlannedQueries = self.agent.call_json(request).await?;
        Ok(self.select(category, planned.queries, count))
    }

    /// Produce new queries for a refinement round, excluding anything
    /// already tried.
    pub async fn refine(
        &self,
        category: &str,
        gap: &CategoryGap,
        hints: &[String],
        used_queries: &HashSet<String>,
        count: usize,
    ) -> Result<Vec<String>> {
        let request = CompletionRequest::new(prompts::planner_system())
            .with_user_message(prompts::refine_user(category, gap, hints, used_queries, count))
            .with_max_tokens(512);
        let planned: PlannedQueries = self.agent.call_json(request).await?;
        let fresh: Vec<String> = planned
            .queries
            .into_iter()
            .filter(|q| !used_queries.contains(q))
            .collect();
        Ok(self.select(category, fresh, count))
    }

    /// Normalize, dedup, optionally shuffle with the per-category seed, and
    /// truncate to `count`. Without a seed the model's order is kept.
    fn select(&self, category: &str, queries: Vec<String>, count: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut cleaned: Vec<String> = queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty() && seen.insert(q.to_lowercase()))
            .collect();

        if let Some(seed) = self.seed {
            let mut hasher = DefaultHasher::new();
            category.to_lowercase().hash(&mut hasher);
            let mut rng = StdRng::seed_from_u64(seed ^ hasher.finish());
            cleaned.shuffle(&mut rng);
        }

        cleaned.truncate(count);
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTracker;
    use crate::llm::{CompletionResponse, MockLlmClient};
    use crate::logging::RunLogger;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn planner(
        responses: Vec<CompletionResponse>,
        seed: Option<u64>,
    ) -> (QueryPlanner, Arc<MockLlmClient>, TempDir) {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockLlmClient::new(responses));
        let agent = Agent::new(
            QueryPlanner::NAME,
            "claude-sonnet-4-20250514",
            client.clone(),
            Arc::new(CostTracker::new(10.0)),
            Arc::new(RunLogger::create(dir.path()).unwrap()),
        );
        (QueryPlanner::new(agent, seed), client, dir)
    }

    const QUERIES: &str =
        r#"{"queries": ["rust web framework 2025", "actix alternatives", "rust async http server", "minimal rust router"]}"#;

    #[tokio::test]
    async fn test_plan_keeps_model_order_without_seed() {
        let (planner, _, _dir) = planner(vec![CompletionResponse::text(QUERIES)], None);
        let queries = planner.plan("Web Frameworks", &[], &[], 3).await.unwrap();
        assert_eq!(
            queries,
            vec![
                "rust web framework 2025",
                "actix alternatives",
                "rust async http server"
            ]
        );
    }

    #[tokio::test]
    async fn test_plan_seeded_is_reproducible() {
        let (p1, _, _d1) = planner(vec![CompletionResponse::text(QUERIES)], Some(42));
        let (p2, _, _d2) = planner(vec![CompletionResponse::text(QUERIES)], Some(42));
        let q1 = p1.plan("Web Frameworks", &[], &[], 3).await.unwrap();
        let q2 = p2.plan("Web Frameworks", &[], &[], 3).await.unwrap();
        assert_eq!(q1, q2);
        assert_eq!(q1.len(), 3);
    }

    #[tokio::test]
    async fn test_plan_different_seeds_may_differ_but_stay_valid() {
        let (p1, _, _d1) = planner(vec![CompletionResponse::text(QUERIES)], Some(1));
        let queries = p1.plan("Web Frameworks", &[], &[], 3).await.unwrap();
        assert_eq!(queries.len(), 3);
        for q in &queries {
            assert!(QUERIES.contains(q.as_str()));
        }
    }

    #[tokio::test]
    async fn test_plan_dedups_case_insensitively() {
        let (planner, _, _dir) = planner(
            vec![CompletionResponse::text(
                r#"{"queries": ["Rust Parser", "rust parser", "pest grammar"]}"#,
            )],
            None,
        );
        let queries = planner.plan("Parsing", &[], &[], 5).await.unwrap();
        assert_eq!(queries, vec!["Rust Parser", "pest grammar"]);
    }

    #[tokio::test]
    async fn test_refine_filters_used_queries() {
        let (planner, _, _dir) = planner(
            vec![CompletionResponse::text(
                r#"{"queries": ["already tried", "brand new query", "another new one"]}"#,
            )],
            None,
        );
        let mut used = HashSet::new();
        used.insert("already tried".to_string());
        let gap = CategoryGap {
            category: "Parsing".to_string(),
            current_count: 2,
            needed: 3,
            covered_domains: vec![],
            covered_topics: vec![],
            successful_queries: vec![],
        };
        let queries = planner
            .refine("Parsing", &gap, &[], &used, 3)
            .await
            .unwrap();
        assert_eq!(queries, vec!["brand new query", "another new one"]);
    }
}
