//! Gap analysis agent
//!
//! One LLM call over the whole list plus the expanded terms, producing
//! per-category missing topics and suggested search terms.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Agent, prompts};
use crate::error::Result;
use crate::list::AwesomeList;
use crate::llm::CompletionRequest;

/// What one category is missing, per the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryGapAnalysis {
    #[serde(default)]
    pub missing_topics: Vec<String>,
    #[serde(default)]
    pub suggested_terms: Vec<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

pub struct GapAnalyzer {
    agent: Agent,
}

impl GapAnalyzer {
    pub const NAME: &'static str = "gap_analyzer";

    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub async fn analyze(
        &self,
        list: &AwesomeList,
        expanded: &[(String, Vec<String>)],
    ) -> Result<HashMap<String, CategoryGapAnalysis>> {
        let request = CompletionRequest::new(prompts::gap_system())
            .with_user_message(prompts::gap_user(list, expanded))
            .with_max_tokens(2048);
        self.agent.call_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTracker;
    use crate::list::{Category, LinkEntry};
    use crate::llm::{CompletionResponse, MockLlmClient};
    use crate::logging::RunLogger;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn list() -> AwesomeList {
        AwesomeList {
            title: "Awesome Rust".to_string(),
            repo_url: "https://github.com/rust-unofficial/awesome-rust".to_string(),
            categories: vec![Category {
                name: "Parsing".to_string(),
                entries: vec![LinkEntry {
                    title: "nom".to_string(),
                    url: "https://github.com/rust-bakery/nom".to_string(),
                    description: "Parser combinators".to_string(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_per_category_gaps() {
        let dir = TempDir::new().unwrap();
        let agent = Agent::new(
            GapAnalyzer::NAME,
            "claude-sonnet-4-20250514",
            Arc::new(MockLlmClient::new(vec![CompletionResponse::text(
                r#"{"Parsing": {"missing_topics": ["incremental parsing"],
                     "suggested_terms": ["rust incremental parser"]}}"#,
            )])),
            Arc::new(CostTracker::new(10.0)),
            Arc::new(RunLogger::create(dir.path()).unwrap()),
        );
        let analyzer = GapAnalyzer::new(agent);

        let expanded = vec![("Parsing".to_string(), vec!["parser".to_string()])];
        let gaps = analyzer.analyze(&list(), &expanded).await.unwrap();
        assert_eq!(gaps["Parsing"].missing_topics, vec!["incremental parsing"]);
        assert_eq!(gaps["Parsing"].suggested_terms, vec!["rust incremental parser"]);
    }
}
