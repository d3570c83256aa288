//! Content analysis agent
//!
//! One LLM call that characterizes the list: its technical domain, language,
//! audience, and what each existing category means. Every downstream agent's
//! system prompt is sharpened by this context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Agent, prompts};
use crate::error::Result;
use crate::list::AwesomeList;
use crate::llm::CompletionRequest;

/// What the list is about. Unknown extra fields from the model are kept in
/// `rest` rather than dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAnalysis {
    pub primary_domain: String,
    #[serde(default)]
    pub programming_language: Option<String>,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub category_semantics: HashMap<String, String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

pub struct ContentAnalyzer {
    agent: Agent,
}

impl ContentAnalyzer {
    pub const NAME: &'static str = "content_analyzer";

    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub async fn analyze(&self, list: &AwesomeList) -> Result<ContextAnalysis> {
        let request = CompletionRequest::new(prompts::analyzer_system())
            .with_user_message(prompts::analyzer_user(list))
            .with_max_tokens(1024);
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

    fn analyzer(responses: Vec<CompletionResponse>) -> (ContentAnalyzer, TempDir) {
        let dir = TempDir::new().unwrap();
        let agent = Agent::new(
            ContentAnalyzer::NAME,
            "claude-sonnet-4-20250514",
            Arc::new(MockLlmClient::new(responses)),
            Arc::new(CostTracker::new(10.0)),
            Arc::new(RunLogger::create(dir.path()).unwrap()),
        );
        (ContentAnalyzer::new(agent), dir)
    }

    fn list() -> AwesomeList {
        AwesomeList {
            title: "Awesome Go".to_string(),
            repo_url: "https://github.com/avelino/awesome-go".to_string(),
            categories: vec![Category {
                name: "Web Frameworks".to_string(),
                entries: vec![LinkEntry {
                    title: "Gin".to_string(),
                    url: "https://github.com/gin-gonic/gin".to_string(),
                    description: "HTTP framework".to_string(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_context() {
        let (analyzer, _dir) = analyzer(vec![CompletionResponse::text(
            r#"{"primary_domain": "Go ecosystem", "programming_language": "Go",
                "audience": "Go developers",
                "category_semantics": {"Web Frameworks": "HTTP servers and routers"},
                "confidence": 0.9}"#,
        )]);
        let context = analyzer.analyze(&list()).await.unwrap();
        assert_eq!(context.primary_domain, "Go ecosystem");
        assert_eq!(context.programming_language.as_deref(), Some("Go"));
        assert_eq!(
            context.category_semantics["Web Frameworks"],
            "HTTP servers and routers"
        );
        // Unknown fields survive in rest.
        assert_eq!(context.rest["confidence"], 0.9);
    }

    #[tokio::test]
    async fn test_analyze_tolerates_fenced_json() {
        let (analyzer, _dir) = analyzer(vec![CompletionResponse::text(
            "```json\n{\"primary_domain\": \"Go\"}\n```",
        )]);
        let context = analyzer.analyze(&list()).await.unwrap();
        assert_eq!(context.primary_domain, "Go");
        assert!(context.audience.is_empty());
    }
}
