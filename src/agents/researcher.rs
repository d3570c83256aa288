//! Research agent - executes one web-search query per call
//!
//! Each query is one LLM call with the server-side web_search tool enabled;
//! the model searches, then reports a JSON array of results. Fan-out across
//! queries is the orchestrator's job.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Agent, prompts};
use crate::error::Result;
use crate::llm::{CompletionRequest, ToolSpec};

/// One raw search hit, before dedup and admission.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

pub struct Researcher {
    agent: Agent,
    max_results: u32,
}

impl Researcher {
    pub const NAME: &'static str = "researcher";

    pub fn new(agent: Agent, max_results: u32) -> Self {
        Self { agent, max_results }
    }

    /// Execute one query. Returns the raw hits; the caller tags them with
    /// category, query, and round.
    pub async fn search(&self, query: &str, category: &str) -> Result<Vec<RawHit>> {
        let request = CompletionRequest::new(prompts::researcher_system())
            .with_user_message(prompts::researcher_user(query, category, self.max_results))
            .with_tools(vec![ToolSpec::web_search(self.max_results)])
            .with_max_tokens(2048);
        let mut hits: Vec<RawHit> = self.agent.call_json(request).await?;
        hits.retain(|h| h.url.starts_with("http"));
        hits.truncate(self.max_results as usize);
        Ok(hits)
    }
}
