//! Term expansion agent
//!
//! Widens a category's lexical net: one LLM call mapping the category name
//! and a few example titles to candidate search terms.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Agent, prompts};
use crate::error::Result;
use crate::llm::CompletionRequest;

#[derive(Debug, Deserialize)]
struct ExpandedTerms {
    #[serde(default)]
    terms: Vec<String>,
    #[serde(flatten)]
    _rest: Map<String, Value>,
}

pub struct TermExpander {
    agent: Agent,
}

impl TermExpander {
    pub const NAME: &'static str = "term_expander";

    /// Examples beyond this many add tokens without adding signal.
    pub const MAX_EXAMPLES: usize = 5;

    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    /// Expand one category. An empty example set is fine; the expansion is
    /// then driven by the category name alone.
    pub async fn expand(&self, category: &str, example_titles: &[String]) -> Result<Vec<String>> {
        let examples = &example_titles[..example_titles.len().min(Self::MAX_EXAMPLES)];
        let request = CompletionRequest::new(prompts::expander_system())
            .with_user_message(prompts::expander_user(category, examples))
            .with_max_tokens(512);
        let expanded: ExpandedTerms = self.agent.call_json(request).await?;
        let mut seen = HashSet::new();
        let terms = expanded
            .terms
            .into_iter()
            .filter(|t| !t.trim().is_empty() && seen.insert(t.to_lowercase()))
            .collect();
        Ok(terms)
    }
}
