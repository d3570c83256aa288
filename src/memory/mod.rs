//! Search memory - the append-only index of discovered results
//!
//! Prevents duplicates across the whole run and feeds refinement: every
//! accepted result updates URL, canonical-URL, content-hash, domain,
//! category, and source-query indexes plus the learned statistics that
//! drive gap analysis and query refinement.

pub mod canonical;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;

pub use canonical::{canonicalize, content_hash, domain_of};

/// Domains with more than this many accepted results are overrepresented;
/// refinement steers queries away from them.
const DOMAIN_OVERREP_THRESHOLD: usize = 3;

/// How many salient title terms count as a category's covered topics.
const COVERED_TOPIC_LIMIT: usize = 10;

/// One discovered candidate link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub source_query: String,
    pub found_at: DateTime<Utc>,
    pub domain: String,
    pub canonical_url: String,
    pub content_hash: String,
}

impl SearchResult {
    /// Build a result, deriving domain, canonical URL, and content hash.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        source_query: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let description = description.into();
        Self {
            domain: canonical::domain_of(&url),
            canonical_url: canonical::canonicalize(&url),
            content_hash: canonical::content_hash(&title, &description),
            url,
            title,
            description,
            category: category.into(),
            source_query: source_query.into(),
            found_at: Utc::now(),
        }
    }
}

/// Per-category shortfall and coverage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGap {
    pub category: String,
    pub current_count: usize,
    pub needed: usize,
    pub covered_domains: Vec<String>,
    pub covered_topics: Vec<String>,
    pub successful_queries: Vec<String>,
}

/// Process-lifetime, in-memory store of everything discovered this run.
///
/// All mutation goes through `add`, which either rejects a duplicate or
/// updates every index in one `&mut self` call - callers never observe a
/// partially indexed entry.
#[derive(Debug)]
pub struct SearchMemory {
    results: Vec<SearchResult>,
    by_url: HashMap<String, usize>,
    by_canonical: HashMap<String, usize>,
    by_hash: HashMap<String, usize>,
    by_domain: HashMap<String, Vec<usize>>,
    by_category: HashMap<String, Vec<usize>>,
    by_query: HashMap<String, Vec<usize>>,
    query_success: HashMap<String, usize>,
    domain_categories: HashMap<String, BTreeSet<String>>,
    category_topics: HashMap<String, BTreeSet<String>>,
    /// Tunable for a future near-match predicate. The acceptance predicate
    /// stays exact content-hash equality and does not consult this.
    pub similarity_threshold: f64,
}

impl Default for SearchMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchMemory {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            by_url: HashMap::new(),
            by_canonical: HashMap::new(),
            by_hash: HashMap::new(),
            by_domain: HashMap::new(),
            by_category: HashMap::new(),
            by_query: HashMap::new(),
            query_success: HashMap::new(),
            domain_categories: HashMap::new(),
            category_topics: HashMap::new(),
            similarity_threshold: 0.85,
        }
    }

    /// Insert a result unless it collides on URL, canonical URL, or content
    /// hash. Returns `true` iff the result was accepted; on acceptance all
    /// indexes and learned statistics update together.
    pub fn add(&mut self, result: SearchResult) -> bool {
        if let Some(dimension) = self.duplicate_dimension(&result.url, &result.canonical_url, &result.content_hash) {
            debug!(
                "memory rejected {} (duplicate {})",
                result.url, dimension
            );
            return false;
        }

        let index = self.results.len();
        self.by_url.insert(result.url.clone(), index);
        self.by_canonical.insert(result.canonical_url.clone(), index);
        self.by_hash.insert(result.content_hash.clone(), index);
        self.by_domain
            .entry(result.domain.clone())
            .or_default()
            .push(index);
        self.by_category
            .entry(category_key(&result.category))
            .or_default()
            .push(index);
        self.by_query
            .entry(result.source_query.clone())
            .or_default()
            .push(index);

        *self.query_success.entry(result.source_query.clone()).or_insert(0) += 1;
        self.domain_categories
            .entry(result.domain.clone())
            .or_default()
            .insert(result.category.clone());
        let topics = self
            .category_topics
            .entry(category_key(&result.category))
            .or_default();
        for term in salient_terms(std::slice::from_ref(&result.title), COVERED_TOPIC_LIMIT) {
            topics.insert(term);
        }

        self.results.push(result);
        true
    }

    /// The predicate `add` uses, without committing anything.
    pub fn is_duplicate(&self, url: &str, title: &str, description: &str) -> bool {
        self.duplicate_dimension(
            url,
            &canonical::canonicalize(url),
            &canonical::content_hash(title, description),
        )
        .is_some()
    }

    fn duplicate_dimension(&self, url: &str, canonical_url: &str, hash: &str) -> Option<&'static str> {
        if self.by_url.contains_key(url) {
            Some("url")
        } else if self.by_canonical.contains_key(canonical_url) {
            Some("canonical_url")
        } else if self.by_hash.contains_key(hash) {
            Some("content_hash")
        } else {
            None
        }
    }

    /// O(|category|) view of a category's shortfall against `target`.
    pub fn gaps(&self, category: &str, target: usize) -> CategoryGap {
        let key = category_key(category);
        let indexes = self.by_category.get(&key).map(Vec::as_slice).unwrap_or(&[]);
        let current_count = indexes.len();

        let mut covered_domains: BTreeSet<String> = BTreeSet::new();
        let mut successful_queries: BTreeSet<String> = BTreeSet::new();
        for &i in indexes {
            covered_domains.insert(self.results[i].domain.clone());
            successful_queries.insert(self.results[i].source_query.clone());
        }

        CategoryGap {
            category: category.to_string(),
            current_count,
            needed: target.saturating_sub(current_count),
            covered_domains: covered_domains.into_iter().collect(),
            covered_topics: self
                .category_topics
                .get(&key)
                .map(|t| t.iter().take(COVERED_TOPIC_LIMIT).cloned().collect())
                .unwrap_or_default(),
            successful_queries: successful_queries.into_iter().collect(),
        }
    }

    /// Hints for query refinement: overrepresented domains to steer away
    /// from, and topics the category already covers.
    pub fn refinement_hints(&self, category: &str) -> Vec<String> {
        let key = category_key(category);
        let mut hints = Vec::new();

        let category_indexes: BTreeSet<usize> = self
            .by_category
            .get(&key)
            .map(|v| v.iter().copied().collect())
            .unwrap_or_default();

        let mut overrepresented: Vec<(&str, usize)> = self
            .by_domain
            .iter()
            .map(|(domain, indexes)| {
                let in_category = indexes.iter().filter(|i| category_indexes.contains(i)).count();
                (domain.as_str(), in_category)
            })
            .filter(|(domain, count)| !domain.is_empty() && *count > DOMAIN_OVERREP_THRESHOLD)
            .collect();
        overrepresented.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        for (domain, count) in overrepresented {
            hints.push(format!("avoid {} ({} results already)", domain, count));
        }

        if let Some(topics) = self.category_topics.get(&key)
            && !topics.is_empty()
        {
            let listed: Vec<&str> = topics.iter().take(COVERED_TOPIC_LIMIT).map(String::as_str).collect();
            hints.push(format!("already covered: {}", listed.join(", ")));
        }

        hints
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Accepted results for one category, in admission order.
    pub fn results_for(&self, category: &str) -> Vec<&SearchResult> {
        self.by_category
            .get(&category_key(category))
            .map(|indexes| indexes.iter().map(|&i| &self.results[i]).collect())
            .unwrap_or_default()
    }

    /// Reporting view. Sets render as sorted arrays.
    pub fn summary(&self) -> Value {
        let mut per_category: HashMap<&str, usize> = HashMap::new();
        for result in &self.results {
            *per_category.entry(result.category.as_str()).or_insert(0) += 1;
        }
        json!({
            "total_results": self.results.len(),
            "unique_domains": self.by_domain.len(),
            "categories": per_category,
            "queries_with_results": self.query_success.len(),
        })
    }

    /// Write the full serializable view to `path`.
    pub fn export(&self, path: &Path) -> Result<()> {
        let patterns = json!({
            "query_success": self.query_success,
            "domain_categories": self.domain_categories,
            "category_topics": self.category_topics,
        });
        let view = json!({
            "summary": self.summary(),
            "results": self.results,
            "patterns": patterns,
        });
        fs::write(path, serde_json::to_string_pretty(&view)?)?;
        Ok(())
    }
}

/// Categories match case-insensitively; the original casing is preserved on
/// the stored results.
pub fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "for", "from", "has", "have", "in", "is", "it", "its", "of", "on",
    "or", "that", "the", "this", "to", "with", "your",
];

/// Top-N salient lowercase terms across a set of titles.
pub fn salient_terms(titles: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for title in titles {
        for word in title
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
        {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    let mut terms: Vec<(String, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    terms.into_iter().take(limit).map(|(term, _)| term).collect()
}
