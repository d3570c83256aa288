//! Second-pass deduplication and quality scoring
//!
//! With a correct Search Memory the dedup pass is a no-op; it guards against
//! pipeline-level mistakes. The scorer is deterministic, uses only signals
//! already in hand, and never issues LLM calls.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::memory::{SearchResult, category_key};

/// Domains appearing more than this often in the original list are penalized.
const ORIGINAL_DOMAIN_OVERREP: usize = 3;

/// Years treated as recency hints when they appear in the snippet.
const RECENT_YEARS: &[&str] = &["2024", "2025", "2026"];

/// A candidate with its quality score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub result: SearchResult,
    pub score: f64,
}

/// Defensive dedup over the full candidate pool: first occurrence wins on
/// canonical URL or content hash.
pub fn dedup_candidates(candidates: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen_canonical: HashSet<String> = HashSet::new();
    let mut seen_hash: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            seen_canonical.insert(c.canonical_url.clone()) && seen_hash.insert(c.content_hash.clone())
        })
        .collect()
}

/// Score every candidate, sort descending, and keep the top `max_links`.
///
/// Ties break on canonical URL so output order is stable across runs.
pub fn score_candidates(
    candidates: Vec<SearchResult>,
    category_terms: &HashMap<String, Vec<String>>,
    original_domains: &HashMap<String, usize>,
    max_links: usize,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|result| {
            let terms = category_terms
                .get(&category_key(&result.category))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let score = quality_score(&result, terms, original_domains);
            ScoredCandidate { result, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.result.canonical_url.cmp(&b.result.canonical_url))
    });
    scored.truncate(max_links);
    scored
}

/// Deterministic scalar quality in [0, 1].
pub fn quality_score(
    result: &SearchResult,
    category_terms: &[String],
    original_domains: &HashMap<String, usize>,
) -> f64 {
    let mut score = 0.0;

    // Informativeness: a real title and a substantive description.
    score += 0.2 * (result.title.len().min(60) as f64 / 60.0);
    score += 0.3 * (result.description.len().min(200) as f64 / 200.0);

    // Category fit: overlap between the snippet and the expanded terms.
    if !category_terms.is_empty() {
        let haystack = format!(
            "{} {}",
            result.title.to_lowercase(),
            result.description.to_lowercase()
        );
        let hits = category_terms
            .iter()
            .filter(|t| haystack.contains(t.to_lowercase().as_str()))
            .count();
        score += 0.3 * (hits as f64 / category_terms.len() as f64);
    }

    // Domain diversity: steer away from domains the list already leans on.
    match original_domains.get(&result.domain) {
        Some(&count) if count > ORIGINAL_DOMAIN_OVERREP => score -= 0.15,
        None => score += 0.1,
        _ => {}
    }

    // Recency hint in the snippet.
    if RECENT_YEARS.iter().any(|y| result.description.contains(y)) {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}
