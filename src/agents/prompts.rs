//! Prompt templates for every agent, versioned in one place
//!
//! Bump `PROMPT_VERSION` when changing any template so run artifacts can be
//! correlated with the prompts that produced them.

use std::collections::HashSet;

use crate::list::AwesomeList;
use crate::memory::CategoryGap;

pub const PROMPT_VERSION: &str = "v1";

pub fn analyzer_system() -> String {
    "You analyze curated 'Awesome list' repositories. \
     Respond with ONLY a JSON object, no prose."
        .to_string()
}

pub fn analyzer_user(list: &AwesomeList) -> String {
    let categories: Vec<String> = list
        .categories
        .iter()
        .map(|c| format!("- {} ({} entries)", c.name, c.entries.len()))
        .collect();
    format!(
        "Repository: {}\nList title: {}\n\nCategories:\n{}\n\n\
         Return JSON with keys:\n\
         \"primary_domain\" (string, the technical topic),\n\
         \"programming_language\" (string or null),\n\
         \"audience\" (string),\n\
         \"category_semantics\" (object mapping each category name to a one-line \
         description of what belongs in it).",
        list.repo_url,
        list.title,
        categories.join("\n"),
    )
}

pub fn expander_system() -> String {
    "You widen search vocabulary for a link category. \
     Respond with ONLY a JSON object, no prose."
        .to_string()
}

pub fn expander_user(category: &str, examples: &[String]) -> String {
    let examples_block = if examples.is_empty() {
        "(no example titles available; expand from the category name alone)".to_string()
    } else {
        examples
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Category: {}\nExample entry titles:\n{}\n\n\
         Return JSON: {{\"terms\": [up to 8 short search terms that widen the \
         lexical net for this category]}}.",
        category, examples_block,
    )
}

pub fn gap_system() -> String {
    "You find coverage gaps in a curated link list. \
     Respond with ONLY a JSON object, no prose."
        .to_string()
}

pub fn gap_user(list: &AwesomeList, expanded: &[(String, Vec<String>)]) -> String {
    let categories: Vec<String> = list
        .categories
        .iter()
        .map(|c| {
            let titles: Vec<&str> = c.entries.iter().map(|e| e.title.as_str()).collect();
            format!("{}: {}", c.name, titles.join(", "))
        })
        .collect();
    let terms: Vec<String> = expanded
        .iter()
        .map(|(category, terms)| format!("{}: {}", category, terms.join(", ")))
        .collect();
    format!(
        "Existing list contents:\n{}\n\nExpanded search terms:\n{}\n\n\
         For each category, name topics that are missing and terms to search for \
         them. Return JSON mapping category name to \
         {{\"missing_topics\": [...], \"suggested_terms\": [...]}}.",
        categories.join("\n"),
        terms.join("\n"),
    )
}

pub fn planner_system() -> String {
    "You plan concrete web-search queries for discovering links. \
     Respond with ONLY a JSON object, no prose."
        .to_string()
}

pub fn planner_user(
    category: &str,
    terms: &[String],
    existing_urls: &[String],
    count: usize,
) -> String {
    format!(
        "Category: {}\nSearch terms: {}\n\n\
         URLs already in the list (do not plan queries that would rediscover \
         them):\n{}\n\n\
         Return JSON: {{\"queries\": [{} concrete web-search query strings, \
         most promising first]}}.",
        category,
        terms.join(", "),
        existing_urls.join("\n"),
        count,
    )
}

pub fn refine_user(
    category: &str,
    gap: &CategoryGap,
    hints: &[String],
    used_queries: &HashSet<String>,
    count: usize,
) -> String {
    let mut used: Vec<&str> = used_queries.iter().map(String::as_str).collect();
    used.sort();
    format!(
        "Category: {} (still needs {} more links)\n\
         Refinement hints:\n{}\n\n\
         Queries already tried (produce NEW ones, none of these):\n{}\n\n\
         Return JSON: {{\"queries\": [{} new web-search query strings]}}.",
        category,
        gap.needed,
        hints.join("\n"),
        used.join("\n"),
        count,
    )
}

pub fn researcher_system() -> String {
    "You search the web and report findings. Use the web_search tool, then \
     respond with ONLY a JSON array, no prose."
        .to_string()
}

pub fn researcher_user(query: &str, category: &str, max_results: u32) -> String {
    format!(
        "Search the web for: {}\n\
         We are collecting links for the category \"{}\".\n\
         Return a JSON array of up to {} results, each \
         {{\"url\": ..., \"title\": ..., \"description\": one sentence}}. \
         Only include real, currently reachable pages.",
        query, category, max_results,
    )
}

pub fn validator_system(primary_domain: &str, audience: &str) -> String {
    format!(
        "You vet candidate links for a curated list about {} aimed at {}. \
         A link passes only if it is reachable, substantial (a real project or \
         resource, not a stub or listicle), and on-topic for its category. \
         Respond with ONLY a JSON object, no prose.",
        primary_domain, audience,
    )
}

pub fn validator_user(candidates: &[(String, String, String, String)]) -> String {
    let block: Vec<String> = candidates
        .iter()
        .map(|(url, title, description, category)| {
            format!(
                "- url: {}\n  title: {}\n  description: {}\n  category: {}",
                url, title, description, category
            )
        })
        .collect();
    format!(
        "Candidates:\n{}\n\n\
         Return JSON: {{\"verdicts\": [{{\"url\": ..., \"accept\": true|false, \
         \"reason\": one sentence}} for every candidate, same order]}}.",
        block.join("\n"),
    )
}
