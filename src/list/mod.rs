//! Awesome-list model and thin glue around it
//!
//! Parsing the README in and rendering the updated list out. The discovery
//! engine only sees the parsed model.

pub mod parser;
pub mod render;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::memory::canonical;

/// One link bullet from the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// One list section (heading) grouping related links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub entries: Vec<LinkEntry>,
}

/// The parsed Awesome list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwesomeList {
    pub title: String,
    pub repo_url: String,
    pub categories: Vec<Category>,
}

impl AwesomeList {
    /// Canonical URLs of every existing entry, for overlap filtering.
    pub fn canonical_urls(&self) -> HashSet<String> {
        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .map(|e| canonical::canonicalize(&e.url))
            .collect()
    }

    /// Domain frequency across the whole list, for the diversity score.
    pub fn domain_counts(&self) -> std::collections::HashMap<String, usize> {
        let mut counts = std::collections::HashMap::new();
        for entry in self.categories.iter().flat_map(|c| c.entries.iter()) {
            let domain = canonical::domain_of(&entry.url);
            if !domain.is_empty() {
                *counts.entry(domain).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Up to `limit` example titles for one category.
    pub fn example_titles(&self, category: &str, limit: usize) -> Vec<String> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(category))
            .map(|c| c.entries.iter().take(limit).map(|e| e.title.clone()).collect())
            .unwrap_or_default()
    }

    pub fn total_entries(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AwesomeList {
        AwesomeList {
            title: "Awesome Rust".to_string(),
            repo_url: "https://github.com/rust-unofficial/awesome-rust".to_string(),
            categories: vec![
                Category {
                    name: "Web Frameworks".to_string(),
                    entries: vec![
                        LinkEntry {
                            title: "Actix".to_string(),
                            url: "https://www.actix.rs/".to_string(),
                            description: "Actor framework".to_string(),
                        },
                        LinkEntry {
                            title: "Rocket".to_string(),
                            url: "https://rocket.rs".to_string(),
                            description: "Web framework".to_string(),
                        },
                    ],
                },
                Category {
                    name: "Parsing".to_string(),
                    entries: vec![LinkEntry {
                        title: "nom".to_string(),
                        url: "https://github.com/rust-bakery/nom".to_string(),
                        description: "Parser combinators".to_string(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_canonical_urls_normalized() {
        let urls = sample().canonical_urls();
        assert!(urls.contains("https://actix.rs"));
        assert!(urls.contains("https://rocket.rs"));
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn test_domain_counts() {
        let counts = sample().domain_counts();
        assert_eq!(counts["actix.rs"], 1);
        assert_eq!(counts["github.com"], 1);
    }

    #[test]
    fn test_example_titles_case_insensitive() {
        let list = sample();
        assert_eq!(list.example_titles("web frameworks", 5), vec!["Actix", "Rocket"]);
        assert_eq!(list.example_titles("Web Frameworks", 1), vec!["Actix"]);
        assert!(list.example_titles("Missing", 5).is_empty());
    }

    #[test]
    fn test_total_entries() {
        assert_eq!(sample().total_entries(), 3);
    }
}
