//! README fetching and Awesome-list parsing
//!
//! Resolves a GitHub repository URL to its raw README, then parses `##`/`###`
//! headings into categories and `- [title](url) - description` bullets into
//! entries. Index/meta sections (Contents, Contributing, License) are not
//! categories.

use log::info;

use super::{AwesomeList, Category, LinkEntry};
use crate::error::{Result, ScoutError};

/// Section headings that never hold list content.
const META_SECTIONS: &[&str] = &[
    "contents",
    "table of contents",
    "contributing",
    "contribution",
    "license",
    "licence",
    "resources",
    "credits",
    "acknowledgements",
];

/// Resolve `https://github.com/{owner}/{repo}` to its raw README URL.
pub fn raw_readme_url(repo_url: &str) -> Result<String> {
    let trimmed = repo_url.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
        .ok_or_else(|| {
            ScoutError::Parse(format!("not a GitHub repository URL: {}", repo_url))
        })?;
    let mut parts = rest.splitn(2, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default();
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(ScoutError::Parse(format!(
            "expected github.com/<owner>/<repo>, got: {}",
            repo_url
        )));
    }
    Ok(format!(
        "https://raw.githubusercontent.com/{}/{}/HEAD/README.md",
        owner, repo
    ))
}

/// Fetch the repository's README markdown.
pub async fn fetch_readme(repo_url: &str) -> Result<String> {
    let raw_url = raw_readme_url(repo_url)?;
    info!("fetching {}", raw_url);
    let response = reqwest::get(&raw_url)
        .await
        .map_err(|e| ScoutError::Parse(format!("README fetch failed: {}", e)))?;
    if !response.status().is_success() {
        return Err(ScoutError::Parse(format!(
            "README fetch returned {} for {}",
            response.status(),
            raw_url
        )));
    }
    response
        .text()
        .await
        .map_err(|e| ScoutError::Parse(format!("README body read failed: {}", e)))
}

/// Parse README markdown into the list model.
///
/// A list with zero content categories is a fatal parse error.
pub fn parse_list(markdown: &str, repo_url: &str) -> Result<AwesomeList> {
    let mut title = String::new();
    let mut categories: Vec<Category> = Vec::new();
    let mut current: Option<Category> = None;

    for line in markdown.lines() {
        let line = line.trim_end();
        if let Some(heading) = line.strip_prefix("# ") {
            if title.is_empty() {
                title = clean_heading(heading);
            }
        } else if let Some(heading) = line.strip_prefix("## ").or_else(|| line.strip_prefix("### ")) {
            if let Some(category) = current.take() {
                categories.push(category);
            }
            let name = clean_heading(heading);
            if !META_SECTIONS.contains(&name.to_lowercase().as_str()) {
                current = Some(Category {
                    name,
                    entries: Vec::new(),
                });
            }
        } else if let Some(entry) = parse_bullet(line)
            && let Some(category) = current.as_mut()
        {
            category.entries.push(entry);
        }
    }
    if let Some(category) = current.take() {
        categories.push(category);
    }
    categories.retain(|c| !c.entries.is_empty());

    if categories.is_empty() {
        return Err(ScoutError::Parse(
            "no categories with entries found in README".to_string(),
        ));
    }

    Ok(AwesomeList {
        title: if title.is_empty() {
            "Awesome List".to_string()
        } else {
            title
        },
        repo_url: repo_url.to_string(),
        categories,
    })
}

fn clean_heading(heading: &str) -> String {
    heading.trim().trim_matches('*').trim().to_string()
}

/// Parse `- [Title](url) - description` (or `*` bullets, en/em dash separators).
fn parse_bullet(line: &str) -> Option<LinkEntry> {
    let body = line
        .trim_start()
        .strip_prefix("- ")
        .or_else(|| line.trim_start().strip_prefix("* "))?;
    let body = body.trim_start();
    let title_start = body.strip_prefix('[')?;
    let title_end = title_start.find("](")?;
    let title = &title_start[..title_end];
    let after_title = &title_start[title_end + 2..];
    let url_end = after_title.find(')')?;
    let url = &after_title[..url_end];
    if !url.starts_with("http") {
        return None;
    }
    let description = after_title[url_end + 1..]
        .trim_start()
        .trim_start_matches(['-', '–', '—', ':'])
        .trim()
        .to_string();
    Some(LinkEntry {
        title: title.to_string(),
        url: url.to_string(),
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = r#"# Awesome Go

A curated list of awesome Go frameworks.

## Contents

- [Web Frameworks](#web-frameworks)

## Web Frameworks

- [Gin](https://github.com/gin-gonic/gin) - HTTP web framework.
- [Echo](https://echo.labstack.com/) – High performance minimalist framework.

### Middlewares

* [CORS](https://github.com/rs/cors) - CORS handler.

## License

[CC0](https://creativecommons.org/publicdomain/zero/1.0/)
"#;

    #[test]
    fn test_raw_readme_url() {
        assert_eq!(
            raw_readme_url("https://github.com/avelino/awesome-go").unwrap(),
            "https://raw.githubusercontent.com/avelino/awesome-go/HEAD/README.md"
        );
        assert_eq!(
            raw_readme_url("https://github.com/avelino/awesome-go/").unwrap(),
            "https://raw.githubusercontent.com/avelino/awesome-go/HEAD/README.md"
        );
    }

    #[test]
    fn test_raw_readme_url_rejects_non_github() {
        assert!(raw_readme_url("https://gitlab.com/a/b").is_err());
        assert!(raw_readme_url("https://github.com/only-owner").is_err());
    }

    #[test]
    fn test_parse_extracts_title_and_categories() {
        let list = parse_list(README, "https://github.com/avelino/awesome-go").unwrap();
        assert_eq!(list.title, "Awesome Go");
        let names: Vec<&str> = list.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Web Frameworks", "Middlewares"]);
    }

    #[test]
    fn test_parse_skips_meta_sections() {
        let list = parse_list(README, "https://github.com/avelino/awesome-go").unwrap();
        assert!(!list.categories.iter().any(|c| c.name == "Contents"));
        assert!(!list.categories.iter().any(|c| c.name == "License"));
    }

    #[test]
    fn test_parse_entries() {
        let list = parse_list(README, "https://github.com/avelino/awesome-go").unwrap();
        let web = &list.categories[0];
        assert_eq!(web.entries.len(), 2);
        assert_eq!(web.entries[0].title, "Gin");
        assert_eq!(web.entries[0].url, "https://github.com/gin-gonic/gin");
        assert_eq!(web.entries[0].description, "HTTP web framework.");
        // en-dash separator also parses
        assert_eq!(
            web.entries[1].description,
            "High performance minimalist framework."
        );
    }

    #[test]
    fn test_parse_star_bullets() {
        let list = parse_list(README, "https://github.com/avelino/awesome-go").unwrap();
        assert_eq!(list.categories[1].entries[0].title, "CORS");
    }

    #[test]
    fn test_zero_categories_is_fatal() {
        let result = parse_list("# Title\n\nJust prose, no sections.\n", "https://github.com/a/b");
        assert!(matches!(result, Err(ScoutError::Parse(_))));
    }

    #[test]
    fn test_bullet_without_link_ignored() {
        assert!(parse_bullet("- plain text item").is_none());
        assert!(parse_bullet("- [name](not-a-url)").is_none());
    }

    #[test]
    fn test_bullet_without_description() {
        let entry = parse_bullet("- [Thing](https://example.com)").unwrap();
        assert_eq!(entry.description, "");
    }
}
