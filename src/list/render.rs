//! Updated-list rendering
//!
//! Re-emits the parsed list with validated discoveries appended to their
//! categories. Category names match case-insensitively; the original heading
//! casing wins. Formatting follows the linter's conventions: one bullet per
//! link, descriptions capitalized and period-terminated.

use std::collections::HashMap;

use super::AwesomeList;
use crate::agents::ValidatedLink;

/// Render the updated list markdown.
pub fn render_updated_list(list: &AwesomeList, accepted: &[ValidatedLink]) -> String {
    let mut by_category: HashMap<String, Vec<&ValidatedLink>> = HashMap::new();
    for link in accepted {
        by_category
            .entry(link.category.to_lowercase())
            .or_default()
            .push(link);
    }

    let mut out = String::new();
    out.push_str(&format!("# {}\n", list.title));

    for category in &list.categories {
        out.push('\n');
        out.push_str(&format!("## {}\n\n", category.name));
        for entry in &category.entries {
            out.push_str(&format_bullet(&entry.title, &entry.url, &entry.description));
        }
        if let Some(new_links) = by_category.remove(&category.name.to_lowercase()) {
            for link in new_links {
                out.push_str(&format_bullet(&link.title, &link.url, &link.description));
            }
        }
    }

    out
}

fn format_bullet(title: &str, url: &str, description: &str) -> String {
    let description = tidy_description(description);
    if description.is_empty() {
        format!("- [{}]({})\n", title, url)
    } else {
        format!("- [{}]({}) - {}\n", title, url, description)
    }
}

/// Capitalize the first letter and terminate with a period.
fn tidy_description(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut chars = trimmed.chars();
    let first = chars.next().unwrap().to_uppercase().to_string();
    let mut tidied = format!("{}{}", first, chars.as_str());
    if !tidied.ends_with(['.', '!', '?']) {
        tidied.push('.');
    }
    tidied
}
