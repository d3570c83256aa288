//! Run reports - research summary and discovery timeline
//!
//! Thin rendering over data the pipeline already holds. The markdown report
//! is for humans; the HTML timeline is a self-contained page with no external
//! assets.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::agents::ValidatedLink;
use crate::memory::SearchResult;
use crate::search::CategoryOutcome;

/// Render `research_report.md`.
pub fn render_research_report(
    repo_url: &str,
    terminal_phase: &str,
    outcomes: &[CategoryOutcome],
    validated: &[ValidatedLink],
    cost_summary: &Value,
    duration_secs: f64,
) -> String {
    let mut out = String::new();
    out.push_str("# Research Report\n\n");
    out.push_str(&format!("- Repository: {}\n", repo_url));
    out.push_str(&format!("- Final phase: {}\n", terminal_phase));
    out.push_str(&format!("- Duration: {:.1}s\n", duration_secs));
    out.push_str(&format!(
        "- Total cost: ${:.4} (ceiling ${:.2})\n",
        cost_summary["total_usd"].as_f64().unwrap_or(0.0),
        cost_summary["ceiling_usd"].as_f64().unwrap_or(0.0),
    ));
    out.push_str(&format!("- Validated links: {}\n\n", validated.len()));

    out.push_str("## Search outcomes\n\n");
    out.push_str("| Category | Accepted | Rounds | Queries |\n");
    out.push_str("|----------|----------|--------|---------|\n");
    for outcome in outcomes {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            outcome.category, outcome.accepted, outcome.rounds_run, outcome.queries_issued
        ));
    }

    out.push_str("\n## Validated links\n\n");
    if validated.is_empty() {
        out.push_str("None.\n");
    } else {
        for link in validated {
            out.push_str(&format!(
                "- [{}]({}) ({}, score {:.2})\n",
                link.title, link.url, link.category, link.quality_score
            ));
        }
    }

    out.push_str("\n## Cost by agent\n\n");
    if let Some(by_agent) = cost_summary["by_agent"].as_object() {
        let mut agents: Vec<&String> = by_agent.keys().collect();
        agents.sort();
        for agent in agents {
            out.push_str(&format!(
                "- {}: ${:.4}\n",
                agent,
                by_agent[agent]["cost_usd"].as_f64().unwrap_or(0.0)
            ));
        }
    }

    out
}

/// Render `graph.html`: every discovered result on a time axis, grouped by
/// category.
pub fn render_graph_html(title: &str, results: &[SearchResult]) -> String {
    let mut rows = String::new();
    for result in results {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td><a href=\"{}\">{}</a></td><td>{}</td></tr>\n",
            escape(&timestamp(result.found_at)),
            escape(&result.category),
            escape(&result.url),
            escape(&result.title),
            escape(&result.source_query),
        ));
    }
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n\
         <title>{} - discovery timeline</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2rem; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }}\n\
         th {{ background: #f0f0f0; }}\n\
         </style></head><body>\n\
         <h1>{} - discovery timeline</h1>\n\
         <p>{} results in admission order.</p>\n\
         <table>\n<tr><th>Found at</th><th>Category</th><th>Link</th><th>Query</th></tr>\n\
         {}</table>\n</body></html>\n",
        escape(title),
        escape(title),
        results.len(),
        rows,
    )
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
