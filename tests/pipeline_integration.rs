//! End-to-end pipeline tests with a scripted mock LLM client
//!
//! Each test drives the full state machine against an inline README and
//! asserts on the artifacts the run leaves behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use linkscout::config::RunConfig;
use linkscout::llm::{CompletionResponse, MockLlmClient};
use linkscout::memory::canonicalize;
use linkscout::pipeline::{Phase, Pipeline};
use serde_json::Value;
use tempfile::TempDir;

const README: &str = r#"# Awesome Test

A curated list for testing.

## Web Frameworks

- [Existing](https://known.com/existing) - Already here.
- [Other](https://other.com/tool) - Also here.
"#;

fn base_config(output_dir: &Path) -> RunConfig {
    RunConfig {
        repo_url: "https://github.com/example/awesome-test".to_string(),
        output_dir: output_dir.to_path_buf(),
        readme: Some(README.to_string()),
        ..Default::default()
    }
}

fn text(content: &str) -> CompletionResponse {
    CompletionResponse::text(content)
}

/// The scripted responses for a complete successful run over one category.
fn happy_path_script() -> Vec<CompletionResponse> {
    vec![
        // analysis
        text(
            r#"{"primary_domain": "testing", "programming_language": null,
                "audience": "developers", "category_semantics": {"Web Frameworks": "servers"}}"#,
        ),
        // planning: expander, gap analyzer, planner
        text(r#"{"terms": ["web framework", "http server"]}"#),
        text(r#"{"Web Frameworks": {"missing_topics": ["async"], "suggested_terms": ["async web"]}}"#),
        text(r#"{"queries": ["q one", "q two", "q three"]}"#),
        // search round 1 (3 queries)
        text(
            r#"[{"url": "https://known.com/existing", "title": "Existing", "description": "dup of the original list"},
                {"url": "https://new1.com/a", "title": "New One", "description": "first new thing"}]"#,
        ),
        text(
            r#"[{"url": "https://new1.com/a", "title": "New One Again", "description": "cross-query duplicate"},
                {"url": "https://new2.com/b", "title": "New Two", "description": "second new thing"}]"#,
        ),
        text(r#"[{"url": "https://new3.com/c", "title": "New Three", "description": "third new thing"}]"#),
        // search round 2: refinement plan + 3 queries
        text(r#"{"queries": ["q four", "q five", "q six"]}"#),
        text(r#"[{"url": "https://new4.com/d", "title": "New Four", "description": "fourth new thing"}]"#),
        text(r#"[{"url": "https://new5.com/e", "title": "New Five", "description": "fifth new thing"}]"#),
        text("[]"),
        // validation (single batch)
        text(
            r#"{"verdicts": [
                {"url": "https://new1.com/a", "accept": true, "reason": "solid"},
                {"url": "https://new2.com/b", "accept": true, "reason": "solid"},
                {"url": "https://new3.com/c", "accept": true, "reason": "solid"},
                {"url": "https://new4.com/d", "accept": true, "reason": "solid"},
                {"url": "https://new5.com/e", "accept": false, "reason": "dead link"}
            ]}"#,
        ),
    ]
}

fn single_run_dir(output_dir: &Path) -> PathBuf {
    let mut entries: Vec<PathBuf> = fs::read_dir(output_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected exactly one run directory");
    entries.pop().unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_happy_path_produces_all_artifacts() {
    let output = TempDir::new().unwrap();
    let client = Arc::new(MockLlmClient::new(happy_path_script()));
    let pipeline = Pipeline::new(base_config(output.path()), client.clone()).unwrap();

    let summary = pipeline.run().await;
    assert_eq!(summary.terminal_phase, Phase::Done);
    assert_eq!(summary.exit_code, 0);
    assert_eq!(summary.validated_links, 4);
    assert_eq!(client.remaining(), 0, "every scripted response consumed");

    let run_dir = single_run_dir(output.path());
    for artifact in [
        "original.json",
        "context_analysis.json",
        "expanded_terms.json",
        "search_memory.json",
        "plan.json",
        "candidates_web_frameworks.json",
        "scored_candidates.json",
        "validated_links.json",
        "updated_list.md",
        "research_report.md",
        "graph.html",
        "agent.log",
    ] {
        assert!(run_dir.join(artifact).exists(), "missing {}", artifact);
    }
    for stream in [
        "pipeline", "agent", "search", "validation", "cost", "memory", "errors",
    ] {
        assert!(
            run_dir.join("logs").join(format!("{}.jsonl", stream)).exists(),
            "missing logs/{}.jsonl",
            stream
        );
    }
}

#[tokio::test]
async fn test_happy_path_invariants() {
    let output = TempDir::new().unwrap();
    let client = Arc::new(MockLlmClient::new(happy_path_script()));
    let pipeline = Pipeline::new(base_config(output.path()), client).unwrap();
    let summary = pipeline.run().await;
    assert_eq!(summary.exit_code, 0);

    let run_dir = single_run_dir(output.path());
    let validated = read_json(&run_dir.join("validated_links.json"));
    let validated = validated.as_array().unwrap();
    assert_eq!(validated.len(), 4);

    // No intersection with the original list under canonical equality.
    let original = read_json(&run_dir.join("original.json"));
    let original_canonical: Vec<String> = original["categories"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|c| c["entries"].as_array().unwrap().iter())
        .map(|e| canonicalize(e["url"].as_str().unwrap()))
        .collect();
    for link in validated {
        let canonical = canonicalize(link["url"].as_str().unwrap());
        assert!(
            !original_canonical.contains(&canonical),
            "validated link {} collides with the original list",
            canonical
        );
    }

    // No two validated links share a canonical URL.
    let mut canonicals: Vec<String> = validated
        .iter()
        .map(|l| canonicalize(l["url"].as_str().unwrap()))
        .collect();
    canonicals.sort();
    canonicals.dedup();
    assert_eq!(canonicals.len(), validated.len());

    // Every validated entry carries the contractual fields.
    for link in validated {
        for field in ["url", "title", "description", "category", "quality_score"] {
            assert!(link.get(field).is_some(), "missing field {}", field);
        }
    }

    // Search memory admitted exactly the 5 distinct new URLs.
    let memory = read_json(&run_dir.join("search_memory.json"));
    assert_eq!(memory["summary"]["total_results"], 5);
    assert!(memory["patterns"]["query_success"].is_object());

    // The updated list keeps the original entries and appends the accepted.
    let updated = fs::read_to_string(run_dir.join("updated_list.md")).unwrap();
    assert!(updated.contains("- [Existing](https://known.com/existing)"));
    assert!(updated.contains("- [New One](https://new1.com/a)"));
    assert!(!updated.contains("https://new5.com/e"), "rejected link rendered");
}

#[tokio::test]
async fn test_happy_path_log_completeness_and_cost_bound() {
    let output = TempDir::new().unwrap();
    let client = Arc::new(MockLlmClient::new(happy_path_script()));
    let pipeline = Pipeline::new(base_config(output.path()), client).unwrap();
    let summary = pipeline.run().await;
    assert_eq!(summary.exit_code, 0);

    let run_dir = single_run_dir(output.path());
    let agent_log = fs::read_to_string(run_dir.join("logs/agent.jsonl")).unwrap();
    let records: Vec<Value> = agent_log
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // One record per successful LLM call, each with model, messages, usage, cost.
    assert_eq!(records.len(), 12);
    let mut cost_sum = 0.0;
    for record in &records {
        assert!(record["model"].is_string());
        assert!(record["messages"].is_array());
        assert!(record["input_tokens"].is_number());
        assert!(record["output_tokens"].is_number());
        cost_sum += record["cost_usd"].as_f64().unwrap();
    }
    assert!(cost_sum <= 10.0, "cost records exceed the ceiling");
    assert!((summary.total_cost_usd - cost_sum).abs() < 1e-9);
}

#[tokio::test]
async fn test_seeded_plan_is_byte_identical_across_runs() {
    fn script() -> Vec<CompletionResponse> {
        vec![
            text(r#"{"primary_domain": "testing", "audience": "developers"}"#),
            text(r#"{"terms": ["web framework"]}"#),
            text(r#"{"Web Frameworks": {"missing_topics": [], "suggested_terms": []}}"#),
            text(r#"{"queries": ["alpha one", "beta two", "gamma three", "delta four"]}"#),
            // round 1: nothing found
            text("[]"),
            text("[]"),
            text("[]"),
            // round 2 refinement: planner has nothing new, category ends
            text(r#"{"queries": []}"#),
        ]
    }

    let mut plans = Vec::new();
    for _ in 0..2 {
        let output = TempDir::new().unwrap();
        let mut config = base_config(output.path());
        config.seed = Some(42);
        let pipeline =
            Pipeline::new(config, Arc::new(MockLlmClient::new(script()))).unwrap();
        let summary = pipeline.run().await;
        assert_eq!(summary.exit_code, 0);
        let run_dir = single_run_dir(output.path());
        plans.push(fs::read(run_dir.join("plan.json")).unwrap());
    }
    assert_eq!(plans[0], plans[1], "seeded plan.json must be byte-identical");
}

#[tokio::test]
async fn test_zero_cost_ceiling_aborts_before_first_call() {
    let output = TempDir::new().unwrap();
    let client = Arc::new(MockLlmClient::new(happy_path_script()));
    let mut config = base_config(output.path());
    config.cost_ceiling = 0.0;
    let pipeline = Pipeline::new(config, client.clone()).unwrap();

    let summary = pipeline.run().await;
    assert_eq!(summary.terminal_phase, Phase::Aborted);
    assert_eq!(summary.exit_code, 1);
    assert_eq!(summary.validated_links, 0);
    assert_eq!(summary.total_cost_usd, 0.0);
    // The provider was never reached.
    assert_eq!(client.requests().len(), 0);

    let run_dir = single_run_dir(output.path());
    assert!(!run_dir.join("context_analysis.json").exists());
    let errors = fs::read_to_string(run_dir.join("logs/errors.jsonl")).unwrap();
    assert!(errors.contains("Cost ceiling exceeded"));
}

#[tokio::test]
async fn test_zero_wall_time_exits_124() {
    let output = TempDir::new().unwrap();
    let client = Arc::new(MockLlmClient::new(happy_path_script()));
    let mut config = base_config(output.path());
    config.wall_time = 0;
    let pipeline = Pipeline::new(config, client).unwrap();

    let summary = pipeline.run().await;
    assert_eq!(summary.terminal_phase, Phase::Aborted);
    assert_eq!(summary.exit_code, 124);

    let run_dir = single_run_dir(output.path());
    let errors = fs::read_to_string(run_dir.join("logs/errors.jsonl")).unwrap();
    assert!(errors.contains("Wall time exceeded"));
}

#[tokio::test]
async fn test_zero_category_readme_is_fatal() {
    let output = TempDir::new().unwrap();
    let mut config = base_config(output.path());
    config.readme = Some("# Title\n\nNo sections here.\n".to_string());
    let pipeline = Pipeline::new(config, Arc::new(MockLlmClient::new(vec![]))).unwrap();

    let summary = pipeline.run().await;
    assert_eq!(summary.terminal_phase, Phase::Aborted);
    assert_eq!(summary.exit_code, 1);
    assert!(summary.abort_reason.unwrap().contains("no categories"));
}

#[tokio::test]
async fn test_downstream_failures_degrade_gracefully() {
    // Script runs out after round 1's queries: the refinement call fails,
    // which the orchestrator logs and absorbs (category ends early), and the
    // validation batch's failure drops its candidates rather than the run.
    let script = happy_path_script().into_iter().take(7).collect::<Vec<_>>();
    let output = TempDir::new().unwrap();
    let pipeline =
        Pipeline::new(base_config(output.path()), Arc::new(MockLlmClient::new(script))).unwrap();

    let summary = pipeline.run().await;
    assert_eq!(summary.terminal_phase, Phase::Done);
    assert_eq!(summary.exit_code, 0);
    assert_eq!(summary.validated_links, 0);

    let run_dir = single_run_dir(output.path());
    assert!(run_dir.join("plan.json").exists());
    assert!(run_dir.join("candidates_web_frameworks.json").exists());
    assert!(run_dir.join("search_memory.json").exists());
    assert!(run_dir.join("updated_list.md").exists());
    assert!(run_dir.join("research_report.md").exists());
    // Round 1's accepted candidates still made it into the pool.
    let scored = read_json(&run_dir.join("scored_candidates.json"));
    assert_eq!(scored.as_array().unwrap().len(), 3);
    // Both recovered failures left their trace.
    let errors = fs::read_to_string(run_dir.join("logs/errors.jsonl")).unwrap();
    assert!(errors.lines().count() >= 2);
}
