//! Run configuration
//!
//! Everything a run needs, resolved once from CLI flags and the environment
//! before the pipeline starts.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::{Result, ScoutError};

/// Default model for list analysis.
pub const DEFAULT_MODEL_ANALYZER: &str = "claude-sonnet-4-20250514";
/// Default model for term expansion, gap analysis, and query planning.
pub const DEFAULT_MODEL_PLANNER: &str = "claude-sonnet-4-20250514";
/// Default model for web-search execution.
pub const DEFAULT_MODEL_RESEARCHER: &str = "claude-3-5-haiku-20241022";
/// Default model for candidate validation.
pub const DEFAULT_MODEL_VALIDATOR: &str = "claude-3-5-haiku-20241022";

/// Which model each agent family uses.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub analyzer: String,
    pub planner: String,
    pub researcher: String,
    pub validator: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            analyzer: DEFAULT_MODEL_ANALYZER.to_string(),
            planner: DEFAULT_MODEL_PLANNER.to_string(),
            researcher: DEFAULT_MODEL_RESEARCHER.to_string(),
            validator: DEFAULT_MODEL_VALIDATOR.to_string(),
        }
    }
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub repo_url: String,
    /// Wall-time budget in seconds.
    pub wall_time: u64,
    /// Hard USD spend bound.
    pub cost_ceiling: f64,
    /// Parent directory for per-run directories.
    pub output_dir: PathBuf,
    /// Seed for reproducible query planning; None means nondeterministic.
    pub seed: Option<u64>,
    pub models: ModelSelection,
    /// Inline README markdown; when set, the parsing phase skips the fetch.
    pub readme: Option<String>,

    // Search tuning
    pub max_rounds: u32,
    pub queries_per_round: usize,
    pub results_per_query: u32,
    pub min_new_per_round: usize,
    pub target_per_category: usize,
    pub max_links: usize,
    pub validation_batch: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            wall_time: 600,
            cost_ceiling: 10.0,
            output_dir: PathBuf::from("runs"),
            seed: None,
            models: ModelSelection::default(),
            readme: None,
            max_rounds: 3,
            queries_per_round: 3,
            results_per_query: 6,
            min_new_per_round: 2,
            target_per_category: 5,
            max_links: 25,
            validation_batch: 8,
        }
    }
}

impl RunConfig {
    /// Resolve configuration from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.repo_url.trim().is_empty() {
            return Err(ScoutError::Config("--repo_url must not be empty".to_string()));
        }
        Ok(Self {
            repo_url: cli.repo_url.clone(),
            wall_time: cli.wall_time,
            cost_ceiling: cli.cost_ceiling,
            output_dir: cli.output_dir.clone(),
            seed: cli.seed,
            models: ModelSelection {
                analyzer: cli.model_analyzer.clone(),
                planner: cli.model_planner.clone(),
                researcher: cli.model_researcher.clone(),
                validator: cli.model_validator.clone(),
            },
            ..Default::default()
        })
    }

    /// Fail fast when the provider credential is absent.
    pub fn ensure_api_key() -> Result<String> {
        std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ScoutError::Config(
                "ANTHROPIC_API_KEY is not set; export it before running".to_string(),
            )
        })
    }
}
