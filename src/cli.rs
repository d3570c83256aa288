//! CLI definition using clap.
//!
//! One command: point linkscout at an Awesome-list repository and let the
//! pipeline discover, validate, and render new links.

use clap::Parser;
use std::path::PathBuf;

use crate::config;

/// linkscout - discover new links for an Awesome list
#[derive(Parser, Debug)]
#[command(name = "linkscout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub URL of the Awesome-list repository to update
    #[arg(long = "repo_url")]
    pub repo_url: String,

    /// Wall-time budget in seconds
    #[arg(long = "wall_time", default_value_t = 600)]
    pub wall_time: u64,

    /// Hard USD spend ceiling for LLM calls
    #[arg(long = "cost_ceiling", default_value_t = 10.0)]
    pub cost_ceiling: f64,

    /// Parent directory for run artifacts
    #[arg(long = "output_dir", default_value = "runs")]
    pub output_dir: PathBuf,

    /// Seed for reproducible query planning (omit for nondeterministic)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Model for list analysis
    #[arg(long = "model_analyzer", default_value = config::DEFAULT_MODEL_ANALYZER)]
    pub model_analyzer: String,

    /// Model for term expansion and query planning
    #[arg(long = "model_planner", default_value = config::DEFAULT_MODEL_PLANNER)]
    pub model_planner: String,

    /// Model for web-search execution
    #[arg(long = "model_researcher", default_value = config::DEFAULT_MODEL_RESEARCHER)]
    pub model_researcher: String,

    /// Model for candidate validation
    #[arg(long = "model_validator", default_value = config::DEFAULT_MODEL_VALIDATOR)]
    pub model_validator: String,
}
