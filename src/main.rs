use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use log::info;

use linkscout::cli::Cli;
use linkscout::config::RunConfig;
use linkscout::llm::AnthropicClient;
use linkscout::pipeline::Pipeline;

/// Pipe process diagnostics into the run directory's agent.log.
fn setup_logging(run_dir: &Path) -> Result<()> {
    let log_file = run_dir.join("agent.log");
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open agent.log")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("logging initialized, writing to: {}", log_file.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match RunConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("linkscout: {}", error);
            std::process::exit(1);
        }
    };

    if let Err(error) = RunConfig::ensure_api_key() {
        eprintln!("linkscout: {}", error);
        std::process::exit(1);
    }

    let client = Arc::new(
        AnthropicClient::from_env(config.models.analyzer.clone())
            .map_err(|e| eyre::eyre!("failed to create LLM client: {}", e))?,
    );

    let pipeline = Pipeline::new(config, client)
        .map_err(|e| eyre::eyre!("failed to initialize run: {}", e))?;

    setup_logging(pipeline.run_dir_path()).context("Failed to setup logging")?;
    info!("run directory: {}", pipeline.run_dir_path().display());

    tokio::select! {
        summary = pipeline.run() => {
            summary.print();
            std::process::exit(summary.exit_code);
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nlinkscout: interrupted");
            std::process::exit(130);
        }
    }
}
