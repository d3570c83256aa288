//! Pipeline driver - the run's state machine
//!
//! Sequences parsing → analysis → planning → progressive search →
//! dedup/score → validation → rendering, committing one artifact per phase.
//! Ceiling and wall-time convert any state to `aborted`, which still renders
//! whatever has been committed; the exit code reflects whether at least one
//! validated link was produced, not whether every phase ran.

pub mod artifacts;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use colored::Colorize;
use serde_json::json;

use crate::agents::{
    Agent, CategoryGapAnalysis, ContentAnalyzer, ContextAnalysis, GapAnalyzer, QueryPlanner,
    Researcher, TermExpander, ValidatedLink, Validator,
};
use crate::cancel::CancelFlag;
use crate::config::RunConfig;
use crate::cost::CostTracker;
use crate::error::{Result, ScoutError};
use crate::list::{AwesomeList, parser, render};
use crate::llm::LlmClient;
use crate::logging::{Component, Level, RunLogger};
use crate::memory::{SearchMemory, category_key};
use crate::report;
use crate::score::{ScoredCandidate, dedup_candidates, score_candidates};
use crate::search::{CategoryOutcome, SearchLimits, SearchOrchestrator};

use artifacts::{RunDir, candidates_artifact_name};

/// Pipeline states. Strictly sequential; `Aborted` is reachable from any of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Parsing,
    Analysis,
    Planning,
    ProgressiveSearch,
    DedupScore,
    Validation,
    Rendering,
    Done,
    Aborted,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Parsing => "parsing",
            Phase::Analysis => "analysis",
            Phase::Planning => "planning",
            Phase::ProgressiveSearch => "progressive_search",
            Phase::DedupScore => "dedup_score",
            Phase::Validation => "validation",
            Phase::Rendering => "rendering",
            Phase::Done => "done",
            Phase::Aborted => "aborted",
        }
    }
}

/// Everything accumulated across phases, kept so an abort can still render.
#[derive(Default)]
struct RunState {
    phase: Option<Phase>,
    list: Option<AwesomeList>,
    context: Option<ContextAnalysis>,
    /// Merged search terms per category key, for the quality scorer.
    terms: HashMap<String, Vec<String>>,
    plan: BTreeMap<String, Vec<String>>,
    outcomes: Vec<CategoryOutcome>,
    scored: Vec<ScoredCandidate>,
    validated: Vec<ValidatedLink>,
}

impl RunState {
    fn phase_str(&self) -> &'static str {
        self.phase.unwrap_or(Phase::Init).as_str()
    }
}

/// The one-screen termination summary the outer harness reads.
#[derive(Debug)]
pub struct RunSummary {
    pub terminal_phase: Phase,
    pub validated_links: usize,
    pub total_cost_usd: f64,
    pub duration_secs: f64,
    pub run_dir: std::path::PathBuf,
    pub abort_reason: Option<String>,
    pub exit_code: i32,
}

impl RunSummary {
    pub fn print(&self) {
        let status = match self.terminal_phase {
            Phase::Done => "done".green().bold(),
            _ => self.terminal_phase.as_str().red().bold(),
        };
        println!();
        println!("{} {}", "linkscout".bold(), status);
        if let Some(reason) = &self.abort_reason {
            println!("  reason:          {}", reason);
        }
        println!("  validated links: {}", self.validated_links);
        println!("  total cost:      ${:.4}", self.total_cost_usd);
        println!("  duration:        {:.1}s", self.duration_secs);
        println!("  run directory:   {}", self.run_dir.display());
    }
}

pub struct Pipeline {
    config: RunConfig,
    client: Arc<dyn LlmClient>,
    cost: Arc<CostTracker>,
    logger: Arc<RunLogger>,
    memory: Arc<Mutex<SearchMemory>>,
    cancel: CancelFlag,
    run_dir: RunDir,
}

impl Pipeline {
    /// Create the run directory and wire up the shared singletons.
    pub fn new(config: RunConfig, client: Arc<dyn LlmClient>) -> Result<Self> {
        let run_dir = RunDir::create(&config.output_dir, Utc::now())?;
        let logger = Arc::new(RunLogger::create(run_dir.path())?);
        // agent.log belongs to the artifact set even before main's logger
        // first writes to it.
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.path().join("agent.log"))?;
        let cost = Arc::new(CostTracker::new(config.cost_ceiling));
        Ok(Self {
            config,
            client,
            cost,
            logger,
            memory: Arc::new(Mutex::new(SearchMemory::new())),
            cancel: CancelFlag::new(),
            run_dir,
        })
    }

    pub fn run_dir_path(&self) -> &Path {
        self.run_dir.path()
    }

    /// Drive the state machine to completion or abort. Never panics; the
    /// returned summary carries the exit code.
    pub async fn run(&self) -> RunSummary {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(self.config.wall_time);
        let mut state = RunState::default();

        let result = self.execute(&mut state, started, deadline).await;
        let duration_secs = started.elapsed().as_secs_f64();

        let (terminal_phase, abort_reason) = match &result {
            Ok(()) => (Phase::Done, None),
            Err(error) => {
                self.logger
                    .error(Component::Pipeline, state.phase_str(), "run", error);
                self.cancel.cancel();
                self.render_partial(&state, duration_secs);
                (Phase::Aborted, Some(error.to_string()))
            }
        };

        let exit_code = match &result {
            Ok(()) => 0,
            Err(ScoutError::WallTimeExceeded(_)) => 124,
            Err(ScoutError::Interrupted) => 130,
            Err(ScoutError::CeilingExceeded { .. }) if !state.validated.is_empty() => 0,
            Err(_) => 1,
        };

        self.logger.event(
            Component::Pipeline,
            Level::Info,
            "run",
            "run finished",
            json!({
                "terminal_phase": terminal_phase.as_str(),
                "validated_links": state.validated.len(),
                "total_cost_usd": self.cost.total(),
                "duration_secs": duration_secs,
                "exit_code": exit_code,
            }),
        );

        RunSummary {
            terminal_phase,
            validated_links: state.validated.len(),
            total_cost_usd: self.cost.total(),
            duration_secs,
            run_dir: self.run_dir.path().to_path_buf(),
            abort_reason,
            exit_code,
        }
    }

    async fn execute(
        &self,
        state: &mut RunState,
        started: Instant,
        deadline: Instant,
    ) -> Result<()> {
        // parsing
        self.enter(state, Phase::Parsing);
        let markdown = match &self.config.readme {
            Some(inline) => inline.clone(),
            None => {
                self.with_deadline(deadline, parser::fetch_readme(&self.config.repo_url))
                    .await?
            }
        };
        let list = parser::parse_list(&markdown, &self.config.repo_url)?;
        self.run_dir.write_json("original.json", &list)?;
        state.list = Some(list);

        // analysis - failure here is fatal, downstream prompts need it
        self.enter(state, Phase::Analysis);
        let analyzer = ContentAnalyzer::new(
            self.agent(ContentAnalyzer::NAME, self.config.models.analyzer.clone()),
        );
        let context = {
            let list = state.list.as_ref().unwrap();
            self.with_deadline(deadline, analyzer.analyze(list)).await?
        };
        self.run_dir.write_json("context_analysis.json", &context)?;
        state.context = Some(context);

        // planning
        self.enter(state, Phase::Planning);
        self.plan(state, deadline).await?;

        // progressive search
        self.enter(state, Phase::ProgressiveSearch);
        self.progressive_search(state, deadline).await?;

        // dedup + score
        self.enter(state, Phase::DedupScore);
        let pool = self.memory.lock().unwrap().results().to_vec();
        let deduped = dedup_candidates(pool);
        let scored = score_candidates(
            deduped,
            &state.terms,
            &state.list.as_ref().unwrap().domain_counts(),
            self.config.max_links,
        );
        self.run_dir.write_json("scored_candidates.json", &scored)?;
        state.scored = scored;

        // validation
        self.enter(state, Phase::Validation);
        let validator = Validator::new(
            self.agent(Validator::NAME, self.config.models.validator.clone()),
            self.logger.clone(),
            self.config.validation_batch,
        );
        let validated = {
            let context = state.context.as_ref().unwrap();
            self.with_deadline(deadline, validator.validate(&state.scored, context))
                .await?
        };
        self.run_dir.write_json("validated_links.json", &validated)?;
        state.validated = validated;

        // rendering
        self.enter(state, Phase::Rendering);
        self.render(state, Phase::Done, started.elapsed().as_secs_f64())?;

        self.enter(state, Phase::Done);
        Ok(())
    }

    async fn plan(&self, state: &mut RunState, deadline: Instant) -> Result<()> {
        let list = state.list.clone().unwrap();
        let planner_model = self.config.models.planner.clone();

        let expander = TermExpander::new(self.agent(TermExpander::NAME, planner_model.clone()));
        let mut expanded_pairs: Vec<(String, Vec<String>)> = Vec::new();
        for category in &list.categories {
            let examples = list.example_titles(&category.name, TermExpander::MAX_EXAMPLES);
            let terms = self
                .with_deadline(deadline, expander.expand(&category.name, &examples))
                .await?;
            expanded_pairs.push((category.name.clone(), terms));
        }

        let gap_analyzer = GapAnalyzer::new(self.agent(GapAnalyzer::NAME, planner_model.clone()));
        let gap_analysis = self
            .with_deadline(deadline, gap_analyzer.analyze(&list, &expanded_pairs))
            .await?;
        let gaps_by_key: HashMap<String, &CategoryGapAnalysis> = gap_analysis
            .iter()
            .map(|(name, analysis)| (category_key(name), analysis))
            .collect();

        let planner = QueryPlanner::new(
            self.agent(QueryPlanner::NAME, planner_model),
            self.config.seed,
        );
        let mut expanded_artifact: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (category, expanded) in &expanded_pairs {
            let mut merged = expanded.clone();
            if let Some(analysis) = gaps_by_key.get(&category_key(category)) {
                merged.extend(analysis.suggested_terms.iter().cloned());
            }
            let mut seen = HashSet::new();
            let terms: Vec<String> = merged
                .into_iter()
                .filter(|t| seen.insert(t.to_lowercase()))
                .collect();

            let existing_urls: Vec<String> = list
                .categories
                .iter()
                .find(|c| c.name == *category)
                .map(|c| c.entries.iter().map(|e| e.url.clone()).collect())
                .unwrap_or_default();

            let queries = self
                .with_deadline(
                    deadline,
                    planner.plan(category, &terms, &existing_urls, self.config.queries_per_round),
                )
                .await?;

            expanded_artifact.insert(category.clone(), terms.clone());
            state.terms.insert(category_key(category), terms);
            state.plan.insert(category.clone(), queries);
        }

        self.run_dir.write_json("expanded_terms.json", &expanded_artifact)?;
        self.run_dir.write_json("plan.json", &state.plan)?;
        Ok(())
    }

    async fn progressive_search(&self, state: &mut RunState, deadline: Instant) -> Result<()> {
        let original_urls = state.list.as_ref().unwrap().canonical_urls();
        let orchestrator = SearchOrchestrator::new(
            QueryPlanner::new(
                self.agent(QueryPlanner::NAME, self.config.models.planner.clone()),
                self.config.seed,
            ),
            Researcher::new(
                self.agent(Researcher::NAME, self.config.models.researcher.clone()),
                self.config.results_per_query,
            ),
            self.memory.clone(),
            self.logger.clone(),
            self.cancel.clone(),
            original_urls,
            SearchLimits {
                max_rounds: self.config.max_rounds,
                queries_per_round: self.config.queries_per_round,
                min_new_per_round: self.config.min_new_per_round,
                target_per_category: self.config.target_per_category,
            },
        );

        // Categories run sequentially; queries inside a round fan out.
        let plan = state.plan.clone();
        for (category, queries) in &plan {
            if self.cancel.is_cancelled() {
                break;
            }
            let outcome = self
                .with_deadline(deadline, orchestrator.run_category(category, queries))
                .await;

            // The category's candidates commit even when the category errored.
            let results: Vec<_> = self
                .memory
                .lock()
                .unwrap()
                .results_for(category)
                .into_iter()
                .cloned()
                .collect();
            self.run_dir
                .write_json(&candidates_artifact_name(category), &results)?;

            match outcome {
                Ok(outcome) => state.outcomes.push(outcome),
                Err(error) => {
                    self.export_memory();
                    return Err(error);
                }
            }
        }

        self.export_memory();
        Ok(())
    }

    fn render(&self, state: &RunState, terminal: Phase, duration_secs: f64) -> Result<()> {
        let Some(list) = state.list.as_ref() else {
            return Ok(());
        };
        if !self.run_dir.exists("updated_list.md") {
            let markdown = render::render_updated_list(list, &state.validated);
            self.run_dir.write_text("updated_list.md", &markdown)?;
        }
        if !self.run_dir.exists("research_report.md") {
            let report = report::render_research_report(
                &self.config.repo_url,
                terminal.as_str(),
                &state.outcomes,
                &state.validated,
                &self.cost.summary(),
                duration_secs,
            );
            self.run_dir.write_text("research_report.md", &report)?;
        }
        if !self.run_dir.exists("graph.html") {
            let results = self.memory.lock().unwrap().results().to_vec();
            let html = report::render_graph_html(&list.title, &results);
            self.run_dir.write_text("graph.html", &html)?;
        }
        Ok(())
    }

    /// Best-effort rendering after an abort: whatever is committed, plus the
    /// memory export. Failures here are logged, never raised.
    fn render_partial(&self, state: &RunState, duration_secs: f64) {
        self.export_memory();
        if let Err(error) = self.render(state, Phase::Aborted, duration_secs) {
            self.logger
                .error(Component::Pipeline, "aborted", "render_partial", &error);
        }
    }

    fn export_memory(&self) {
        let path = self.run_dir.path().join("search_memory.json");
        if path.exists() {
            return;
        }
        if let Err(error) = self.memory.lock().unwrap().export(&path) {
            self.logger
                .error(Component::Memory, "export", "export_memory", &error);
        }
    }

    fn enter(&self, state: &mut RunState, phase: Phase) {
        state.phase = Some(phase);
        self.logger.event(
            Component::Pipeline,
            Level::Info,
            "enter",
            "phase",
            json!({ "phase": phase.as_str() }),
        );
    }

    fn agent(&self, name: &'static str, model: String) -> Agent {
        Agent::new(
            name,
            model,
            self.client.clone(),
            self.cost.clone(),
            self.logger.clone(),
        )
    }

    /// Run one phase future against the wall-time deadline. Expiry cancels
    /// cooperatively and surfaces `WallTimeExceeded`.
    async fn with_deadline<T>(
        &self,
        deadline: Instant,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            self.cancel.cancel();
            return Err(ScoutError::WallTimeExceeded(self.config.wall_time));
        }
        match tokio::time::timeout(remaining, future).await {
            Ok(result) => result,
            Err(_) => {
                self.cancel.cancel();
                Err(ScoutError::WallTimeExceeded(self.config.wall_time))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::ProgressiveSearch.as_str(), "progressive_search");
        assert_eq!(Phase::DedupScore.as_str(), "dedup_score");
        assert_eq!(Phase::Aborted.as_str(), "aborted");
    }

    #[test]
    fn test_run_state_phase_str_defaults_to_init() {
        let state = RunState::default();
        assert_eq!(state.phase_str(), "init");
    }
}
