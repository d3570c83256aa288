//! Structured run logging
//!
//! One logger per run, writing one JSON object per line into per-component
//! streams under `<run_dir>/logs/`. Process-level diagnostics still go
//! through the `log` facade (env_logger piped to `agent.log`); this module is
//! the machine-readable record the harness and reports consume.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::error::Result;

/// Per-component log streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Pipeline,
    Agent,
    Search,
    Validation,
    Cost,
    Memory,
    Errors,
}

impl Component {
    pub fn stream_name(&self) -> &'static str {
        match self {
            Component::Pipeline => "pipeline",
            Component::Agent => "agent",
            Component::Search => "search",
            Component::Validation => "validation",
            Component::Cost => "cost",
            Component::Memory => "memory",
            Component::Errors => "errors",
        }
    }

    fn all() -> [Component; 7] {
        [
            Component::Pipeline,
            Component::Agent,
            Component::Search,
            Component::Validation,
            Component::Cost,
            Component::Memory,
            Component::Errors,
        ]
    }
}

/// Log severity. Serialized uppercase to match conventional level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

/// Writes structured records to per-component JSONL files.
///
/// Formatting failures never propagate: unserializable extras are coerced to
/// their `Debug` string and the record is still written.
#[derive(Debug)]
pub struct RunLogger {
    log_dir: PathBuf,
    streams: Mutex<HashMap<Component, File>>,
}

impl RunLogger {
    /// Create the `logs/` directory and open one stream per component.
    pub fn create(run_dir: &Path) -> Result<Self> {
        let log_dir = run_dir.join("logs");
        fs::create_dir_all(&log_dir)?;
        let mut streams = HashMap::new();
        for component in Component::all() {
            let path = log_dir.join(format!("{}.jsonl", component.stream_name()));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            streams.insert(component, file);
        }
        Ok(Self {
            log_dir,
            streams: Mutex::new(streams),
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Emit one record to a component stream. `function` is the emitting
    /// function's name; module and line come from the call site.
    #[track_caller]
    pub fn event(
        &self,
        component: Component,
        level: Level,
        function: &'static str,
        message: &str,
        extras: Value,
    ) {
        let site = Location::caller();
        self.write(component, level, function, message, extras, site);
    }

    /// Record an error in `errors.jsonl` with its originating component and
    /// phase. Every error, recovered or fatal, lands here.
    #[track_caller]
    pub fn error(
        &self,
        component: Component,
        phase: &str,
        function: &'static str,
        error: &dyn std::fmt::Display,
    ) {
        let site = Location::caller();
        self.write(
            Component::Errors,
            Level::Error,
            function,
            &error.to_string(),
            json!({
                "component": component.stream_name(),
                "phase": phase,
            }),
            site,
        );
    }

    /// Record one complete LLM call: full prompt, truncated response preview,
    /// usage counters, cost, and timing.
    #[allow(clippy::too_many_arguments)]
    #[track_caller]
    pub fn llm_call(
        &self,
        function: &'static str,
        agent: &str,
        model: &str,
        system: &str,
        messages: &Value,
        response_text: &str,
        input_tokens: u64,
        output_tokens: u64,
        cost_usd: f64,
        elapsed_secs: f64,
    ) {
        let site = Location::caller();
        let preview: String = response_text.chars().take(1_000).collect();
        self.write(
            Component::Agent,
            Level::Info,
            function,
            "llm_call",
            json!({
                "agent": agent,
                "model": model,
                "system": system,
                "messages": messages,
                "response_preview": preview,
                "input_tokens": input_tokens,
                "output_tokens": output_tokens,
                "cost_usd": cost_usd,
                "elapsed_secs": elapsed_secs,
            }),
            site,
        );
    }

    fn write(
        &self,
        component: Component,
        level: Level,
        function: &'static str,
        message: &str,
        extras: Value,
        site: &Location<'_>,
    ) {
        let mut record = Map::new();
        record.insert(
            "timestamp".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("level".into(), json!(level.as_str()));
        record.insert("logger".into(), json!(component.stream_name()));
        record.insert("message".into(), json!(message));
        record.insert("module".into(), json!(site.file()));
        record.insert("function".into(), json!(function));
        record.insert("line".into(), json!(site.line()));

        match extras {
            Value::Object(map) => {
                for (key, value) in map {
                    record.insert(key, coerce(value));
                }
            }
            Value::Null => {}
            other => {
                record.insert("extra".into(), coerce(other));
            }
        }

        let line = serde_json::to_string(&Value::Object(record))
            .unwrap_or_else(|e| format!("{{\"level\":\"ERROR\",\"message\":\"unloggable record: {}\"}}", e));

        let mut streams = self.streams.lock().unwrap();
        if let Some(file) = streams.get_mut(&component) {
            // A failed write is not worth failing the run over.
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Keep values JSON-clean; non-finite floats become strings rather than null.
fn coerce(value: Value) -> Value {
    match value {
        Value::Number(n) => {
            if n.as_f64().map(|f| f.is_finite()).unwrap_or(true) {
                Value::Number(n)
            } else {
                Value::String(n.to_string())
            }
        }
        other => other,
    }
}
