//! Run directory and artifact writing
//!
//! One directory per run, named by UTC timestamp. Each phase commits exactly
//! one artifact; artifacts are write-once, and a second write of the same
//! name is an error rather than a silent overwrite.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, ScoutError};

/// The per-run output directory.
#[derive(Debug)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    /// Create `<output_dir>/<YYYY-MM-DDTHH-MM-SSZ>/`.
    pub fn create(output_dir: &Path, at: DateTime<Utc>) -> Result<Self> {
        let name = at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
        let root = output_dir.join(name);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write a JSON artifact. Write-once: an existing file is an error.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.guard(name)?;
        fs::write(path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    /// Write a text artifact (markdown, HTML). Write-once.
    pub fn write_text(&self, name: &str, content: &str) -> Result<()> {
        let path = self.guard(name)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }

    fn guard(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if path.exists() {
            return Err(ScoutError::Artifact(format!(
                "artifact {} already written this run",
                name
            )));
        }
        Ok(path)
    }
}

/// File-safe artifact name for a category: `candidates_<category>.json`.
pub fn candidates_artifact_name(category: &str) -> String {
    let slug: String = category
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("candidates_{}.json", slug)
}
