//! linkscout - discovers new links for Awesome lists
//!
//! Given the README of a curated "Awesome list" repository, linkscout runs a
//! multi-agent pipeline - analyze, plan, progressively search, dedup, score,
//! validate - and renders an updated, lint-clean list plus run artifacts.

pub mod agents;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod cost;
pub mod error;
pub mod list;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod search;

pub use error::{Result, ScoutError};
