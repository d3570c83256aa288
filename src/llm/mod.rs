//! LLM provider layer - Anthropic API integration
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation with the web_search server tool
//! - MockLlmClient for scripted tests

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::AnthropicClient;
pub use client::{LlmClient, LlmError, MockLlmClient};
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, ToolCall, ToolSpec, Usage,
    estimate_tokens,
};
