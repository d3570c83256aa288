//! LLM client trait and the scripted mock used by tests
//!
//! Each call is independent; no conversation state lives in the client.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Errors from the provider layer.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: {0} not set")]
    MissingApiKey(String),

    #[error("Mock exhausted: no scripted response left")]
    MockExhausted,
}

impl LlmError {
    /// Transient errors (429, 5xx, network) are worth a backoff retry;
    /// everything else surfaces immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::MissingApiKey(_) => false,
            LlmError::MockExhausted => false,
        }
    }
}

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Default model identifier
    fn model(&self) -> &str;
}

/// Scripted client for tests: pops pre-built responses in order and records
/// every request it saw.
pub struct MockLlmClient {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::MockExhausted)
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Usage;

    #[tokio::test]
    async fn test_mock_pops_in_order() {
        let mock = MockLlmClient::new(vec![
            CompletionResponse::text("first"),
            CompletionResponse::text("second"),
        ]);

        let r1 = mock.complete(CompletionRequest::new("s")).await.unwrap();
        let r2 = mock.complete(CompletionRequest::new("s")).await.unwrap();
        assert_eq!(r1.content, "first");
        assert_eq!(r2.content, "second");
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn test_mock_exhausted() {
        let mock = MockLlmClient::new(vec![]);
        let err = mock.complete(CompletionRequest::new("s")).await.unwrap_err();
        assert!(matches!(err, LlmError::MockExhausted));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockLlmClient::new(vec![CompletionResponse::text("ok")]);
        let _ = mock
            .complete(CompletionRequest::new("system").with_user_message("hello"))
            .await;
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "system");
        assert_eq!(requests[0].messages[0].content, "hello");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            LlmError::RateLimited {
                retry_after: Duration::from_secs(30)
            }
            .is_retryable()
        );
        assert!(
            LlmError::ApiError {
                status: 503,
                message: "overloaded".to_string()
            }
            .is_retryable()
        );
        assert!(
            !LlmError::ApiError {
                status: 400,
                message: "bad request".to_string()
            }
            .is_retryable()
        );
        assert!(LlmError::Network("reset".to_string()).is_retryable());
        assert!(!LlmError::InvalidResponse("garbage".to_string()).is_retryable());
    }

    #[test]
    fn test_mock_response_with_usage() {
        let mut resp = CompletionResponse::text("x");
        resp.usage = Usage::new(10, 5);
        assert_eq!(resp.usage.total(), 15);
    }
}
