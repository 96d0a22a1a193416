/*!
 * Mock provider for testing call-layer and pipeline behavior.
 *
 * Outcomes are scripted per call; once the script is drained the mock
 * falls back to a responder closure (or a plain echo). Every request is
 * recorded so tests can assert on attempt counts and prompt content.
 */

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{GenerationProvider, GenerationRequest, GenerationResponse};

/// Scripted outcome for one call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with the given text
    Text(String),
    /// Fail with a transient request error
    Transient(String),
    /// Fail with a rate-limit signal
    RateLimited(String),
    /// Fail with a policy refusal
    Refused(String),
    /// Fail with an empty-response error
    Empty,
}

/// Responder used once the script is drained
type Responder = Arc<dyn Fn(&GenerationRequest) -> Result<GenerationResponse, ProviderError> + Send + Sync>;

/// Mock provider with a per-call outcome script and request log
pub struct MockProvider {
    /// Provider name reported in logs
    name: String,
    /// Outcomes consumed one per call
    script: Mutex<VecDeque<MockOutcome>>,
    /// Fallback responder once the script is empty
    responder: Responder,
    /// All requests seen, in order
    requests: Mutex<Vec<GenerationRequest>>,
    /// Reported output-token ceiling
    token_limit: u32,
    /// Characters per token for count_tokens
    chars_per_token: f64,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("scripted", &self.script.lock().len())
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}

impl MockProvider {
    /// Create a mock that always echoes the prompt back
    pub fn working() -> Self {
        Self::with_responder(|request| Ok(GenerationResponse::from_text(request.prompt.clone())))
    }

    /// Create a mock with a custom fallback responder
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<GenerationResponse, ProviderError> + Send + Sync + 'static,
    {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            responder: Arc::new(responder),
            requests: Mutex::new(Vec::new()),
            token_limit: 8192,
            chars_per_token: 4.0,
        }
    }

    /// Create a mock that plays the given outcomes and then echoes
    pub fn scripted(outcomes: Vec<MockOutcome>) -> Self {
        let mock = Self::working();
        *mock.script.lock() = outcomes.into();
        mock
    }

    /// Create a mock that fails every call with a transient error
    pub fn failing() -> Self {
        Self::with_responder(|_| Err(ProviderError::RequestFailed("mock failure".to_string())))
    }

    /// Create a mock that refuses every call on policy grounds
    pub fn refusing() -> Self {
        Self::with_responder(|_| Err(ProviderError::ContentRefused("mock refusal".to_string())))
    }

    /// Set the provider name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the reported output-token ceiling
    pub fn with_token_limit(mut self, limit: u32) -> Self {
        self.token_limit = limit;
        self
    }

    /// Append outcomes to the script
    pub fn push_outcomes(&self, outcomes: Vec<MockOutcome>) {
        self.script.lock().extend(outcomes);
    }

    /// Number of generate calls seen so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Copy of the recorded requests
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl GenerationProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.requests.lock().push(request.clone());

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(MockOutcome::Text(text)) => Ok(GenerationResponse::from_text(text)),
            Some(MockOutcome::Transient(detail)) => Err(ProviderError::RequestFailed(detail)),
            Some(MockOutcome::RateLimited(detail)) => Err(ProviderError::RateLimited(detail)),
            Some(MockOutcome::Refused(detail)) => Err(ProviderError::ContentRefused(detail)),
            Some(MockOutcome::Empty) => {
                Err(ProviderError::EmptyResponse("scripted empty".to_string()))
            }
            None => (self.responder)(request),
        }
    }

    async fn count_tokens(&self, _model: &str, text: &str) -> Result<u64, ProviderError> {
        Ok((text.chars().count() as f64 / self.chars_per_token).ceil() as u64)
    }

    async fn output_token_limit(&self, _model: &str) -> Result<u32, ProviderError> {
        Ok(self.token_limit)
    }
}
