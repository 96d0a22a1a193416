/*!
 * Provider implementations for text generation services.
 *
 * This module contains client implementations for the LLM providers the
 * pipeline can dispatch to:
 * - Gemini: Google Generative Language API (primary)
 * - OpenAI: OpenAI-compatible chat completions (alternate)
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single generation request, provider-agnostic.
///
/// The resilient call layer fills in the model from the active candidate
/// before dispatching.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier to generate with
    pub model: String,

    /// System instructions, if the provider supports a separate system slot
    pub system: Option<String>,

    /// User prompt body
    pub prompt: String,

    /// Generation temperature
    pub temperature: f32,

    /// Optional cap on generated tokens
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a new request with the given prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            system: None,
            prompt: prompt.into(),
            temperature: 0.0,
            max_output_tokens: None,
        }
    }

    /// Set the system instructions
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// A generation response with optional token accounting
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text, already trimmed
    pub text: String,

    /// Number of prompt tokens, when the provider reports it
    pub prompt_tokens: Option<u64>,

    /// Number of generated tokens, when the provider reports it
    pub completion_tokens: Option<u64>,
}

impl GenerationResponse {
    /// Response carrying only text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }
}

/// Common trait for all generation providers.
///
/// Object safe so the call layer can hold an ordered chain of candidates
/// across different providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// Provider identifier used in logs and failure reports
    fn name(&self) -> &str;

    /// Execute a generation request
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError>;

    /// Count tokens for the given text exactly, server-side where supported
    async fn count_tokens(&self, model: &str, text: &str) -> Result<u64, ProviderError>;

    /// Maximum output tokens for the given model
    async fn output_token_limit(&self, model: &str) -> Result<u32, ProviderError>;
}

pub mod gemini;
pub mod mock;
pub mod openai;
