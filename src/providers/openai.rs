use std::time::Duration;

use log::error;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{GenerationProvider, GenerationRequest, GenerationResponse};

/// Default public endpoint for the chat completions API
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completions client.
///
/// Used as the alternate provider in the fallback chain; also works
/// against any endpoint speaking the same protocol.
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API endpoint URL
    endpoint: String,
    /// Configured output-token ceiling; the protocol has no model-info
    /// endpoint to ask at runtime
    output_token_limit: u32,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// One choice of a chat completions response
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Assistant message inside a choice
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Token usage block
#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
        output_token_limit: u32,
    ) -> Self {
        let endpoint = endpoint.into();
        let mut headers = header::HeaderMap::new();
        if let Ok(value) = header::HeaderValue::from_str(&format!("Bearer {}", api_key.into())) {
            headers.insert(header::AUTHORIZATION, value);
        }

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .default_headers(headers)
                .build()
                .unwrap_or_default(),
            endpoint: if endpoint.is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint.trim_end_matches('/').to_string()
            },
            output_token_limit,
        }
    }

    fn status_to_error(status: u16, body: String) -> ProviderError {
        match status {
            429 => ProviderError::RateLimited(body),
            401 | 403 => ProviderError::AuthenticationError(body),
            _ => ProviderError::ApiError {
                status_code: status,
                message: body,
            },
        }
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OpenAI {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: Some(request.temperature),
            max_tokens: request.max_output_tokens,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("OpenAI API error ({}): {}", status, text);
            return Err(Self::status_to_error(status.as_u16(), text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| ProviderError::EmptyResponse("no choices returned".to_string()))?;

        // An explicit refusal or a content-filter stop is a policy
        // rejection; retrying the same candidate cannot succeed.
        if let Some(refusal) = &choice.message.refusal {
            return Err(ProviderError::ContentRefused(refusal.clone()));
        }
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(ProviderError::ContentRefused(
                "finish reason: content_filter".to_string(),
            ));
        }

        let text = choice
            .message
            .content
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse(
                "empty message content".to_string(),
            ));
        }

        Ok(GenerationResponse {
            text,
            prompt_tokens: parsed.usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: parsed.usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }

    async fn count_tokens(&self, _model: &str, text: &str) -> Result<u64, ProviderError> {
        // No server-side counting endpoint; a conservative character
        // heuristic keeps the chunker on the safe side.
        Ok((text.chars().count() as f64 / 3.5).ceil() as u64)
    }

    async fn output_token_limit(&self, _model: &str) -> Result<u32, ProviderError> {
        Ok(self.output_token_limit)
    }
}
