use std::time::Duration;

use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{GenerationProvider, GenerationRequest, GenerationResponse};

/// Default public endpoint of the Generative Language API
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Safety categories that are disabled for every request. Literary text
/// routinely trips these filters, and a blocked chunk would otherwise
/// surface as an empty response mid-chapter.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini client for the Google Generative Language API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
}

/// One text part of a content payload
#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Content payload wrapping parts
#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

/// Per-category safety override
#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

/// Generation tuning parameters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    safety_settings: Vec<SafetySetting>,
    generation_config: GenerationConfig,
}

/// One candidate in a generateContent response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Feedback block present when the prompt itself was rejected
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Token accounting attached to a response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

/// countTokens response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: u64,
}

/// models.get response body, reduced to the field we need
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    #[serde(default)]
    output_token_limit: Option<u32>,
}

/// Finish reasons that indicate a policy rejection rather than a
/// transient failure
fn is_refusal_reason(reason: &str) -> bool {
    matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII")
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: if endpoint.is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint.trim_end_matches('/').to_string()
            },
        }
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        if verb.is_empty() {
            format!("{}/models/{}?key={}", self.endpoint, model, self.api_key)
        } else {
            format!("{}/models/{}:{}?key={}", self.endpoint, model, verb, self.api_key)
        }
    }

    fn safety_settings() -> Vec<SafetySetting> {
        SAFETY_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: (*category).to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect()
    }

    /// Map a non-success HTTP status to a typed provider error
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
impl GenerationProvider for Gemini {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
                role: Some("user".to_string()),
            }],
            system_instruction: request.system.as_ref().map(|text| Content {
                parts: vec![Part { text: text.clone() }],
                role: None,
            }),
            safety_settings: Self::safety_settings(),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let url = self.model_url(&request.model, "generateContent");
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
            error!("Gemini API error ({}): {}", status, text);
            return Err(Self::status_to_error(status.as_u16(), text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(feedback) = &parsed.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(ProviderError::ContentRefused(format!(
                    "prompt blocked: {}",
                    reason
                )));
            }
        }

        let candidate = parsed
            .candidates
            .first()
            .ok_or_else(|| ProviderError::EmptyResponse("no candidates returned".to_string()))?;

        if let Some(reason) = &candidate.finish_reason {
            if is_refusal_reason(reason) {
                return Err(ProviderError::ContentRefused(format!(
                    "candidate blocked: {}",
                    reason
                )));
            }
        }

        let text = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::EmptyResponse(format!(
                "finish reason: {}",
                reason
            )));
        }

        let usage = parsed.usage_metadata;
        Ok(GenerationResponse {
            text,
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_token_count),
            completion_tokens: usage.as_ref().and_then(|u| u.candidates_token_count),
        })
    }

    async fn count_tokens(&self, model: &str, text: &str) -> Result<u64, ProviderError> {
        #[derive(Serialize)]
        struct CountTokensRequest {
            contents: Vec<Content>,
        }

        let body = CountTokensRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
                role: Some("user".to_string()),
            }],
        };

        let url = self.model_url(model, "countTokens");
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
            return Err(Self::status_to_error(status.as_u16(), text));
        }

        let parsed: CountTokensResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(parsed.total_tokens)
    }

    async fn output_token_limit(&self, model: &str) -> Result<u32, ProviderError> {
        let url = self.model_url(model, "");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::status_to_error(status.as_u16(), text));
        }

        let parsed: ModelInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        let limit = parsed.output_token_limit.ok_or_else(|| {
            ProviderError::ParseError("model info missing outputTokenLimit".to_string())
        })?;
        debug!("Model {} output token limit: {}", model, limit);
        Ok(limit)
    }
}
