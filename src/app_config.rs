use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. All chunking and retry
/// tuning values are configuration with sensible defaults, not constants.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language name or code
    pub source_language: String,

    /// Target language name or code
    pub target_language: String,

    /// Translation config (provider chain, temperature)
    pub translation: TranslationConfig,

    /// Token-budget chunking config
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Intra-chapter rolling context config
    #[serde(default)]
    pub context: ContextConfig,

    /// Retry/backoff config for provider calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Editor pass config
    #[serde(default)]
    pub editor: EditorConfig,

    /// Directory for persistent pipeline state (glossary, summary,
    /// characters, checkpoint, chapter cache). Defaults to
    /// `<data_dir>/chapterwise/state` when unset.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Generative Language API
    #[default]
    Gemini,
    // @provider: OpenAI-compatible chat completions
    OpenAI,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Primary model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Secondary model tried after the primary is exhausted
    #[serde(default = "String::new")]
    pub fallback_model: String,

    // @field: API key (or the name of an environment variable holding it)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL override
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Request timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl ProviderConfig {
    /// Create a default config for the given provider type
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Gemini => Self {
                provider_type: "gemini".to_string(),
                model: "gemini-2.5-flash-lite".to_string(),
                fallback_model: "gemini-3-flash-preview".to_string(),
                api_key: String::new(),
                endpoint: String::new(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                fallback_model: String::new(),
                api_key: String::new(),
                endpoint: String::new(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Translation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Primary provider for translation requests
    pub provider: TranslationProvider,

    /// Generation temperature for translation requests
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider configurations, one per provider type
    pub available_providers: Vec<ProviderConfig>,
}

fn default_temperature() -> f32 {
    0.0
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            temperature: default_temperature(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Gemini),
                ProviderConfig::new(TranslationProvider::OpenAI),
            ],
        }
    }
}

/// Token-budget chunking configuration.
///
/// The expansion ratio and safety margin are empirical tuning values for
/// the source/target language pair, exposed here rather than hardcoded.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Expected source-to-target length expansion ratio
    #[serde(default = "default_expansion_ratio")]
    pub expansion_ratio: f64,

    /// Fraction of the nominal output-token ceiling actually used
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,

    /// Average characters per token for the cheap local estimate
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,

    /// Fraction of the safe ceiling past which the exact provider-side
    /// token count replaces the local estimate
    #[serde(default = "default_exact_count_threshold")]
    pub exact_count_threshold: f64,

    /// Hard maximum number of blocks per request
    #[serde(default = "default_max_blocks_per_request")]
    pub max_blocks_per_request: usize,

    /// Ceiling used when the provider's output-token limit lookup fails
    #[serde(default = "default_fallback_output_token_limit")]
    pub fallback_output_token_limit: u32,
}

fn default_expansion_ratio() -> f64 {
    1.8
}

fn default_safety_factor() -> f64 {
    0.9
}

fn default_chars_per_token() -> f64 {
    3.5
}

fn default_exact_count_threshold() -> f64 {
    0.8
}

fn default_max_blocks_per_request() -> usize {
    40
}

fn default_fallback_output_token_limit() -> u32 {
    8192
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            expansion_ratio: default_expansion_ratio(),
            safety_factor: default_safety_factor(),
            chars_per_token: default_chars_per_token(),
            exact_count_threshold: default_exact_count_threshold(),
            max_blocks_per_request: default_max_blocks_per_request(),
            fallback_output_token_limit: default_fallback_output_token_limit(),
        }
    }
}

/// Intra-chapter rolling context configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContextConfig {
    /// Number of most recent translated chunks kept as rolling context
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,

    /// Maximum number of context blocks included in one request
    #[serde(default = "default_max_context_blocks")]
    pub max_context_blocks: usize,
}

fn default_max_context_chunks() -> usize {
    2
}

fn default_max_context_blocks() -> usize {
    16
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: default_max_context_chunks(),
            max_context_blocks: default_max_context_blocks(),
        }
    }
}

/// Retry/backoff configuration for provider calls
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    /// Attempts per (provider, model, mode) candidate
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for linear backoff on transient failures, milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Base delay for exponential backoff on rate-limit signals, milliseconds
    #[serde(default = "default_rate_limit_base_delay_ms")]
    pub rate_limit_base_delay_ms: u64,

    /// Upper bound for the random jitter added to rate-limit backoff, milliseconds
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_rate_limit_base_delay_ms() -> u64 {
    5000
}

fn default_max_jitter_ms() -> u64 {
    3000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            rate_limit_base_delay_ms: default_rate_limit_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

/// Editor pass configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditorConfig {
    /// Whether the editor pass runs at all
    #[serde(default = "default_editor_enabled")]
    pub enabled: bool,

    /// Bound on continuation rounds when responses come back truncated
    #[serde(default = "default_max_outer_retries")]
    pub max_outer_retries: u32,

    /// Generation temperature for editing requests
    #[serde(default = "default_editor_temperature")]
    pub temperature: f32,
}

fn default_editor_enabled() -> bool {
    true
}

fn default_max_outer_retries() -> u32 {
    10
}

fn default_editor_temperature() -> f32 {
    0.3
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            enabled: default_editor_enabled(),
            max_outer_retries: default_max_outer_retries(),
            temperature: default_editor_temperature(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "English".to_string(),
            target_language: "Vietnamese".to_string(),
            translation: TranslationConfig::default(),
            chunking: ChunkingConfig::default(),
            context: ContextConfig::default(),
            retry: RetryConfig::default(),
            editor: EditorConfig::default(),
            state_dir: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write an example configuration file with defaults
    pub fn write_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let config = Config::default();
        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write example config to {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language cannot be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language cannot be empty"));
        }
        if self.translation.available_providers.is_empty() {
            return Err(anyhow!("At least one provider must be configured"));
        }
        if self.get_active_provider_config().is_none() {
            return Err(anyhow!(
                "No provider config found for active provider {}",
                self.translation.provider
            ));
        }
        for provider in &self.translation.available_providers {
            if provider.model.trim().is_empty() {
                return Err(anyhow!(
                    "Provider {} has no model configured",
                    provider.provider_type
                ));
            }
            if !provider.endpoint.is_empty() {
                url::Url::parse(&provider.endpoint).with_context(|| {
                    format!(
                        "Invalid endpoint URL for provider {}: {}",
                        provider.provider_type, provider.endpoint
                    )
                })?;
            }
        }
        if self.chunking.expansion_ratio <= 0.0 {
            return Err(anyhow!("Expansion ratio must be positive"));
        }
        if !(0.0 < self.chunking.safety_factor && self.chunking.safety_factor <= 1.0) {
            return Err(anyhow!("Safety factor must be in (0, 1]"));
        }
        if self.chunking.chars_per_token <= 0.0 {
            return Err(anyhow!("Chars per token must be positive"));
        }
        if self.chunking.max_blocks_per_request == 0 {
            return Err(anyhow!("Max blocks per request must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("Retry attempts must be at least 1"));
        }
        Ok(())
    }

    /// Get the configuration of the active translation provider
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let wanted = self.translation.provider.to_lowercase_string();
        self.translation
            .available_providers
            .iter()
            .find(|p| p.provider_type == wanted)
    }

    /// Get the configuration of a specific provider type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let wanted = provider_type.to_lowercase_string();
        self.translation
            .available_providers
            .iter()
            .find(|p| p.provider_type == wanted)
    }

    /// Resolve the state directory, falling back to the platform data dir
    pub fn resolve_state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chapterwise")
            .join("state")
    }

    /// Resolve an API key value: a literal key, or the contents of the
    /// environment variable it names
    pub fn resolve_api_key(raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        if let Ok(from_env) = std::env::var(raw) {
            if !from_env.is_empty() {
                return from_env;
            }
        }
        raw.to_string()
    }
}
