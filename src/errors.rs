/*!
 * Error types for the chapterwise pipeline.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 * The retry/fallback chain pattern-matches on these kinds (transient vs.
 * rate limit vs. refusal vs. structural) instead of inspecting message text.
 */

use thiserror::Error;

/// Errors that can occur when talking to a generation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails (network, timeout)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting or quota exhaustion
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider refused the content on policy/safety grounds.
    /// Never retried on the same candidate.
    #[error("Content refused by provider: {0}")]
    ContentRefused(String),

    /// The provider returned a response with no usable text
    #[error("Empty response from provider: {0}")]
    EmptyResponse(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether another attempt against the same candidate can succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ContentRefused(_) | Self::AuthenticationError(_))
    }

    /// Whether this failure is a rate-limit signal that needs jittered
    /// exponential backoff rather than the plain transient delay
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Structural violations found when validating provider output
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The response contained no recognizable block markers at all
    #[error("no indexed blocks found in response")]
    MissingMarkers,

    /// Number of parsed blocks differs from the number of input blocks
    #[error("block count mismatch: expected {expected}, got {actual}")]
    BlockCountMismatch { expected: usize, actual: usize },

    /// A block marker carried the wrong index for its position
    #[error("block order violation at position {position}: marker index {marker}")]
    BlockOrderViolation { position: usize, marker: usize },

    /// An output block was empty after trimming
    #[error("empty output block at index {0}")]
    EmptyBlock(usize),

    /// Glossary delta payload was malformed beyond rescue
    #[error("malformed glossary delta: {0}")]
    MalformedGlossary(String),

    /// Summary text was missing a required section
    #[error("summary parse error: missing section {0}")]
    MissingSummarySection(&'static str),

    /// Character roster text had no recognizable header
    #[error("character roster parse error: {0}")]
    MalformedRoster(String),

    /// A translated block carried prompt-template labeling artifacts
    #[error("format contamination detected in translated block: {0}")]
    Contamination(String),
}

/// Errors from the persistent memory store. Any of these abort the
/// current chapter before the checkpoint advances.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying filesystem failure
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Persisted state failed to deserialize
    #[error("corrupt state file {path}: {detail}")]
    Corrupt { path: String, detail: String },

    /// Requested cached chapter output is not present
    #[error("no cached output for chapter {0}")]
    MissingCache(usize),
}

/// Terminal result of the resilient call layer
#[derive(Error, Debug)]
pub enum CallError {
    /// Every candidate in the chain was exhausted
    #[error("all {candidates} provider candidates exhausted: {detail}")]
    Exhausted { candidates: usize, detail: String },
}

/// Pipeline stage names used in failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStage {
    Classify,
    ExtractTerms,
    Translate,
    UpdateMemory,
    Edit,
    Rebuild,
    Commit,
}

impl std::fmt::Display for ChapterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Classify => "classify",
            Self::ExtractTerms => "extract-terms",
            Self::Translate => "translate",
            Self::UpdateMemory => "update-memory",
            Self::Edit => "edit",
            Self::Rebuild => "rebuild",
            Self::Commit => "commit",
        };
        write!(f, "{}", name)
    }
}

/// Failure of one chapter, tagged with the stage that failed.
/// The checkpoint is never advanced past a chapter that raised this.
#[derive(Error, Debug)]
#[error("chapter {chapter} failed at stage {stage}: {source}")]
pub struct ChapterFailure {
    /// Document-order chapter index
    pub chapter: usize,
    /// Pipeline stage that raised the failure
    pub stage: ChapterStage,
    #[source]
    pub source: PipelineError,
}

/// Terminal failure of a pipeline run
#[derive(Error, Debug)]
pub enum RunError {
    /// Persisted state could not be read before the chapter loop
    /// started; no chapter is at fault
    #[error("failed to load pipeline state: {0}")]
    State(#[from] StoreError),

    /// A chapter failed mid-pipeline
    #[error(transparent)]
    Chapter(#[from] ChapterFailure),
}

/// Errors that can occur while processing a chapter
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Terminal provider-chain failure
    #[error(transparent)]
    Call(#[from] CallError),

    /// Structural invariant violation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistent store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Document collaborator contract violation
    #[error("document error: {0}")]
    Document(String),
}
