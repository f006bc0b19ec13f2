// analysis/types.rs — Core types for moment analysis

use serde::{Deserialize, Serialize};

/// Longest rationale kept from a model response
pub const MAX_REASON_CHARS: usize = 200;
/// Longest transcript excerpt attached to a moment
pub const PREVIEW_CHARS: usize = 200;

/// Consecutive transcript segments scored as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Indices into `Transcript::segments`
    pub source_segments: Vec<usize>,
}

impl Chunk {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Score of one chunk as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkScore {
    pub score: f64,
    pub reason: String,
}

/// A ranked candidate clip, before boundary refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMoment {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub score: f64,
    pub reason: String,
    pub preview_text: String,
}

impl ScoredMoment {
    pub fn from_chunk(chunk: &Chunk, score: f64, reason: impl Into<String>) -> Self {
        Self {
            start: chunk.start,
            end: chunk.end,
            duration: chunk.duration(),
            score: score.clamp(0.0, 10.0),
            reason: reason.into(),
            preview_text: preview(&chunk.text),
        }
    }
}

/// A moment whose range was aligned to sentence boundaries and clip-length bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedMoment {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub score: f64,
    pub reason: String,
    pub preview_text: String,
    /// Range that was scored; captions are looked up from it
    pub original_start: f64,
    pub original_end: f64,
    /// Text of every segment overlapping the final range
    pub context: String,
}

impl RefinedMoment {
    pub fn new(moment: &ScoredMoment, start: f64, end: f64, context: String) -> Self {
        Self {
            start,
            end,
            duration: end - start,
            score: moment.score,
            reason: moment.reason.clone(),
            preview_text: moment.preview_text.clone(),
            original_start: moment.start,
            original_end: moment.end,
            context,
        }
    }
}

/// LLM adapter errors
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid response from LLM")]
    InvalidResponse,

    #[error("Timeout")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Backend temporarily disabled after repeated failures")]
    CircuitOpen,
}

impl LLMError {
    /// Returns true if this error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LLMError::NetworkError(_) | LLMError::Timeout | LLMError::RateLimited
        )
    }

    pub(crate) fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LLMError::Timeout
        } else {
            LLMError::NetworkError(format!("{}: {}", provider, err))
        }
    }
}

/// First `PREVIEW_CHARS` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str) -> String {
    truncate_chars(text, PREVIEW_CHARS, "...")
}

pub(crate) fn truncate_chars(text: &str, max: usize, suffix: &str) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], suffix),
        None => text.to_string(),
    }
}
