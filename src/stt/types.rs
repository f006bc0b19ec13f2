// stt/types.rs
// STT Error Definitions

use crate::transcript::TranscriptError;
use thiserror::Error;

/// STT Error types with retry classification
#[derive(Debug, Error)]
pub enum STTError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    TimeoutError,

    #[error("Audio file too large ({size_mb:.1} MB > {limit_mb} MB)")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Authentication failed")]
    AuthenticationError,

    #[error("Rate limit exceeded")]
    RateLimitError,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Malformed transcript: {0}")]
    InvalidTranscript(#[from] TranscriptError),
}

impl STTError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            STTError::NetworkError(_) | STTError::TimeoutError | STTError::RateLimitError
        )
    }
}
