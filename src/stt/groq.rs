// stt/groq.rs
// Groq Whisper STT Adapter (verbose JSON with word timestamps)

use super::{extract_audio, scratch_path, STTAdapter, STTError};
use crate::transcript::{Segment, Transcript, Word};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const MODEL: &str = "whisper-large-v3";
const MAX_UPLOAD_MB: u64 = 25;
const TIMEOUT_SECS: u64 = 300;

#[derive(Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
    #[serde(default)]
    words: Vec<VerboseWord>,
}

#[derive(Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Deserialize)]
struct VerboseWord {
    word: String,
    start: f64,
    end: f64,
}

pub struct GroqAdapter {
    api_key: String,
    client: reqwest::Client,
}

impl GroqAdapter {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        tracing::info!("Groq adapter initialized");

        Self { api_key, client }
    }

    async fn upload(&self, audio: Vec<u8>, language: Option<&str>) -> Result<String, STTError> {
        let file_part = multipart::Part::bytes(audio)
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| STTError::ProviderError(e.to_string()))?;

        let mut form = multipart::Form::new()
            .text("model", MODEL)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .text("timestamp_granularities[]", "segment")
            .part("file", file_part);
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    STTError::TimeoutError
                } else {
                    STTError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| STTError::NetworkError(e.to_string()))
        } else if status.as_u16() == 401 {
            Err(STTError::AuthenticationError)
        } else if status.as_u16() == 429 {
            Err(STTError::RateLimitError)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(STTError::ProviderError(format!(
                "HTTP {}: {}",
                status, error_text
            )))
        }
    }
}

/// Language names ("english") map to their ISO code; codes pass through.
fn language_code(raw: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "english" => "en".to_string(),
        "french" => "fr".to_string(),
        other => other.to_string(),
    }
}

/// Attach each word to the segment containing its midpoint
fn parse_verbose_json(raw: &str, requested_language: Option<&str>) -> Result<Transcript, STTError> {
    let body: VerboseTranscription = serde_json::from_str(raw)
        .map_err(|e| STTError::ProviderError(format!("Groq JSON: {}", e)))?;

    let language = body
        .language
        .as_deref()
        .or(requested_language)
        .map(language_code)
        .unwrap_or_else(|| "en".to_string());

    let mut words = body.words.into_iter().filter(|w| w.end > w.start).peekable();
    let mut segments = Vec::new();
    for segment in body.segments {
        if segment.end <= segment.start {
            continue;
        }
        let mut segment_words = Vec::new();
        while let Some(word) = words.peek() {
            let mid = (word.start + word.end) / 2.0;
            if mid > segment.end {
                break;
            }
            if mid >= segment.start {
                segment_words.push(Word::new(word.word.trim(), word.start, word.end));
            }
            words.next();
        }
        segments.push(Segment::new(segment.start, segment.end, segment.text).with_words(segment_words));
    }

    Ok(Transcript::new(language, segments)?)
}

#[async_trait]
impl STTAdapter for GroqAdapter {
    async fn transcribe(&self, media: &Path, language: Option<&str>) -> Result<Transcript, STTError> {
        let audio_path = scratch_path("groq_input", "mp3")?;
        let audio = async {
            extract_audio(media, &audio_path).await?;
            tokio::fs::read(&audio_path)
                .await
                .map_err(|e| STTError::ProviderError(e.to_string()))
        }
        .await;
        let _ = std::fs::remove_file(&audio_path);
        let audio = audio?;

        let size_mb = audio.len() as f64 / (1024.0 * 1024.0);
        if size_mb > MAX_UPLOAD_MB as f64 {
            tracing::warn!("Audio too large for Groq: {:.1} MB", size_mb);
            return Err(STTError::FileTooLarge {
                size_mb,
                limit_mb: MAX_UPLOAD_MB,
            });
        }

        tracing::info!("Groq STT: uploading {:.1} MB of audio...", size_mb);
        let raw = self.upload(audio, language).await?;
        let transcript = parse_verbose_json(&raw, language)?.with_source(media);
        tracing::info!("Groq STT: {} segments", transcript.segments.len());
        Ok(transcript)
    }

    fn name(&self) -> &str {
        "Groq Whisper"
    }
}
