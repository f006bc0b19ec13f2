// stt/whisper.rs
// Whisper.cpp Local STT Adapter with word timings

use super::{extract_audio, scratch_path, STTAdapter, STTError};
use crate::config::SttConfig;
use crate::transcript::{Segment, Transcript, Word};
use async_trait::async_trait;
use serde::Deserialize;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use tokio::process::Command;

#[derive(Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    result: Option<WhisperResult>,
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperResult {
    language: String,
}

#[derive(Deserialize)]
struct WhisperSegment {
    offsets: Offsets,
    text: String,
    #[serde(default)]
    tokens: Vec<WhisperToken>,
}

#[derive(Deserialize)]
struct WhisperToken {
    text: String,
    offsets: Offsets,
    #[serde(default = "full_probability")]
    p: f32,
}

#[derive(Deserialize, Clone, Copy)]
struct Offsets {
    from: u64,
    to: u64,
}

fn full_probability() -> f32 {
    1.0
}

fn ms(value: u64) -> f64 {
    value as f64 / 1000.0
}

pub struct WhisperAdapter {
    bin_path: PathBuf,
    model_path: PathBuf,
}

impl WhisperAdapter {
    pub fn new(bin_path: PathBuf, model_path: PathBuf) -> Self {
        Self { bin_path, model_path }
    }

    pub fn from_config(config: &SttConfig) -> Option<Self> {
        let bin_path = config.whisper_bin.clone().or_else(default_whisper_bin);
        let model_path = config.whisper_model.clone().or_else(default_whisper_model);

        let bin_path = match bin_path {
            Some(p) if p.exists() => p,
            Some(p) => {
                tracing::warn!("Whisper bin not found at {}", p.display());
                return None;
            }
            None => {
                tracing::warn!("Whisper bin not configured. Set WHISPER_CPP_BIN.");
                return None;
            }
        };

        let model_path = match model_path {
            Some(p) if p.exists() => p,
            Some(p) => {
                tracing::warn!("Whisper model not found at {}", p.display());
                return None;
            }
            None => {
                tracing::warn!("Whisper model not configured. Set WHISPER_MODEL.");
                return None;
            }
        };

        tracing::info!(
            "Whisper adapter initialized: bin={}, model={}",
            bin_path.display(),
            model_path.display()
        );

        Some(Self::new(bin_path, model_path))
    }

    async fn run_whisper(
        &self,
        wav_path: &Path,
        out_base: &Path,
        language: &str,
    ) -> Result<String, STTError> {
        let output = Command::new(&self.bin_path)
            .arg("--model")
            .arg(&self.model_path)
            .arg("--file")
            .arg(wav_path)
            .arg("--output-json-full")
            .arg("--output-file")
            .arg(out_base)
            .arg("--language")
            .arg(language)
            .output()
            .await
            .map_err(|e| STTError::ProviderError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(STTError::ProviderError(format!(
                "Whisper failed: {}",
                stderr.trim()
            )));
        }

        fs::read_to_string(out_base.with_extension("json"))
            .map_err(|_| STTError::ProviderError("Whisper produced no output".to_string()))
    }
}

/// Convert whisper.cpp full JSON output into a transcript. Sub-word tokens are
/// merged into words; a token starting with whitespace opens a new word.
fn parse_whisper_json(raw: &str, requested_language: Option<&str>) -> Result<Transcript, STTError> {
    let output: WhisperOutput = serde_json::from_str(raw)
        .map_err(|e| STTError::ProviderError(format!("Whisper JSON: {}", e)))?;

    let language = output
        .result
        .map(|r| r.language)
        .or_else(|| requested_language.map(str::to_string))
        .unwrap_or_else(|| "en".to_string());

    let mut segments = Vec::new();
    for segment in output.transcription {
        let start = ms(segment.offsets.from);
        let end = ms(segment.offsets.to);
        if end <= start || segment.text.trim().is_empty() {
            continue;
        }

        let mut words: Vec<Word> = Vec::new();
        for token in segment.tokens {
            if token.text.starts_with("[_") || token.text.trim().is_empty() {
                continue;
            }
            let opens_word = token.text.starts_with(char::is_whitespace) || words.is_empty();
            if opens_word {
                words.push(Word {
                    text: token.text.trim().to_string(),
                    start: ms(token.offsets.from),
                    end: ms(token.offsets.to),
                    confidence: token.p,
                });
            } else if let Some(word) = words.last_mut() {
                word.text.push_str(token.text.trim());
                word.end = word.end.max(ms(token.offsets.to));
                word.confidence = word.confidence.min(token.p);
            }
        }
        words.retain(|w| w.end > w.start);

        segments.push(Segment::new(start, end, segment.text).with_words(words));
    }

    Ok(Transcript::new(language, segments)?)
}

#[async_trait]
impl STTAdapter for WhisperAdapter {
    async fn transcribe(&self, media: &Path, language: Option<&str>) -> Result<Transcript, STTError> {
        let input_path = scratch_path("whisper_input", "wav")?;
        let output_base = scratch_path("whisper_out", "out")?;

        let result = async {
            extract_audio(media, &input_path).await?;
            self.run_whisper(&input_path, &output_base, language.unwrap_or("auto"))
                .await
        }
        .await;

        // Cleanup temp files
        let _ = fs::remove_file(&input_path);
        let _ = fs::remove_file(output_base.with_extension("json"));

        let transcript = parse_whisper_json(&result?, language)?.with_source(media);
        tracing::info!(
            "Whisper STT: {} segments, {:.1}s, language={}",
            transcript.segments.len(),
            transcript.duration,
            transcript.language
        );
        Ok(transcript)
    }

    fn name(&self) -> &str {
        "Whisper.cpp"
    }
}

fn default_whisper_bin() -> Option<PathBuf> {
    let candidates = [
        "bin/whisper-cli.exe",
        "bin/whisper-cli",
        "bin/main.exe",
        "bin/main",
    ];

    candidates.into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn default_whisper_model() -> Option<PathBuf> {
    let candidates = [
        "models/ggml-base.bin",
        "models/ggml-small.bin",
        "models/ggml-medium.bin",
    ];

    if let Some(path) = candidates.into_iter().map(PathBuf::from).find(|p| p.exists()) {
        return Some(path);
    }

    // Fallback: any ggml-*.bin in models/
    fs::read_dir("models").ok()?.flatten().map(|e| e.path()).find(|path| {
        path.extension() == Some(OsStr::new("bin"))
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("ggml-"))
    })
}
