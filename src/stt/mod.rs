// stt/mod.rs
// STT Module - Speech-to-Text Adapters producing word-timed transcripts

mod groq;
mod types;
mod whisper;

pub use groq::GroqAdapter;
pub use types::STTError;
pub use whisper::WhisperAdapter;

use crate::transcript::Transcript;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::process::Command;

/// Unified STT Adapter trait
#[async_trait]
pub trait STTAdapter: Send + Sync {
    /// Transcribe the speech in a media file. `language` is an ISO code; `None` auto-detects.
    async fn transcribe(&self, media: &Path, language: Option<&str>) -> Result<Transcript, STTError>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Unique scratch path in the system temp dir
pub(crate) fn scratch_path(prefix: &str, extension: &str) -> Result<PathBuf, STTError> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| STTError::ProviderError(e.to_string()))?
        .as_nanos();
    let pid = std::process::id();
    Ok(std::env::temp_dir().join(format!("{}_{}_{}.{}", prefix, pid, ts, extension)))
}

/// Extract a 16 kHz mono audio track with ffmpeg. The codec follows the output extension.
pub(crate) async fn extract_audio(media: &Path, output: &Path) -> Result<(), STTError> {
    if !media.exists() {
        return Err(STTError::InvalidMedia(format!("{} not found", media.display())));
    }

    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(media)
        .args(["-vn", "-ac", "1", "-ar", "16000"])
        .arg(output)
        .output()
        .await
        .map_err(|e| STTError::ProviderError(format!("ffmpeg: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
        return Err(STTError::InvalidMedia(format!(
            "audio extraction failed: {}",
            tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
        )));
    }

    Ok(())
}
