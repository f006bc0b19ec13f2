// fetch/mod.rs — Source video acquisition: remote download or local file

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov"];
const MAX_FILENAME_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported video format: {0}")]
    UnsupportedFormat(String),

    #[error("Video too long: {duration:.0} seconds. Maximum allowed: {max:.0} seconds")]
    TooLong { duration: f64, max: f64 },

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata: {0}")]
    Json(#[from] serde_json::Error),
}

/// A video ready for processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub filepath: PathBuf,
    pub title: String,
    /// Seconds; 0.0 when unknown
    pub duration: f64,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
}

impl VideoSource {
    /// A video already on disk. Must exist and have a supported extension.
    pub fn local(path: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let filepath = path.into();
        if !filepath.is_file() {
            return Err(FetchError::NotFound(filepath));
        }

        let extension = filepath
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(FetchError::UnsupportedFormat(filepath.display().to_string()));
        }

        let title = filepath
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video")
            .to_string();

        Ok(Self {
            filepath,
            title,
            duration: 0.0,
            video_id: None,
            url: None,
            uploader: None,
            upload_date: None,
            view_count: None,
        })
    }

    /// Write the metadata next to the video as `<stem>.json`
    pub fn write_sidecar(&self) -> Result<PathBuf, FetchError> {
        let path = self.filepath.with_extension("json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Download `url` at `quality` ("720p", ...)
    async fn fetch(&self, url: &str, quality: &str) -> Result<VideoSource, FetchError>;
}

fn video_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?:v=|/)([0-9A-Za-z_-]{11})",
            r"(?:embed/)([0-9A-Za-z_-]{11})",
            r"(?:watch\?v=)([0-9A-Za-z_-]{11})",
            r"youtu\.be/([0-9A-Za-z_-]{11})",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// The 11-character YouTube id in a watch, embed, short or youtu.be URL
pub fn extract_video_id(url: &str) -> Option<String> {
    video_id_patterns().iter().find_map(|re| {
        re.captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Replace characters that are invalid in file names, trim dots and spaces,
/// cap at 200 characters
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if "<>:\"/\\|?*".contains(c) { '_' } else { c })
        .collect();
    replaced
        .trim_matches(|c| c == '.' || c == ' ')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect()
}

pub(crate) fn is_url(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Local path or URL, as given by the caller
pub fn is_remote(input: &str) -> bool {
    is_url(input) && !Path::new(input).exists()
}
