use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_QUALITY: &str = "720p";
pub const DEFAULT_CAPTION_STYLE: &str = "TikTok Style";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:latest";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";

const SUPPORTED_QUALITIES: &[&str] = &["360p", "480p", "720p", "1080p"];
const MAX_WORKERS: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read or write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every tunable of a pipeline run. Missing fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub analysis: AnalysisConfig,
    pub refinement: RefinementConfig,
    pub captions: CaptionConfig,
    pub backend: BackendConfig,
    pub media: MediaConfig,
    pub stt: SttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of a scoring window in seconds
    pub chunk_duration: f64,
    /// Nominal "viral" score; selection keeps anything within one point of it (floored at 3.0)
    pub viral_threshold: f64,
    /// How many chunks to offer when nothing clears the threshold
    pub fallback_count: usize,
    pub fallback_score: f64,
    /// Upper bound on clips produced per video
    pub max_clips: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_duration: 45.0,
            viral_threshold: 6.0,
            fallback_count: 3,
            fallback_score: 5.0,
            max_clips: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    pub min_clip_length: f64,
    pub max_clip_length: f64,
    /// Segments this far outside the moment are considered for boundaries
    pub search_margin: f64,
    /// A boundary may not move further than this from the original edge
    pub max_boundary_shift: f64,
    /// Silence that counts as a sentence break before a capitalized segment
    pub sentence_pause: f64,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            min_clip_length: 15.0,
            max_clip_length: 60.0,
            search_margin: 5.0,
            max_boundary_shift: 10.0,
            sentence_pause: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub enabled: bool,
    pub style: String,
    /// Overrides the style preset's words-per-caption when set
    pub max_words: Option<usize>,
    pub short_word_gap: f64,
    pub join_gap: f64,
    pub max_chars: usize,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style: DEFAULT_CAPTION_STYLE.to_string(),
            max_words: None,
            short_word_gap: 0.3,
            join_gap: 0.2,
            max_chars: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    OpenAI,
    Anthropic,
}

impl BackendKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ollama" | "local" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAI),
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub provider: BackendKind,
    pub ollama_url: String,
    pub ollama_model: String,
    pub openai_model: String,
    pub anthropic_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u8,
    /// API keys only ever come from the environment
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    #[serde(skip)]
    pub anthropic_api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendKind::Ollama,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            temperature: 0.0,
            timeout_secs: 60,
            max_retries: 1,
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    /// 9:16 centre crop scaled to 1080x1920
    Vertical,
    Original,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub aspect: AspectMode,
    pub quality: String,
    pub max_video_duration: f64,
    pub workers: usize,
    pub downloads_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub transcripts_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            aspect: AspectMode::Vertical,
            quality: DEFAULT_QUALITY.to_string(),
            max_video_duration: 3600.0,
            workers: 4,
            downloads_dir: PathBuf::from("downloads"),
            outputs_dir: PathBuf::from("outputs"),
            transcripts_dir: PathBuf::from("transcripts"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// `None` lets the recognizer detect the language
    pub language: Option<String>,
    pub whisper_bin: Option<PathBuf>,
    pub whisper_model: Option<PathBuf>,
    pub force_transcribe: bool,
    #[serde(skip)]
    pub groq_api_key: Option<String>,
}

impl PipelineConfig {
    /// Load the config at `path`, writing defaults when it does not exist.
    /// An unparseable file is kept as `*.json.bak` and replaced with defaults.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path)?;
        match serde_json::from_str::<PipelineConfig>(&raw) {
            Ok(mut config) => {
                config.normalize();
                Ok(config)
            }
            Err(e) => {
                tracing::warn!("Config at {} is invalid ({}), resetting to defaults", path.display(), e);
                let backup = path.with_extension("json.bak");
                let _ = fs::copy(path, backup);
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Overlay secrets and a few switches from the process environment (and `.env`).
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.backend.openai_api_key = Some(key);
        }
        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.backend.anthropic_api_key = Some(key);
        }
        if let Some(key) = non_empty("GROQ_API_KEY").filter(|k| k.starts_with("gsk_")) {
            self.stt.groq_api_key = Some(key);
        }
        if let Some(host) = non_empty("OLLAMA_HOST") {
            self.backend.ollama_url = host;
        }
        if let Some(bin) = non_empty("WHISPER_CPP_BIN") {
            self.stt.whisper_bin = Some(PathBuf::from(bin));
        }
        if let Some(model) = non_empty("WHISPER_MODEL") {
            self.stt.whisper_model = Some(PathBuf::from(model));
        }
        if let Some(raw) = non_empty("VIRAL_CLIPS_PROVIDER") {
            match BackendKind::parse(&raw) {
                Some(kind) => self.backend.provider = kind,
                None => tracing::warn!("Unknown VIRAL_CLIPS_PROVIDER '{}', keeping {:?}", raw, self.backend.provider),
            }
        }
    }

    /// Pull out-of-range values back to something the pipeline can run with
    pub fn normalize(&mut self) {
        let defaults = Self::default();

        let analysis = &mut self.analysis;
        if !(analysis.chunk_duration > 0.0) {
            analysis.chunk_duration = defaults.analysis.chunk_duration;
        }
        analysis.viral_threshold = clamp_or(analysis.viral_threshold, 0.0, 10.0, defaults.analysis.viral_threshold);
        analysis.fallback_score = clamp_or(analysis.fallback_score, 0.0, 10.0, defaults.analysis.fallback_score);
        analysis.max_clips = analysis.max_clips.max(1);

        let refinement = &mut self.refinement;
        if !(refinement.min_clip_length > 0.0) || !(refinement.max_clip_length >= refinement.min_clip_length) {
            refinement.min_clip_length = defaults.refinement.min_clip_length;
            refinement.max_clip_length = defaults.refinement.max_clip_length;
        }
        refinement.search_margin = non_negative_or(refinement.search_margin, defaults.refinement.search_margin);
        refinement.max_boundary_shift =
            non_negative_or(refinement.max_boundary_shift, defaults.refinement.max_boundary_shift);
        refinement.sentence_pause = non_negative_or(refinement.sentence_pause, defaults.refinement.sentence_pause);

        let captions = &mut self.captions;
        if captions.style.trim().is_empty() {
            captions.style = DEFAULT_CAPTION_STYLE.to_string();
        }
        captions.max_words = captions.max_words.map(|n| n.max(1));
        captions.short_word_gap = non_negative_or(captions.short_word_gap, defaults.captions.short_word_gap);
        captions.join_gap = non_negative_or(captions.join_gap, defaults.captions.join_gap);
        if captions.max_chars == 0 {
            captions.max_chars = defaults.captions.max_chars;
        }

        self.media.quality = normalize_quality(&self.media.quality);
        self.media.workers = self.media.workers.clamp(1, MAX_WORKERS);
        if !(self.media.max_video_duration > 0.0) {
            self.media.max_video_duration = defaults.media.max_video_duration;
        }

        self.stt.language = self
            .stt
            .language
            .take()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty() && l != "auto");
    }
}

pub fn normalize_quality(input: &str) -> String {
    let trimmed = input.trim().to_lowercase();
    if SUPPORTED_QUALITIES.contains(&trimmed.as_str()) {
        trimmed
    } else {
        DEFAULT_QUALITY.to_string()
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

fn non_negative_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}
