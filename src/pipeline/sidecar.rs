// pipeline/sidecar.rs — Per-clip metadata stored next to the clip file

use crate::analysis::RefinedMoment;
use crate::captions::caption_words_for_range;
use crate::transcript::{Transcript, Word};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub source: String,
    pub clip_file: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub score: f64,
    pub reason: String,
    #[serde(default)]
    pub preview_text: String,
    pub original_start: f64,
    pub original_end: f64,
    pub created_at: String,
    #[serde(default)]
    pub run_id: Option<String>,
}

/// Where caption words are looked up and how they map onto the clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionRange {
    pub lookup_start: f64,
    pub lookup_end: f64,
    pub clip_start: f64,
    pub clip_duration: f64,
}

impl ClipMetadata {
    pub fn from_moment(source: &Path, clip: &Path, moment: &RefinedMoment) -> Self {
        Self {
            source: source.to_string_lossy().into_owned(),
            clip_file: clip
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            start: moment.start,
            end: moment.end,
            duration: moment.duration,
            score: moment.score,
            reason: moment.reason.clone(),
            preview_text: moment.preview_text.clone(),
            original_start: moment.original_start,
            original_end: moment.original_end,
            created_at: Utc::now().to_rfc3339(),
            run_id: None,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// `<clip stem>.json` beside the clip
    pub fn path_for(clip: &Path) -> PathBuf {
        clip.with_extension("json")
    }

    pub fn write(&self, clip: &Path) -> std::io::Result<PathBuf> {
        let path = Self::path_for(clip);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    pub fn read(clip: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(Self::path_for(clip))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn caption_range(&self) -> CaptionRange {
        CaptionRange {
            lookup_start: self.original_start,
            lookup_end: self.original_end,
            clip_start: self.start,
            clip_duration: self.duration,
        }
    }

    /// Caption words for this clip, without re-running analysis
    pub fn caption_words(&self, transcript: &Transcript) -> Vec<Word> {
        let range = self.caption_range();
        caption_words_for_range(
            transcript,
            range.lookup_start,
            range.lookup_end,
            range.clip_start,
            range.clip_duration,
        )
    }
}
