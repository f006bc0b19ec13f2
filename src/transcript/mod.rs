// transcript/mod.rs — Spoken-word timeline shared by every pipeline stage

mod cache;

pub use cache::TranscriptCache;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A single timed word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(alias = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
    /// Recognizer confidence (0.0 - 1.0)
    #[serde(alias = "probability", default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: 1.0,
        }
    }
}

/// A recognizer segment: usually one sentence or clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub id: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            start,
            end,
            text: text.into(),
            words: Vec::new(),
        }
    }

    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end > start
    }
}

/// Transcription of a whole source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default, alias = "video_path", skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub language: String,
    pub duration: f64,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub full_text: String,
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Segment {index} has invalid timing ({start:.2}s - {end:.2}s)")]
    InvalidTiming { index: usize, start: f64, end: f64 },

    #[error("Segment {index} starts before the previous one")]
    OutOfOrder { index: usize },

    #[error("Transcript cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cached transcript: {0}")]
    Json(#[from] serde_json::Error),
}

impl Transcript {
    /// Build a transcript from ordered segments. Duration is the end of the last segment.
    pub fn new(language: impl Into<String>, mut segments: Vec<Segment>) -> Result<Self, TranscriptError> {
        let mut previous_start = 0.0;
        for (index, segment) in segments.iter_mut().enumerate() {
            if segment.start < 0.0 || segment.end <= segment.start {
                return Err(TranscriptError::InvalidTiming {
                    index,
                    start: segment.start,
                    end: segment.end,
                });
            }
            if segment.start < previous_start {
                return Err(TranscriptError::OutOfOrder { index });
            }
            previous_start = segment.start;
            segment.id = index;
            segment.text = segment.text.trim().to_string();
        }

        let duration = segments.last().map(|s| s.end).unwrap_or(0.0);
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            source: None,
            language: language.into(),
            duration,
            segments,
            full_text,
        })
    }

    /// Re-run construction checks on a transcript that did not come through
    /// `new`, e.g. one read back from disk
    pub fn revalidated(self) -> Result<Self, TranscriptError> {
        let mut transcript = Self::new(self.language, self.segments)?;
        transcript.source = self.source;
        Ok(transcript)
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments that overlap `start..end` (touching endpoints do not count)
    pub fn segments_in_range(&self, start: f64, end: f64) -> Vec<&Segment> {
        self.segments
            .iter()
            .filter(|segment| segment.overlaps(start, end))
            .collect()
    }

    /// Index range of segments overlapping `start..end`, if any.
    /// Segments are time-ordered, so overlapping ones are contiguous.
    pub fn segment_window(&self, start: f64, end: f64) -> Option<(usize, usize)> {
        let first = self.segments.iter().position(|s| s.overlaps(start, end))?;
        let last = self.segments.iter().rposition(|s| s.overlaps(start, end))?;
        Some((first, last))
    }

    /// Words that overlap `start..end`, in order
    pub fn words_in_range(&self, start: f64, end: f64) -> Vec<&Word> {
        self.segments_in_range(start, end)
            .into_iter()
            .flat_map(|segment| segment.words.iter())
            .filter(|word| word.start < end && word.end > start)
            .collect()
    }

    /// The word spoken at `time`; falls back to the whole segment when it has no word timings
    pub fn word_at(&self, time: f64) -> Option<Word> {
        let segment = self
            .segments
            .iter()
            .find(|s| s.start <= time && time <= s.end)?;

        segment
            .words
            .iter()
            .find(|w| w.start <= time && time <= w.end)
            .cloned()
            .or_else(|| Some(Word::new(segment.text.clone(), segment.start, segment.end)))
    }
}
