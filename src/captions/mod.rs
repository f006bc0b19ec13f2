// captions/mod.rs — Caption words for a clip and their display grouping

mod grouper;
mod style;

pub use grouper::{group_words, WordGrouper};
pub use style::{CaptionStyle, Rgb, StyleVariant};

use crate::analysis::RefinedMoment;
use crate::transcript::{Transcript, Word};
use serde::{Deserialize, Serialize};

/// Consecutive words shown together, in clip-relative seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordGroup {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub word_count: usize,
}

/// Words spoken in `lookup_start..lookup_end` of the source, shifted so that
/// `clip_start` is zero and cut to `0..clip_duration`. Words left with no
/// duration are dropped.
pub fn caption_words_for_range(
    transcript: &Transcript,
    lookup_start: f64,
    lookup_end: f64,
    clip_start: f64,
    clip_duration: f64,
) -> Vec<Word> {
    transcript
        .words_in_range(lookup_start, lookup_end)
        .into_iter()
        .filter_map(|word| {
            let start = (word.start - clip_start).max(0.0);
            let end = (word.end - clip_start).min(clip_duration);
            (end > start).then(|| Word {
                text: word.text.trim().to_string(),
                start,
                end,
                confidence: word.confidence,
            })
        })
        .filter(|word| !word.text.is_empty())
        .collect()
}

/// Caption words for a refined clip, looked up from the range that was scored
pub fn caption_words_for_clip(transcript: &Transcript, moment: &RefinedMoment) -> Vec<Word> {
    caption_words_for_range(
        transcript,
        moment.original_start,
        moment.original_end,
        moment.start,
        moment.duration,
    )
}
