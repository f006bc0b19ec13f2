// media/mod.rs — Clip cutting, caption burn-in and probing via external tools

mod ffmpeg;
mod probe;
mod subtitles;

pub use ffmpeg::{vertical_crop, FfmpegCutter, VERTICAL_HEIGHT, VERTICAL_WIDTH};
pub use probe::{FfprobeProbe, VideoInfo};
pub use subtitles::{render_ass, FfmpegCaptionRenderer};

use crate::analysis::RefinedMoment;
use crate::captions::WordGroup;
use crate::config::AspectMode;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Video file not found: {0}")]
    NotFound(PathBuf),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: &'static str, message: String },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable media info: {0}")]
    Probe(String),

    #[error("Output file was not created: {0}")]
    NoOutput(PathBuf),

    #[error("Invalid clip range {start:.2}s - {end:.2}s")]
    InvalidRange { start: f64, end: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, source: &Path) -> Result<VideoInfo, MediaError>;
}

#[async_trait]
pub trait ClipCutter: Send + Sync {
    /// Cut `start..end` of `source` into `<output_dir>/<name>.mp4`
    async fn cut(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        aspect: AspectMode,
        name: &str,
    ) -> Result<PathBuf, MediaError>;
}

#[async_trait]
pub trait CaptionRenderer: Send + Sync {
    /// Burn caption groups (clip-relative times) into a copy of `clip`
    async fn burn_in(&self, clip: &Path, groups: &[WordGroup]) -> Result<PathBuf, MediaError>;
}

/// Clamp moments to `[0, media_duration]`. A moment shortened below
/// `min_length` by the clamp is extended back from its end; media shorter
/// than `min_length` yields the whole media. Moments starting past the end
/// of the media are dropped.
pub fn validate_timestamps(
    moments: Vec<RefinedMoment>,
    media_duration: f64,
    min_length: f64,
) -> Vec<RefinedMoment> {
    moments
        .into_iter()
        .filter_map(|mut moment| {
            let start = moment.start.max(0.0);
            let end = moment.end.min(media_duration);
            if start >= end {
                tracing::warn!(
                    "Skipping invalid moment: start={:.2}, end={:.2}",
                    moment.start,
                    moment.end
                );
                return None;
            }

            let (start, end) = if media_duration <= min_length {
                (0.0, media_duration)
            } else if end - start < min_length {
                let start = (end - min_length).max(0.0);
                (start, (start + min_length).min(media_duration))
            } else {
                (start, end)
            };

            if (start, end) != (moment.start, moment.end) {
                tracing::debug!(
                    "Moment {:.2}s-{:.2}s adjusted to {:.2}s-{:.2}s (media {:.2}s)",
                    moment.start,
                    moment.end,
                    start,
                    end,
                    media_duration
                );
            }
            moment.start = start;
            moment.end = end;
            moment.duration = end - start;
            Some(moment)
        })
        .collect()
}

/// `HH:MM:SS.mmm` for tool arguments
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rem) = (rem / 60_000, rem % 60_000);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, rem / 1000, rem % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ScoredMoment;

    fn refined(start: f64, end: f64) -> RefinedMoment {
        let scored = ScoredMoment {
            start,
            end,
            duration: end - start,
            score: 6.0,
            reason: String::new(),
            preview_text: String::new(),
        };
        RefinedMoment::new(&scored, start, end, String::new())
    }

    #[test]
    fn validation_clamps_and_drops() {
        let moments = vec![refined(-1.0, 20.0), refined(90.0, 130.0), refined(125.0, 140.0)];
        let valid = validate_timestamps(moments, 120.0, 15.0);

        assert_eq!(valid.len(), 2);
        assert_eq!((valid[0].start, valid[0].end, valid[0].duration), (0.0, 20.0, 20.0));
        assert_eq!((valid[1].end, valid[1].duration), (120.0, 30.0));
        assert_eq!(valid[1].original_end, 130.0);
    }

    #[test]
    fn clamped_moment_keeps_minimum_length() {
        let valid = validate_timestamps(vec![refined(100.0, 125.0)], 108.0, 15.0);
        assert_eq!(valid.len(), 1);
        assert_eq!((valid[0].start, valid[0].end, valid[0].duration), (93.0, 108.0, 15.0));
        assert_eq!((valid[0].original_start, valid[0].original_end), (100.0, 125.0));
    }

    #[test]
    fn media_shorter_than_minimum_is_used_whole() {
        let valid = validate_timestamps(vec![refined(2.0, 30.0)], 12.0, 15.0);
        assert_eq!((valid[0].start, valid[0].end, valid[0].duration), (0.0, 12.0, 12.0));
    }

    #[test]
    fn clamped_results_stay_within_bounds() {
        let moments = (0..40).map(|i| refined(i as f64 * 3.0, i as f64 * 3.0 + 20.0)).collect();
        for moment in validate_timestamps(moments, 100.0, 15.0) {
            assert!(moment.start >= 0.0 && moment.end <= 100.0);
            assert!(moment.duration >= 15.0 - 1e-9);
        }
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(3725.5), "01:02:05.500");
        assert_eq!(format_timestamp(-2.0), "00:00:00.000");
    }
}
