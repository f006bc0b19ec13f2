// media/ffmpeg.rs — Clip extraction and vertical reframing with ffmpeg

use super::{format_timestamp, ClipCutter, MediaError, MediaProbe};
use crate::config::AspectMode;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

pub const VERTICAL_WIDTH: u32 = 1080;
pub const VERTICAL_HEIGHT: u32 = 1920;

/// Centered 9:16 crop `(width, height, x, y)` for a `width x height` frame.
/// Wider frames lose their sides, taller frames lose top and bottom.
pub fn vertical_crop(width: u32, height: u32) -> (u32, u32, u32, u32) {
    let target_ratio = 9.0 / 16.0;
    let ratio = width as f64 / height.max(1) as f64;

    if ratio > target_ratio {
        let crop_w = (height as f64 * target_ratio) as u32;
        (crop_w, height, (width - crop_w) / 2, 0)
    } else {
        let crop_h = ((width as f64 / target_ratio) as u32).min(height);
        (width, crop_h, 0, (height - crop_h) / 2)
    }
}

fn video_filter(aspect: AspectMode, width: u32, height: u32) -> Option<String> {
    match aspect {
        AspectMode::Original => None,
        AspectMode::Vertical => {
            let (w, h, x, y) = vertical_crop(width, height);
            Some(format!(
                "crop={}:{}:{}:{},scale={}:{}",
                w, h, x, y, VERTICAL_WIDTH, VERTICAL_HEIGHT
            ))
        }
    }
}

/// Standard x264/AAC encode settings shared by cutting and caption burn-in
pub(crate) fn encode_args() -> [&'static str; 10] {
    [
        "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac", "-b:a", "128k",
    ]
}

pub(crate) async fn run_ffmpeg(binary: &Path, args: Vec<String>) -> Result<Output, MediaError> {
    tracing::debug!("ffmpeg {}", args.join(" "));
    let output = Command::new(binary)
        .args(&args)
        .output()
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffmpeg",
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        return Err(MediaError::ToolFailed {
            tool: "ffmpeg",
            message: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
        });
    }
    Ok(output)
}

pub struct FfmpegCutter<P: MediaProbe> {
    ffmpeg_path: PathBuf,
    output_dir: PathBuf,
    probe: P,
}

impl<P: MediaProbe> FfmpegCutter<P> {
    pub fn new(output_dir: impl Into<PathBuf>, probe: P) -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            output_dir: output_dir.into(),
            probe,
        }
    }

    pub fn with_binary(mut self, ffmpeg_path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self
    }
}

#[async_trait]
impl<P: MediaProbe> ClipCutter for FfmpegCutter<P> {
    async fn cut(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        aspect: AspectMode,
        name: &str,
    ) -> Result<PathBuf, MediaError> {
        if end <= start {
            return Err(MediaError::InvalidRange { start, end });
        }
        let info = self.probe.probe(source).await?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output = self.output_dir.join(format!("{}.mp4", name));

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-ss".into(),
            format_timestamp(start),
            "-i".into(),
            source.to_string_lossy().into_owned(),
            "-t".into(),
            format!("{:.3}", end - start),
        ];
        if let Some(filter) = video_filter(aspect, info.width, info.height) {
            args.push("-vf".into());
            args.push(filter);
        }
        args.extend(encode_args().iter().map(|a| a.to_string()));
        args.extend(["-movflags".into(), "+faststart".into()]);
        args.push(output.to_string_lossy().into_owned());

        tracing::info!(
            "Cutting {:.2}s-{:.2}s of {} ({:?})",
            start,
            end,
            source.display(),
            aspect
        );
        run_ffmpeg(&self.ffmpeg_path, args).await?;

        if !output.exists() {
            return Err(MediaError::NoOutput(output));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::VideoInfo;

    #[test]
    fn landscape_crops_sides() {
        assert_eq!(vertical_crop(1920, 1080), (607, 1080, 656, 0));
    }

    #[test]
    fn tall_source_crops_top_and_bottom() {
        let (w, h, x, y) = vertical_crop(1080, 2400);
        assert_eq!((w, h, x), (1080, 1920, 0));
        assert_eq!(y, 240);
    }

    #[test]
    fn exact_vertical_is_untouched() {
        assert_eq!(vertical_crop(1080, 1920), (1080, 1920, 0, 0));
    }

    #[test]
    fn original_aspect_has_no_filter() {
        assert_eq!(video_filter(AspectMode::Original, 1920, 1080), None);
        assert_eq!(
            video_filter(AspectMode::Vertical, 1920, 1080).as_deref(),
            Some("crop=607:1080:656:0,scale=1080:1920")
        );
    }

    struct FixedProbe;

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn probe(&self, _source: &Path) -> Result<VideoInfo, MediaError> {
            Ok(VideoInfo {
                duration_sec: 60.0,
                width: 1920,
                height: 1080,
                framerate: 30.0,
                codec: "h264".into(),
                has_audio: true,
            })
        }
    }

    #[tokio::test]
    async fn empty_range_is_rejected() {
        let cutter = FfmpegCutter::new("outputs", FixedProbe);
        let result = cutter
            .cut(Path::new("video.mp4"), 10.0, 10.0, AspectMode::Vertical, "clip")
            .await;
        assert!(matches!(result, Err(MediaError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let cutter = FfmpegCutter::new(dir.path(), FixedProbe).with_binary(dir.path().join("no-ffmpeg"));
        let result = cutter
            .cut(Path::new("video.mp4"), 0.0, 5.0, AspectMode::Original, "clip")
            .await;
        assert!(matches!(result, Err(MediaError::Spawn { tool: "ffmpeg", .. })));
    }
}
