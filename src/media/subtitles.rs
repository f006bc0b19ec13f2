// media/subtitles.rs — Animated caption burn-in through an ASS subtitle track

use super::ffmpeg::{encode_args, run_ffmpeg, VERTICAL_HEIGHT, VERTICAL_WIDTH};
use super::{CaptionRenderer, MediaError};
use crate::captions::{CaptionStyle, Rgb, StyleVariant, WordGroup};
use crate::config::AspectMode;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Pop-in duration for each caption group, in milliseconds
const POP_MS: u32 = 120;
const FONT: &str = "Arial";

/// `&H00BBGGRR`
fn ass_color(color: Rgb) -> String {
    format!("&H00{:02X}{:02X}{:02X}", color.2, color.1, color.0)
}

/// `H:MM:SS.cc`
fn ass_time(seconds: f64) -> String {
    let cs = (seconds.max(0.0) * 100.0).round() as u64;
    format!(
        "{}:{:02}:{:02}.{:02}",
        cs / 360_000,
        (cs / 6_000) % 60,
        (cs / 100) % 60,
        cs % 100
    )
}

fn escape_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '{' | '}' | '\n' | '\r'))
        .map(|c| if c == '\\' { '/' } else { c })
        .collect()
}

/// A complete ASS document showing each group centered at the variant's
/// vertical position on a `width x height` canvas
pub fn render_ass(groups: &[WordGroup], variant: &StyleVariant, width: u32, height: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[Script Info]");
    let _ = writeln!(out, "ScriptType: v4.00+");
    let _ = writeln!(out, "PlayResX: {}", width);
    let _ = writeln!(out, "PlayResY: {}", height);
    let _ = writeln!(out, "WrapStyle: 0");
    let _ = writeln!(out, "ScaledBorderAndShadow: yes");
    let _ = writeln!(out);

    let _ = writeln!(out, "[V4+ Styles]");
    let _ = writeln!(
        out,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, \
         Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, \
         Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    );
    let _ = writeln!(
        out,
        "Style: Caption,{},{},{},&H000000FF,{},&H80000000,-1,0,0,0,100,100,0,0,1,{},0,5,40,40,0,1",
        FONT,
        variant.font_size,
        ass_color(variant.color),
        ass_color(variant.outline_color),
        variant.outline_width
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "[Events]");
    let _ = writeln!(
        out,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    );
    let x = width / 2;
    let y = (variant.position.clamp(0.0, 1.0) * height as f64).round() as u32;
    for group in groups.iter().filter(|g| g.end > g.start) {
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},Caption,,0,0,0,,{{\\an5\\pos({},{})\\fscx80\\fscy80\\t(0,{},\\fscx100\\fscy100)}}{}",
            ass_time(group.start),
            ass_time(group.end),
            x,
            y,
            POP_MS,
            escape_text(&group.text)
        );
    }
    out
}

/// Path as an ffmpeg filter argument
fn filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

pub struct FfmpegCaptionRenderer {
    ffmpeg_path: PathBuf,
    style: CaptionStyle,
    aspect: AspectMode,
}

impl FfmpegCaptionRenderer {
    pub fn new(style: CaptionStyle, aspect: AspectMode) -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            style,
            aspect,
        }
    }

    pub fn with_binary(mut self, ffmpeg_path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self
    }

    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    fn canvas(&self) -> (u32, u32) {
        match self.aspect {
            AspectMode::Vertical => (VERTICAL_WIDTH, VERTICAL_HEIGHT),
            AspectMode::Original => (VERTICAL_HEIGHT, VERTICAL_WIDTH),
        }
    }
}

#[async_trait]
impl CaptionRenderer for FfmpegCaptionRenderer {
    async fn burn_in(&self, clip: &Path, groups: &[WordGroup]) -> Result<PathBuf, MediaError> {
        if !clip.exists() {
            return Err(MediaError::NotFound(clip.to_path_buf()));
        }

        let (width, height) = self.canvas();
        let ass = render_ass(groups, self.style.variant(self.aspect), width, height);
        let subtitle_path = clip.with_extension("ass");
        tokio::fs::write(&subtitle_path, ass).await?;

        let stem = clip.file_stem().and_then(|s| s.to_str()).unwrap_or("clip");
        let output = clip.with_file_name(format!("{}_captioned.mp4", stem));

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            clip.to_string_lossy().into_owned(),
            "-vf".into(),
            format!("ass='{}'", filter_path(&subtitle_path)),
        ];
        args.extend(encode_args().iter().map(|a| a.to_string()));
        args.push(output.to_string_lossy().into_owned());

        tracing::info!(
            "Burning {} caption groups ({}) into {}",
            groups.len(),
            self.style.name,
            clip.display()
        );
        let result = run_ffmpeg(&self.ffmpeg_path, args).await;
        let _ = tokio::fs::remove_file(&subtitle_path).await;
        result?;

        if !output.exists() {
            return Err(MediaError::NoOutput(output));
        }
        Ok(output)
    }
}
