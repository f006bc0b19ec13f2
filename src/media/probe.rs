use super::{MediaError, MediaProbe};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration_sec: f64,
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub codec: String,
    pub has_audio: bool,
}

pub struct FfprobeProbe {
    ffprobe_path: PathBuf,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

fn parse_framerate(fps_str: &str) -> f64 {
    match fps_str.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(0.0);
            let den: f64 = den.parse().unwrap_or(1.0);
            if den != 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => fps_str.parse().unwrap_or(0.0),
    }
}

/// Read `ffprobe -show_format -show_streams` JSON output
pub(crate) fn parse_probe_json(raw: &[u8]) -> Result<VideoInfo, MediaError> {
    let json: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| MediaError::Probe(e.to_string()))?;

    let streams = json["streams"].as_array().cloned().unwrap_or_default();
    let stream = streams
        .iter()
        .find(|s| s["codec_type"] == "video")
        .ok_or_else(|| MediaError::Probe("No video stream found".to_string()))?;

    let framerate = parse_framerate(
        stream["r_frame_rate"]
            .as_str()
            .or_else(|| stream["avg_frame_rate"].as_str())
            .unwrap_or("0"),
    );

    let duration_sec = json["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::Probe("Missing duration".to_string()))?;

    Ok(VideoInfo {
        duration_sec,
        width: stream["width"].as_u64().unwrap_or(0) as u32,
        height: stream["height"].as_u64().unwrap_or(0) as u32,
        framerate,
        codec: stream["codec_name"].as_str().unwrap_or("unknown").to_string(),
        has_audio: streams.iter().any(|s| s["codec_type"] == "audio"),
    })
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, source: &Path) -> Result<VideoInfo, MediaError> {
        if !source.exists() {
            return Err(MediaError::NotFound(source.to_path_buf()));
        }

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(source)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(MediaError::ToolFailed {
                tool: "ffprobe",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_json(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_streams_and_format() {
        let raw = br#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001"}
            ],
            "format": {"duration": "634.250000"}
        }"#;
        let info = parse_probe_json(raw).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.duration_sec, 634.25);
        assert!((info.framerate - 29.97).abs() < 0.01);
        assert!(info.has_audio);
    }

    #[test]
    fn audio_only_is_rejected() {
        let raw = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        assert!(matches!(parse_probe_json(raw), Err(MediaError::Probe(_))));
    }

    #[test]
    fn framerate_forms() {
        assert_eq!(parse_framerate("25"), 25.0);
        assert_eq!(parse_framerate("24/0"), 0.0);
    }
}
