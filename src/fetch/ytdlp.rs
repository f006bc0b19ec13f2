// fetch/ytdlp.rs — yt-dlp backed video fetcher

use super::{extract_video_id, is_url, sanitize_filename, FetchError, VideoFetcher, VideoSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
}

pub struct YtDlpFetcher {
    binary: PathBuf,
    output_dir: PathBuf,
    max_duration: f64,
}

impl YtDlpFetcher {
    pub fn new(output_dir: impl Into<PathBuf>, max_duration: f64) -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            output_dir: output_dir.into(),
            max_duration,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run(&self, args: &[&str]) -> Result<String, FetchError> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| FetchError::DownloadError(format!("failed to spawn yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::DownloadError(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// The downloaded file: the printed path when present, else any file in the
    /// output dir carrying the video id
    fn locate_download(&self, printed: &str, video_id: &str) -> Result<PathBuf, FetchError> {
        if let Some(path) = printed
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(PathBuf::from)
            .filter(|p| p.is_file())
        {
            return Ok(path);
        }

        std::fs::read_dir(&self.output_dir)?
            .flatten()
            .map(|e| e.path())
            .find(|p| {
                p.is_file()
                    && p.extension().and_then(|e| e.to_str()) != Some("json")
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.contains(video_id))
            })
            .ok_or_else(|| FetchError::DownloadError(format!("downloaded file for {} not found", video_id)))
    }
}

/// Best stream at or under the requested height, preferring mp4
fn format_selector(quality: &str) -> String {
    let height = quality.trim().trim_end_matches(['p', 'P']);
    format!(
        "best[height<={h}][ext=mp4]/best[height<={h}]/best",
        h = height
    )
}

fn parse_info(raw: &str) -> Result<YtDlpInfo, FetchError> {
    let line = raw.lines().find(|l| l.trim_start().starts_with('{')).unwrap_or(raw);
    Ok(serde_json::from_str(line)?)
}

fn output_template(dir: &Path, title: &str) -> String {
    dir.join(format!("{}_%(id)s.%(ext)s", sanitize_filename(title).replace('%', "%%")))
        .to_string_lossy()
        .into_owned()
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, quality: &str) -> Result<VideoSource, FetchError> {
        if !is_url(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        let video_id = extract_video_id(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;

        tracing::info!("Fetching video information for: {}", url);
        let info = parse_info(&self.run(&["--dump-json", "--no-playlist", "--no-warnings", url]).await?)?;

        let duration = info.duration.unwrap_or(0.0);
        if duration > self.max_duration {
            return Err(FetchError::TooLong {
                duration,
                max: self.max_duration,
            });
        }

        let title = info.title.clone().unwrap_or_else(|| "Unknown".to_string());
        tokio::fs::create_dir_all(&self.output_dir).await?;

        tracing::info!("Downloading: {} ({:.0}s, {})", title, duration, quality);
        let template = output_template(&self.output_dir, &title);
        let format = format_selector(quality);
        let printed = self
            .run(&[
                "--no-playlist",
                "--quiet",
                "--no-warnings",
                "-f",
                &format,
                "--merge-output-format",
                "mp4",
                "-o",
                &template,
                "--print",
                "after_move:filepath",
                url,
            ])
            .await?;

        let filepath = self.locate_download(&printed, &video_id)?;
        let source = VideoSource {
            filepath,
            title,
            duration,
            video_id: info.id.or(Some(video_id)),
            url: Some(url.to_string()),
            uploader: info.uploader,
            upload_date: info.upload_date,
            view_count: info.view_count,
        };
        source.write_sidecar()?;

        tracing::info!("Download complete: {}", source.filepath.display());
        Ok(source)
    }
}
