// pipeline/mod.rs — End-to-end run: source -> transcript -> moments -> clips

pub mod progress;
pub mod sidecar;

pub use progress::{ClipStatus, PipelineProgress, PipelineStage, ProgressSink};
pub use sidecar::{CaptionRange, ClipMetadata};

use crate::analysis::{self, Language, LLMError, MomentAnalyzer, RefinedMoment, ViralScorer};
use crate::captions::{caption_words_for_clip, CaptionStyle, WordGrouper};
use crate::config::{AspectMode, ConfigError, PipelineConfig};
use crate::fetch::{is_remote, FetchError, VideoFetcher, VideoSource, YtDlpFetcher};
use crate::media::{
    validate_timestamps, CaptionRenderer, ClipCutter, FfmpegCaptionRenderer, FfmpegCutter,
    FfprobeProbe, MediaError, MediaProbe,
};
use crate::orchestrator::{BackendGuard, FailoverOrchestrator, OrchestratorError};
use crate::transcript::{Transcript, TranscriptCache, TranscriptError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc::UnboundedSender, Mutex as TokioMutex, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] OrchestratorError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("Scoring backend unavailable: {0}")]
    Backend(#[from] LLMError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProducedClip {
    pub index: usize,
    pub path: PathBuf,
    pub captioned: bool,
    /// Why captions are missing when burn-in was attempted and failed
    pub caption_error: Option<String>,
    pub metadata: ClipMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedClip {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub score: f64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClipOutcome {
    Produced(ProducedClip),
    Failed(FailedClip),
}

impl ClipOutcome {
    pub fn index(&self) -> usize {
        match self {
            ClipOutcome::Produced(clip) => clip.index,
            ClipOutcome::Failed(failed) => failed.index,
        }
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, ClipOutcome::Produced(_))
    }

    fn failed(index: usize, moment: &RefinedMoment, error: impl Into<String>) -> Self {
        ClipOutcome::Failed(FailedClip {
            index,
            start: moment.start,
            end: moment.end,
            score: moment.score,
            error: error.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub source: VideoSource,
    pub segment_count: usize,
    pub moments: Vec<RefinedMoment>,
    /// One outcome per moment, in rank order
    pub clips: Vec<ClipOutcome>,
}

impl PipelineReport {
    pub fn produced(&self) -> impl Iterator<Item = &ProducedClip> {
        self.clips.iter().filter_map(|c| match c {
            ClipOutcome::Produced(clip) => Some(clip),
            ClipOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailedClip> {
        self.clips.iter().filter_map(|c| match c {
            ClipOutcome::Failed(failed) => Some(failed),
            ClipOutcome::Produced(_) => None,
        })
    }
}

pub struct ClipPipeline {
    config: PipelineConfig,
    analyzer: MomentAnalyzer,
    orchestrator: Arc<TokioMutex<FailoverOrchestrator>>,
    cache: Arc<TokioMutex<TranscriptCache>>,
    fetcher: Arc<dyn VideoFetcher>,
    probe: Arc<dyn MediaProbe>,
    cutter: Arc<dyn ClipCutter>,
    renderer: Option<Arc<dyn CaptionRenderer>>,
    caption_style: CaptionStyle,
    progress: ProgressSink,
}

impl ClipPipeline {
    /// Pipeline with the ffmpeg/yt-dlp tool chain for media and the given
    /// scoring backend and transcription providers
    pub fn new(
        config: PipelineConfig,
        backend: Arc<dyn analysis::llm::LLMAdapter>,
        orchestrator: FailoverOrchestrator,
    ) -> Self {
        let media = &config.media;
        let caption_style = CaptionStyle::preset_or_default(&config.captions.style);
        let renderer: Option<Arc<dyn CaptionRenderer>> = if config.captions.enabled {
            Some(Arc::new(FfmpegCaptionRenderer::new(
                caption_style.clone(),
                media.aspect,
            )))
        } else {
            None
        };

        Self {
            analyzer: MomentAnalyzer::new(
                ViralScorer::new(backend),
                config.analysis.clone(),
                config.refinement,
            ),
            orchestrator: Arc::new(TokioMutex::new(orchestrator)),
            cache: Arc::new(TokioMutex::new(TranscriptCache::new(&media.transcripts_dir))),
            fetcher: Arc::new(YtDlpFetcher::new(&media.downloads_dir, media.max_video_duration)),
            probe: Arc::new(FfprobeProbe::default()),
            cutter: Arc::new(FfmpegCutter::new(&media.outputs_dir, FfprobeProbe::default())),
            renderer,
            caption_style,
            progress: ProgressSink::default(),
            config,
        }
    }

    /// Everything built from configuration: the configured scoring backend
    /// behind retry and circuit breaking, and the default STT providers
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let backend = analysis::llm::from_config(&config.backend)?;
        let guarded = BackendGuard::new(backend, config.backend.max_retries, config.backend.timeout_secs);
        let orchestrator = FailoverOrchestrator::from_config(&config.stt);
        Ok(Self::new(config, Arc::new(guarded), orchestrator))
    }

    /// Load (or create) the config file, overlay the environment, then build
    pub fn load(config_path: &Path) -> Result<Self, PipelineError> {
        let mut config = PipelineConfig::load_or_create(config_path)?;
        config.apply_env();
        config.normalize();
        Self::from_config(config)
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn VideoFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_cutter(mut self, cutter: Arc<dyn ClipCutter>) -> Self {
        self.cutter = cutter;
        self
    }

    /// Replace the caption renderer; `None` produces uncaptioned clips
    pub fn with_renderer(mut self, renderer: Option<Arc<dyn CaptionRenderer>>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_progress(mut self, sender: UnboundedSender<PipelineProgress>) -> Self {
        self.progress = ProgressSink::new(sender);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full run for a URL or a local file path. Input and transcription
    /// errors end the run; per-clip failures are reported in the outcome list.
    pub async fn run(&self, input: &str) -> Result<PipelineReport, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        tracing::info!("Pipeline run {} started for {}", run_id, input);

        let source = self.acquire(input).await?;

        self.progress
            .stage(PipelineStage::Transcribing, source.filepath.display().to_string());
        let transcript = self.transcribe(&source.filepath).await?;

        let mut report = PipelineReport {
            run_id: run_id.clone(),
            source,
            segment_count: transcript.segments.len(),
            moments: Vec::new(),
            clips: Vec::new(),
        };

        if transcript.is_empty() {
            tracing::warn!("Pipeline run {}: transcript is empty, no clips", run_id);
            self.progress.stage(PipelineStage::Done, "empty transcript");
            return Ok(report);
        }

        let moments = self.analyze(&transcript).await;
        let media_duration = self.media_duration(&report.source, &transcript).await;
        report.moments = validate_timestamps(
            moments,
            media_duration,
            self.config.refinement.min_clip_length,
        );

        report.clips = self
            .produce_clips(&report.source, &transcript, &report.moments, &run_id)
            .await;

        let produced = report.clips.iter().filter(|c| c.is_produced()).count();
        tracing::info!(
            "Pipeline run {} finished: {}/{} clips produced",
            run_id,
            produced,
            report.clips.len()
        );
        self.progress.stage(
            PipelineStage::Done,
            format!("{}/{} clips", produced, report.clips.len()),
        );
        Ok(report)
    }

    async fn acquire(&self, input: &str) -> Result<VideoSource, PipelineError> {
        self.progress.stage(PipelineStage::Fetching, input);
        if is_remote(input) {
            Ok(self.fetcher.fetch(input, &self.config.media.quality).await?)
        } else {
            Ok(VideoSource::local(input)?)
        }
    }

    /// Transcript for `media`, from the cache unless re-transcription is forced
    pub async fn transcribe(&self, media: &Path) -> Result<Transcript, PipelineError> {
        if !self.config.stt.force_transcribe {
            if let Some(hit) = self.cache.lock().await.lookup(media) {
                return Ok(hit);
            }
        }

        let transcript = {
            let mut orchestrator = self.orchestrator.lock().await;
            orchestrator
                .transcribe(media, self.config.stt.language.as_deref())
                .await?
        }
        .with_source(media);

        if let Err(e) = self.cache.lock().await.insert(media, transcript.clone()) {
            tracing::warn!("Could not cache transcript for {}: {}", media.display(), e);
        }
        Ok(transcript)
    }

    /// Ranked, boundary-refined moments for a transcript
    pub async fn analyze(&self, transcript: &Transcript) -> Vec<RefinedMoment> {
        self.progress.stage(
            PipelineStage::Analyzing,
            format!("{} segments", transcript.segments.len()),
        );
        let moments = self.analyzer.find_moments(transcript).await;

        self.progress
            .stage(PipelineStage::Refining, format!("{} moments", moments.len()));
        let refined = self.analyzer.refine(&moments, transcript);
        for (i, moment) in refined.iter().enumerate() {
            tracing::info!(
                "Moment {}: {:.1}s-{:.1}s (was {:.1}s-{:.1}s) score {:.1}",
                i + 1,
                moment.start,
                moment.end,
                moment.original_start,
                moment.original_end,
                moment.score
            );
        }
        refined
    }

    async fn media_duration(&self, source: &VideoSource, transcript: &Transcript) -> f64 {
        if source.duration > 0.0 {
            return source.duration;
        }
        match self.probe.probe(&source.filepath).await {
            Ok(info) => info.duration_sec,
            Err(e) => {
                tracing::warn!(
                    "Probe failed for {}, using transcript duration: {}",
                    source.filepath.display(),
                    e
                );
                transcript.duration
            }
        }
    }

    /// Cut (and caption) every moment on a bounded worker pool. The result
    /// holds one outcome per moment, ordered by moment index.
    pub async fn produce_clips(
        &self,
        source: &VideoSource,
        transcript: &Transcript,
        moments: &[RefinedMoment],
        run_id: &str,
    ) -> Vec<ClipOutcome> {
        let total = moments.len();
        self.progress
            .stage(PipelineStage::Producing, format!("{} clips", total));
        if total == 0 {
            return Vec::new();
        }

        let workers = self.config.media.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let transcript = Arc::new(transcript.clone());
        let language = Language::from_code(&transcript.language);
        let max_words = self
            .config
            .captions
            .max_words
            .unwrap_or(self.caption_style.variant(self.config.media.aspect).max_words);
        let grouper = Arc::new(WordGrouper::from_config(&self.config.captions, max_words, language));

        tracing::info!("Producing {} clips with {} workers", total, workers);

        let mut set = JoinSet::new();
        for (index, moment) in moments.iter().enumerate() {
            let job = ClipJob {
                index,
                total,
                moment: moment.clone(),
                source: source.filepath.clone(),
                aspect: self.config.media.aspect,
                run_id: run_id.to_string(),
                transcript: Arc::clone(&transcript),
                grouper: Arc::clone(&grouper),
                cutter: Arc::clone(&self.cutter),
                renderer: self.renderer.clone(),
                progress: self.progress.clone(),
            };
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => job.run().await,
                    Err(_) => ClipOutcome::failed(job.index, &job.moment, "worker pool closed"),
                };
                (index, outcome)
            });
        }

        let mut finished: Vec<Option<ClipOutcome>> = vec![None; total];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => finished[index] = Some(outcome),
                Err(e) => tracing::error!("Clip worker aborted: {}", e),
            }
        }

        finished
            .into_iter()
            .zip(moments)
            .enumerate()
            .map(|(index, (outcome, moment))| {
                outcome.unwrap_or_else(|| ClipOutcome::failed(index, moment, "clip worker aborted"))
            })
            .collect()
    }
}

struct ClipJob {
    index: usize,
    total: usize,
    moment: RefinedMoment,
    source: PathBuf,
    aspect: AspectMode,
    run_id: String,
    transcript: Arc<Transcript>,
    grouper: Arc<WordGrouper>,
    cutter: Arc<dyn ClipCutter>,
    renderer: Option<Arc<dyn CaptionRenderer>>,
    progress: ProgressSink,
}

impl ClipJob {
    fn name(&self) -> String {
        format!("viral_clip_{}_score_{:.1}", self.index + 1, self.moment.score)
    }

    async fn run(self) -> ClipOutcome {
        self.progress.clip(self.index, self.total, ClipStatus::Cutting);
        let clip = match self
            .cutter
            .cut(&self.source, self.moment.start, self.moment.end, self.aspect, &self.name())
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Clip {} failed to cut: {}", self.index + 1, e);
                self.progress.clip(self.index, self.total, ClipStatus::Failed);
                return ClipOutcome::failed(self.index, &self.moment, e.to_string());
            }
        };

        let (path, captioned, caption_error) = self.caption(clip).await;

        let metadata = ClipMetadata::from_moment(&self.source, &path, &self.moment)
            .with_run_id(self.run_id.as_str());
        if let Err(e) = metadata.write(&path) {
            tracing::warn!("Clip {} metadata not written: {}", self.index + 1, e);
        }

        tracing::info!(
            "Clip {} ready: {} (captioned: {})",
            self.index + 1,
            path.display(),
            captioned
        );
        self.progress.clip(self.index, self.total, ClipStatus::Completed);
        ClipOutcome::Produced(ProducedClip {
            index: self.index,
            path,
            captioned,
            caption_error,
            metadata,
        })
    }

    /// Captioned clip when possible, else the plain clip with the reason
    async fn caption(&self, clip: PathBuf) -> (PathBuf, bool, Option<String>) {
        let Some(renderer) = &self.renderer else {
            return (clip, false, None);
        };

        let words = caption_words_for_clip(&self.transcript, &self.moment);
        let groups = self.grouper.group(&words);
        if groups.is_empty() {
            tracing::debug!("Clip {} has no timed words to caption", self.index + 1);
            return (clip, false, None);
        }

        self.progress.clip(self.index, self.total, ClipStatus::Captioning);
        match renderer.burn_in(&clip, &groups).await {
            Ok(captioned) => (captioned, true, None),
            Err(e) => {
                tracing::warn!(
                    "Clip {} captioning failed, keeping uncaptioned clip: {}",
                    self.index + 1,
                    e
                );
                (clip, false, Some(e.to_string()))
            }
        }
    }
}
