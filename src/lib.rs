// lib.rs — Viral clip finder: transcribe, score, refine, cut and caption

pub mod analysis;
pub mod captions;
pub mod config;
pub mod fetch;
pub mod media;
pub mod orchestrator;
pub mod pipeline;
pub mod stt;
pub mod transcript;

pub use analysis::{
    chunk_segments, select_moments, take_top, BoundaryRefiner, Chunk, ChunkScore, Language,
    Lexicon, LLMError, MomentAnalyzer, RefinedMoment, ScoredMoment, ViralScorer,
};
pub use captions::{group_words, CaptionStyle, WordGroup, WordGrouper};
pub use config::{AspectMode, BackendKind, ConfigError, PipelineConfig};
pub use fetch::{FetchError, VideoFetcher, VideoSource};
pub use media::{validate_timestamps, CaptionRenderer, ClipCutter, MediaError, MediaProbe};
pub use orchestrator::{BackendGuard, FailoverOrchestrator, OrchestratorError};
pub use pipeline::{ClipMetadata, ClipOutcome, ClipPipeline, PipelineError, PipelineProgress, PipelineReport};
pub use stt::{STTAdapter, STTError};
pub use transcript::{Segment, Transcript, TranscriptCache, TranscriptError, Word};
