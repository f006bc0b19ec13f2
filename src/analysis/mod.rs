// analysis/mod.rs — Moment selection: chunk, score, rank, refine

pub mod chunker;
pub mod lexicon;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod refiner;
pub mod scorer;
pub mod selector;
pub mod types;

pub use chunker::chunk_segments;
pub use lexicon::{Language, Lexicon};
pub use parser::parse_response;
pub use prompt::build_prompt;
pub use refiner::BoundaryRefiner;
pub use scorer::ViralScorer;
pub use selector::{select_moments, take_top};
pub use types::{Chunk, ChunkScore, LLMError, RefinedMoment, ScoredMoment};

use crate::config::{AnalysisConfig, RefinementConfig};
use crate::transcript::Transcript;

/// Runs the analysis stages over one transcript
pub struct MomentAnalyzer {
    scorer: ViralScorer,
    analysis: AnalysisConfig,
    refinement: RefinementConfig,
}

impl MomentAnalyzer {
    pub fn new(scorer: ViralScorer, analysis: AnalysisConfig, refinement: RefinementConfig) -> Self {
        Self {
            scorer,
            analysis,
            refinement,
        }
    }

    /// Ranked candidate moments, at most `max_clips` of them. Chunks are scored
    /// one at a time; an empty transcript yields no moments.
    pub async fn find_moments(&self, transcript: &Transcript) -> Vec<ScoredMoment> {
        let chunks = chunk_segments(&transcript.segments, self.analysis.chunk_duration);
        if chunks.is_empty() {
            tracing::warn!("Analysis: transcript has no segments");
            return Vec::new();
        }

        let language = Language::from_code(&transcript.language);
        tracing::info!(
            "Analysis: scoring {} chunks with '{}' ({:?})",
            chunks.len(),
            self.scorer.backend_name(),
            language
        );

        let mut scores = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let score = self.scorer.score(&chunk.text, language).await;
            tracing::debug!(
                "Analysis: chunk {}/{} ({:.1}s-{:.1}s) -> {:.1}",
                i + 1,
                chunks.len(),
                chunk.start,
                chunk.end,
                score.score
            );
            scores.push(score);
        }

        let ranked = select_moments(&chunks, &scores, &self.analysis, language);
        take_top(ranked, self.analysis.max_clips)
    }

    pub fn refine(&self, moments: &[ScoredMoment], transcript: &Transcript) -> Vec<RefinedMoment> {
        let refiner = BoundaryRefiner::new(self.refinement, Lexicon::for_code(&transcript.language));
        refiner.refine(moments, transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::llm::LLMAdapter;
    use crate::transcript::Segment;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Scores a chunk by how many times it says "wow"
    struct WowCounter;

    #[async_trait]
    impl LLMAdapter for WowCounter {
        async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
            let transcript = prompt.split('"').nth(1).unwrap_or_default();
            let wows = transcript.matches("wow").count();
            Ok(format!("Overall Score: {}\nReason: {} wows", wows * 3, wows))
        }

        fn name(&self) -> &str {
            "wow-counter"
        }
    }

    fn analyzer() -> MomentAnalyzer {
        MomentAnalyzer::new(
            ViralScorer::new(Arc::new(WowCounter)),
            AnalysisConfig::default(),
            RefinementConfig::default(),
        )
    }

    fn lecture() -> Transcript {
        let texts = [
            "Welcome to the lecture.",
            "Today we cover rust.",
            "This part is wow wow wow.",
            "Then it gets wow.",
            "Finally we wrap up.",
            "Thanks for watching.",
        ];
        let segments = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment::new(i as f64 * 30.0, i as f64 * 30.0 + 28.0, *t))
            .collect();
        Transcript::new("en", segments).unwrap()
    }

    #[tokio::test]
    async fn ranks_and_refines() {
        let analyzer = analyzer();
        let transcript = lecture();

        let moments = analyzer.find_moments(&transcript).await;
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].score, 10.0);
        assert_eq!(moments[0].reason, "4 wows");
        assert_eq!((moments[0].start, moments[0].end), (60.0, 118.0));

        let refined = analyzer.refine(&moments, &transcript);
        assert_eq!(refined.len(), 1);
        assert_eq!((refined[0].start, refined[0].end), (60.0, 118.0));
        assert!(refined[0].context.contains("Then it gets wow."));
    }

    #[tokio::test]
    async fn empty_transcript_has_no_moments() {
        let transcript = Transcript::new("en", Vec::new()).unwrap();
        assert!(analyzer().find_moments(&transcript).await.is_empty());
    }
}
