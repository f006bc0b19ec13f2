// analysis/scorer.rs — Viral-potential scoring through a pluggable backend

use super::lexicon::Language;
use super::llm::LLMAdapter;
use super::parser::{parse_response, DEFAULT_SCORE};
use super::prompt::{build_prompt, uncertain_reason};
use super::types::ChunkScore;
use std::sync::Arc;

pub struct ViralScorer {
    backend: Arc<dyn LLMAdapter>,
}

impl ViralScorer {
    pub fn new(backend: Arc<dyn LLMAdapter>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Score one chunk of transcript. Never fails: a backend error yields
    /// `DEFAULT_SCORE` with an "uncertain" rationale.
    pub async fn score(&self, text: &str, language: Language) -> ChunkScore {
        let prompt = build_prompt(text, language);

        match self.backend.generate(&prompt).await {
            Ok(response) => {
                let parsed = parse_response(&response, language);
                tracing::debug!(
                    "Scorer: '{}' scored {:.1} ({})",
                    self.backend.name(),
                    parsed.score,
                    parsed.reason
                );
                parsed
            }
            Err(e) => {
                tracing::warn!(
                    "Scorer: '{}' failed, using default score: {}",
                    self.backend.name(),
                    e
                );
                ChunkScore {
                    score: DEFAULT_SCORE,
                    reason: uncertain_reason(language).to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::LLMError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedBackend {
        reply: Result<&'static str, ()>,
        last_prompt: Mutex<String>,
    }

    impl CannedBackend {
        fn new(reply: Result<&'static str, ()>) -> Self {
            Self {
                reply,
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl LLMAdapter for CannedBackend {
        async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            self.reply
                .map(str::to_string)
                .map_err(|_| LLMError::NetworkError("connection refused".into()))
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn parses_backend_reply() {
        let backend = Arc::new(CannedBackend::new(Ok(
            "Humor: 9\nEmotion: 6\nSurprise: 7\nQuotability: 9\nOverall Score: 8.5\nReason: Killer punchline.",
        )));
        let scorer = ViralScorer::new(backend.clone());

        let score = scorer.score("and then the goat ate my homework", Language::English).await;
        assert_eq!(score.score, 8.5);
        assert_eq!(score.reason, "Killer punchline.");
        assert!(backend
            .last_prompt
            .lock()
            .unwrap()
            .contains("and then the goat ate my homework"));
    }

    #[tokio::test]
    async fn backend_failure_is_recovered() {
        let scorer = ViralScorer::new(Arc::new(CannedBackend::new(Err(()))));

        let score = scorer.score("anything", Language::English).await;
        assert_eq!(score.score, 5.0);
        assert_eq!(score.reason, "Analysis uncertain");

        let score = scorer.score("n'importe quoi", Language::French).await;
        assert_eq!(score.reason, "Analyse incertaine");
    }

    #[tokio::test]
    async fn malformed_reply_stays_in_range() {
        let scorer = ViralScorer::new(Arc::new(CannedBackend::new(Ok("¯\\_(ツ)_/¯ 400%"))));
        let score = scorer.score("text", Language::English).await;
        assert!((0.0..=10.0).contains(&score.score));
    }
}
