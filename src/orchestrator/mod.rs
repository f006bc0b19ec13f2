use crate::config::SttConfig;
use crate::stt::{STTAdapter, STTError};
use crate::transcript::Transcript;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use self::circuit_breaker::CircuitBreaker;
use self::metrics::Metrics;
use self::provider_registry::default_providers;
use self::retry::RetryPolicy;

pub mod backend_guard;
pub mod circuit_breaker;
pub mod metrics;
pub mod provider_registry;
pub mod retry;

pub use backend_guard::BackendGuard;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("All providers failed")]
    AllProvidersFailed(Vec<(String, STTError)>),

    #[error("No providers available")]
    NoProvidersAvailable,
}

pub struct ProviderConfig {
    pub id: String,
    pub priority: u8,
    pub adapter: Box<dyn STTAdapter + Send + Sync>,
    pub max_retries: u8,
    pub timeout_secs: u64,
}

pub struct FailoverOrchestrator {
    providers: Vec<ProviderConfig>,
    circuit_breakers: HashMap<String, CircuitBreaker>,
    metrics: Metrics,
    retry_base_delay: Duration,
}

impl FailoverOrchestrator {
    pub fn new(mut providers: Vec<ProviderConfig>) -> Self {
        providers.sort_by_key(|p| p.priority);

        let mut circuit_breakers = HashMap::new();
        for provider in &providers {
            circuit_breakers.insert(provider.id.clone(), CircuitBreaker::new());
        }

        Self {
            providers,
            circuit_breakers,
            metrics: Metrics::new(),
            retry_base_delay: Duration::from_secs(2),
        }
    }

    pub fn from_config(config: &SttConfig) -> Self {
        let providers = default_providers(config);
        tracing::info!("STT orchestrator: {} providers available", providers.len());
        Self::new(providers)
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub async fn transcribe(
        &mut self,
        media: &Path,
        language: Option<&str>,
    ) -> Result<Transcript, OrchestratorError> {
        if self.providers.is_empty() {
            return Err(OrchestratorError::NoProvidersAvailable);
        }

        let mut all_errors = Vec::new();

        for provider in &self.providers {
            let allowed = self
                .circuit_breakers
                .entry(provider.id.clone())
                .or_default()
                .is_request_allowed();

            if !allowed {
                tracing::warn!(
                    "Provider {} skipped: circuit breaker open",
                    provider.id
                );
                self.metrics.record_short_circuit(&provider.id);
                all_errors.push((
                    provider.id.clone(),
                    STTError::ProviderError("Circuit breaker open".to_string()),
                ));
                continue;
            }

            tracing::info!(
                "Attempting provider: {} (priority {})",
                provider.id,
                provider.priority
            );

            let retry_policy =
                RetryPolicy::new(provider.max_retries).with_base_delay(self.retry_base_delay);
            let mut attempt = 0u8;

            loop {
                match Self::try_provider(provider, media, language).await {
                    Ok(transcript) => {
                        tracing::info!(
                            "Provider {} succeeded: segments={}, duration={:.1}s",
                            provider.id,
                            transcript.segments.len(),
                            transcript.duration
                        );

                        if let Some(cb) = self.circuit_breakers.get_mut(&provider.id) {
                            cb.record_success();
                        }
                        self.metrics.record_success(&provider.id);
                        return Ok(transcript);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Provider {} attempt {}/{} failed: {:?}",
                            provider.id,
                            attempt + 1,
                            provider.max_retries + 1,
                            e
                        );

                        if retry_policy.should_retry(attempt, &e) {
                            retry_policy.wait_before_retry(attempt).await;
                            attempt += 1;
                            continue;
                        }

                        if let Some(cb) = self.circuit_breakers.get_mut(&provider.id) {
                            cb.record_failure();
                        }
                        self.metrics.record_failure(&provider.id);
                        all_errors.push((provider.id.clone(), e));
                        break;
                    }
                }
            }
        }

        tracing::error!("All providers failed: {:?}", all_errors);
        Err(OrchestratorError::AllProvidersFailed(all_errors))
    }

    pub fn get_metrics(&self) -> &Metrics {
        &self.metrics
    }

    async fn try_provider(
        provider: &ProviderConfig,
        media: &Path,
        language: Option<&str>,
    ) -> Result<Transcript, STTError> {
        let timeout = Duration::from_secs(provider.timeout_secs);

        match tokio::time::timeout(timeout, provider.adapter.transcribe(media, language)).await {
            Ok(result) => result,
            Err(_) => Err(STTError::TimeoutError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakyStt {
        name: &'static str,
        failures_before_success: usize,
        error: fn() -> STTError,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl STTAdapter for FlakyStt {
        async fn transcribe(&self, _media: &Path, language: Option<&str>) -> Result<Transcript, STTError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err((self.error)());
            }
            Ok(Transcript::new(
                language.unwrap_or("en"),
                vec![Segment::new(0.0, 1.0, self.name)],
            )?)
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn provider(
        id: &'static str,
        priority: u8,
        failures: usize,
        error: fn() -> STTError,
        max_retries: u8,
    ) -> (ProviderConfig, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = ProviderConfig {
            id: id.to_string(),
            priority,
            adapter: Box::new(FlakyStt {
                name: id,
                failures_before_success: failures,
                error,
                calls: calls.clone(),
            }),
            max_retries,
            timeout_secs: 5,
        };
        (config, calls)
    }

    #[tokio::test]
    async fn fails_over_in_priority_order() {
        let (local, local_calls) = provider("whisper", 2, 0, || STTError::TimeoutError, 0);
        let (remote, remote_calls) =
            provider("groq", 1, usize::MAX, || STTError::AuthenticationError, 2);
        let mut orchestrator = FailoverOrchestrator::new(vec![local, remote]);

        let transcript = orchestrator
            .transcribe(Path::new("talk.mp4"), Some("fr"))
            .await
            .unwrap();

        assert_eq!(transcript.full_text, "whisper");
        assert_eq!(transcript.language, "fr");
        assert_eq!(remote_calls.load(Ordering::SeqCst), 1);
        assert_eq!(local_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.get_metrics().get_failure_count("groq"), 1);
        assert_eq!(orchestrator.get_metrics().get_success_count("whisper"), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let (remote, calls) = provider("groq", 1, 1, || STTError::RateLimitError, 1);
        let mut orchestrator = FailoverOrchestrator::new(vec![remote])
            .with_retry_base_delay(Duration::from_millis(1));

        assert!(orchestrator.transcribe(Path::new("a.mp4"), None).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reports_every_failure() {
        let (a, _) = provider("groq", 1, usize::MAX, || STTError::AuthenticationError, 0);
        let (b, _) = provider(
            "whisper",
            2,
            usize::MAX,
            || STTError::InvalidMedia("no audio".into()),
            0,
        );
        let mut orchestrator = FailoverOrchestrator::new(vec![a, b]);

        match orchestrator.transcribe(Path::new("a.mp4"), None).await {
            Err(OrchestratorError::AllProvidersFailed(errors)) => {
                let ids: Vec<&str> = errors.iter().map(|(id, _)| id.as_str()).collect();
                assert_eq!(ids, vec!["groq", "whisper"]);
            }
            other => panic!("unexpected: {:?}", other.map(|t| t.full_text)),
        }
    }

    #[tokio::test]
    async fn empty_registry() {
        let mut orchestrator = FailoverOrchestrator::new(Vec::new());
        assert!(matches!(
            orchestrator.transcribe(Path::new("a.mp4"), None).await,
            Err(OrchestratorError::NoProvidersAvailable)
        ));
    }
}
