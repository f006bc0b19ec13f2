// orchestrator/backend_guard.rs — Retry + circuit breaker around the scoring backend

use super::circuit_breaker::CircuitBreaker;
use super::metrics::Metrics;
use super::retry::RetryPolicy;
use crate::analysis::llm::LLMAdapter;
use crate::analysis::LLMError;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Wraps one text-generation backend so transient failures are retried and a
/// backend that keeps failing is skipped until its cooldown expires.
pub struct BackendGuard {
    inner: Box<dyn LLMAdapter>,
    retry_policy: RetryPolicy,
    timeout: Duration,
    breaker: Mutex<CircuitBreaker>,
    metrics: Mutex<Metrics>,
}

impl BackendGuard {
    pub fn new(inner: Box<dyn LLMAdapter>, max_retries: u8, timeout_secs: u64) -> Self {
        Self {
            inner,
            retry_policy: RetryPolicy::new(max_retries),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            breaker: Mutex::new(CircuitBreaker::new()),
            metrics: Mutex::new(Metrics::new()),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Mutex::new(breaker);
        self
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn request_allowed(&self) -> bool {
        self.breaker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_request_allowed()
    }

    fn record(&self, ok: bool) {
        let mut breaker = self.breaker.lock().unwrap_or_else(PoisonError::into_inner);
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        if ok {
            breaker.record_success();
            metrics.record_success(self.inner.name());
        } else {
            breaker.record_failure();
            metrics.record_failure(self.inner.name());
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<String, LLMError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LLMError::Timeout),
        }
    }
}

#[async_trait]
impl LLMAdapter for BackendGuard {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        if !self.request_allowed() {
            tracing::warn!("LLM: '{}' skipped: circuit breaker open", self.inner.name());
            self.metrics
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record_short_circuit(self.inner.name());
            return Err(LLMError::CircuitOpen);
        }

        let mut attempt = 0u8;
        loop {
            match self.attempt(prompt).await {
                Ok(text) => {
                    tracing::debug!("LLM: '{}' succeeded ({} chars)", self.inner.name(), text.len());
                    self.record(true);
                    return Ok(text);
                }
                Err(e) => {
                    tracing::warn!(
                        "LLM: '{}' attempt {} failed: {:?}",
                        self.inner.name(),
                        attempt + 1,
                        e
                    );

                    if self.retry_policy.should_retry(attempt, &e) {
                        self.retry_policy.wait_before_retry(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    self.record(false);
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
