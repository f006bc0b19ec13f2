use crate::analysis::LLMError;
use crate::stt::STTError;
use std::time::Duration;
use tokio::time::sleep;

/// Errors that may succeed on a later attempt
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for STTError {
    fn is_retryable(&self) -> bool {
        STTError::is_retryable(self)
    }
}

impl Retryable for LLMError {
    fn is_retryable(&self) -> bool {
        LLMError::is_retryable(self)
    }
}

pub struct RetryPolicy {
    max_retries: u8,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u8) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(2),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn should_retry<E: Retryable>(&self, attempt: u8, error: &E) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        error.is_retryable()
    }

    pub fn delay_for(&self, attempt: u8) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt as u32);
        self.base_delay.saturating_mul(multiplier)
    }

    pub async fn wait_before_retry(&self, attempt: u8) {
        let delay = self.delay_for(attempt);

        tracing::info!(
            "Retrying in {}ms (attempt {})",
            delay.as_millis(),
            attempt + 2
        );
        sleep(delay).await;
    }
}
