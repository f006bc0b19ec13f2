// analysis/llm/mod.rs — Text-generation backend trait + provider selection

pub mod anthropic;
pub mod ollama;
pub mod openai;

use super::types::LLMError;
use crate::config::{BackendConfig, BackendKind};
use async_trait::async_trait;

/// Trait for LLM text generation adapters
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    /// Generate text from prompt
    async fn generate(&self, prompt: &str) -> Result<String, LLMError>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Build the single backend named by the configuration
pub fn from_config(config: &BackendConfig) -> Result<Box<dyn LLMAdapter>, LLMError> {
    let adapter: Box<dyn LLMAdapter> = match config.provider {
        BackendKind::Ollama => Box::new(ollama::OllamaAdapter::new(
            &config.ollama_url,
            &config.ollama_model,
            config.temperature,
            config.timeout_secs,
        )),
        BackendKind::OpenAI => {
            let key = non_empty(config.openai_api_key.as_deref()).ok_or(LLMError::MissingApiKey("openai"))?;
            Box::new(openai::OpenAIAdapter::new(
                key,
                &config.openai_model,
                config.temperature,
                config.timeout_secs,
            ))
        }
        BackendKind::Anthropic => {
            let key = non_empty(config.anthropic_api_key.as_deref())
                .ok_or(LLMError::MissingApiKey("anthropic"))?;
            Box::new(anthropic::AnthropicAdapter::new(
                key,
                &config.anthropic_model,
                config.temperature,
                config.timeout_secs,
            ))
        }
    };

    tracing::info!("LLM: '{}' backend loaded", adapter.name());
    Ok(adapter)
}

fn non_empty(key: Option<&str>) -> Option<String> {
    key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string)
}

/// Map a non-success HTTP status to the matching error
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> LLMError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LLMError::RateLimited
    } else if status.is_server_error() {
        LLMError::NetworkError(format!("{} {}: {}", provider, status, body))
    } else {
        LLMError::ProviderError(format!("{} {}: {}", provider, status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_backends_need_keys() {
        let mut config = BackendConfig {
            provider: BackendKind::OpenAI,
            ..BackendConfig::default()
        };
        assert!(matches!(
            from_config(&config),
            Err(LLMError::MissingApiKey("openai"))
        ));

        config.provider = BackendKind::Anthropic;
        config.anthropic_api_key = Some("   ".into());
        assert!(matches!(
            from_config(&config),
            Err(LLMError::MissingApiKey("anthropic"))
        ));

        config.anthropic_api_key = Some("sk-ant-test".into());
        let adapter = from_config(&config).unwrap();
        assert_eq!(adapter.name(), "anthropic");
    }

    #[test]
    fn ollama_needs_nothing() {
        let adapter = from_config(&BackendConfig::default()).unwrap();
        assert_eq!(adapter.name(), "ollama");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error("openai", reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            LLMError::RateLimited
        ));
        assert!(status_error("openai", reqwest::StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!status_error("openai", reqwest::StatusCode::UNAUTHORIZED, "").is_retryable());
    }
}
