use super::ProviderConfig;
use crate::config::SttConfig;
use crate::stt::{GroqAdapter, WhisperAdapter};

/// Remote Groq first when a key is configured, then local whisper.cpp
pub fn default_providers(config: &SttConfig) -> Vec<ProviderConfig> {
    let mut providers = Vec::new();

    if let Some(key) = config.groq_api_key.clone().filter(|k| k.starts_with("gsk_")) {
        providers.push(ProviderConfig {
            id: "groq".to_string(),
            priority: 1,
            adapter: Box::new(GroqAdapter::new(key)),
            max_retries: 1,
            timeout_secs: 600,
        });
    }

    if let Some(whisper) = WhisperAdapter::from_config(config) {
        providers.push(ProviderConfig {
            id: "whisper".to_string(),
            priority: 2,
            adapter: Box::new(whisper),
            max_retries: 0,
            timeout_secs: 3600,
        });
    }

    providers
}
