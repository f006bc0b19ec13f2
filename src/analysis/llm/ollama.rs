// analysis/llm/ollama.rs — Ollama local LLM adapter

use super::{status_error, LLMAdapter};
use crate::analysis::types::LLMError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

pub struct OllamaAdapter {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaAdapter {
    pub fn new(base_url: &str, model: &str, temperature: f32, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl LLMAdapter for OllamaAdapter {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: 512,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::from_reqwest("Ollama", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(&format!("Ollama {}", self.model), status, &body));
        }

        let ollama: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ProviderError(format!("Ollama parse: {}", e)))?;

        if ollama.response.trim().is_empty() {
            return Err(LLMError::InvalidResponse);
        }

        Ok(ollama.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let adapter = OllamaAdapter::new("http://gpu-box:11434/", "llama3.2", 0.0, 5);
        assert_eq!(adapter.endpoint, "http://gpu-box:11434/api/generate");
    }

    #[test]
    fn request_is_non_streaming() {
        let request = OllamaRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            options: OllamaOptions {
                temperature: 0.0,
                num_predict: 512,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 512);
    }
}
