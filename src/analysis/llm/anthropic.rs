// analysis/llm/anthropic.rs — Anthropic messages API adapter

use super::{status_error, LLMAdapter};
use crate::analysis::types::LLMError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl AnthropicAdapter {
    pub fn new(api_key: String, model: &str, temperature: f32, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model: model.to_string(),
            temperature,
        }
    }
}

fn collect_text(blocks: Vec<ContentBlock>) -> String {
    blocks
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
impl LLMAdapter for AnthropicAdapter {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 150,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::from_reqwest("Anthropic", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("Anthropic", status, &body));
        }

        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ProviderError(format!("Anthropic parse: {}", e)))?;

        let text = collect_text(messages.content);
        if text.trim().is_empty() {
            return Err(LLMError::InvalidResponse);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_text_blocks_are_kept() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Overall Score: 8\n"},{"type":"tool_use","id":"x"},{"type":"text","text":"Reason: funny"}]}"#,
        )
        .unwrap();
        assert_eq!(collect_text(response.content), "Overall Score: 8\nReason: funny");
    }
}
