//! OpenAI Chat Completions backend.

use super::backend::{decode_reply, http_client, request_err, BackendKind, CategorizationBackend};
use super::prompt::build_prompt;
use super::types::ClassificationResult;
use crate::config::{ClassifierConfig, NetworkConfig};
use crate::taxonomy::Taxonomy;
use crate::{JdexError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

pub struct OpenAiBackend {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        let timeout = NetworkConfig::API_TIMEOUT;
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: NetworkConfig::OPENAI_API_BASE.to_string(),
            timeout,
            client: http_client(timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let kind = self.kind();
        let api_key = self.api_key.as_deref().ok_or_else(|| JdexError::BackendUnavailable {
            backend: kind.name().to_string(),
        })?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!("Requesting classification from {} with model {}", url, self.model);
        let request = ChatCompletionRequest {
            model: &self.model,
            max_tokens: ClassifierConfig::MAX_RESPONSE_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_err(kind, e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JdexError::backend(
                kind.name(),
                format!("API returned {}: {}", status, body),
            ));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| JdexError::backend(kind.name(), format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| JdexError::backend(kind.name(), "Response had no choices"))
    }
}

#[async_trait]
impl CategorizationBackend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn classify(&self, text: &str, taxonomy: &Taxonomy) -> Result<ClassificationResult> {
        let prompt = build_prompt(text, taxonomy);
        let reply = self.complete(&prompt).await?;
        decode_reply(self.kind(), &reply)
    }
}
