//! Anthropic Messages API backend.

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
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

pub struct AnthropicBackend {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        let timeout = NetworkConfig::API_TIMEOUT;
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: NetworkConfig::ANTHROPIC_API_BASE.to_string(),
            timeout,
            client: http_client(timeout)?,
        })
    }

    /// Point the backend at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let kind = self.kind();
        let api_key = self.api_key.as_deref().ok_or_else(|| JdexError::BackendUnavailable {
            backend: kind.name().to_string(),
        })?;

        let url = format!("{}/v1/messages", self.base_url);
        debug!("Requesting classification from {} with model {}", url, self.model);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: ClassifierConfig::MAX_RESPONSE_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", NetworkConfig::ANTHROPIC_API_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| JdexError::backend(kind.name(), format!("Failed to parse response: {}", e)))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text" || block.block_type.is_empty())
            .map(|block| block.text)
            .ok_or_else(|| JdexError::backend(kind.name(), "Response had no text content"))
    }
}

#[async_trait]
impl CategorizationBackend for AnthropicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anthropic
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::templates;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> AnthropicBackend {
        AnthropicBackend::new(Some("sk-ant-test".into()), "claude-test")
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_availability_follows_api_key() {
        assert!(!AnthropicBackend::new(None, "m").unwrap().is_available().await);
        assert!(!AnthropicBackend::new(Some("  ".into()), "m").unwrap().is_available().await);
        assert!(AnthropicBackend::new(Some("k".into()), "m").unwrap().is_available().await);
    }

    #[tokio::test]
    async fn test_classify_sends_key_and_decodes_fenced_reply() {
        let server = MockServer::start().await;
        let reply = "```json\n{\"jd_area\": \"10-19 Finance\", \"jd_category\": \"14 Receipts\", \"issuer\": \"Amazon\", \"document_type\": \"Laptop Receipt\"}\n```";
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": reply}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = backend(&server)
            .classify("Amazon receipt", &templates::default_taxonomy())
            .await
            .unwrap();
        assert_eq!(result.jd_category, "14 Receipts");
        assert_eq!(result.document_type, "Laptop Receipt");
    }

    #[tokio::test]
    async fn test_http_error_is_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .classify("text", &templates::default_taxonomy())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overloaded"));
        assert_eq!(err.error_code(), "backend");
    }
}
