//! Local model backend talking to an Ollama server.
//!
//! The base URL is restricted to loopback hosts; anything else is replaced by
//! the default local URL so configuration cannot point document text at a
//! remote server.

use super::backend::{decode_reply, http_client, request_err, BackendKind, CategorizationBackend};
use super::prompt::build_prompt;
use super::types::ClassificationResult;
use crate::config::{ClassifierConfig, NetworkConfig};
use crate::taxonomy::Taxonomy;
use crate::{JdexError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaBackend {
    base_url: String,
    model: String,
    timeout: Duration,
    /// Short-timeout client for the `/api/tags` probe.
    probe_client: reqwest::Client,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let timeout = NetworkConfig::LOCAL_MODEL_TIMEOUT;
        Ok(Self {
            base_url: restrict_to_loopback(base_url),
            model: model.into(),
            timeout,
            probe_client: http_client(NetworkConfig::LOCAL_MODEL_PROBE_TIMEOUT)?,
            client: http_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Return `url` if its host is a loopback name, otherwise the default URL.
pub fn restrict_to_loopback(url: &str) -> String {
    let host = Url::parse(url).ok().and_then(|u| {
        u.host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
    });

    match host {
        Some(host) if NetworkConfig::OLLAMA_ALLOWED_HOSTS.contains(&host.as_str()) => {
            url.trim_end_matches('/').to_string()
        }
        other => {
            warn!(
                "Ollama URL must be localhost, got {:?}; using {}",
                other.unwrap_or_default(),
                NetworkConfig::OLLAMA_DEFAULT_URL
            );
            NetworkConfig::OLLAMA_DEFAULT_URL.to_string()
        }
    }
}

#[async_trait]
impl CategorizationBackend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.probe_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Ollama probe at {} failed: {}", url, e);
                false
            }
        }
    }

    async fn classify(&self, text: &str, taxonomy: &Taxonomy) -> Result<ClassificationResult> {
        let kind = self.kind();
        let prompt = build_prompt(text, taxonomy);
        let url = format!("{}/api/generate", self.base_url);
        debug!("Requesting classification from {} with model {}", url, self.model);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: ClassifierConfig::MAX_RESPONSE_TOKENS,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_err(kind, e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JdexError::backend(
                kind.name(),
                format!("Ollama returned {}: {}", status, body),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| JdexError::backend(kind.name(), format!("Failed to parse response: {}", e)))?;

        decode_reply(kind, &parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::templates;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_loopback_restriction() {
        assert_eq!(
            restrict_to_loopback("http://127.0.0.1:11500/"),
            "http://127.0.0.1:11500"
        );
        assert_eq!(
            restrict_to_loopback("http://localhost:11434"),
            "http://localhost:11434"
        );
        assert_eq!(restrict_to_loopback("http://[::1]:11434"), "http://[::1]:11434");
        assert_eq!(
            restrict_to_loopback("http://evil.example.com:11434"),
            "http://localhost:11434"
        );
        assert_eq!(restrict_to_loopback("not a url"), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_probe_and_generate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-test",
                "stream": false,
                "options": {"num_predict": 500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "{\"jd_area\": \"20-29 Medical\", \"jd_category\": \"21 Records\", \"issuer\": \"City Hospital\"}",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OllamaBackend::new(&server.uri(), "llama-test").unwrap();
        assert_eq!(backend.base_url(), server.uri());
        assert!(backend.is_available().await);

        let result = backend
            .classify("blood test", &templates::default_taxonomy())
            .await
            .unwrap();
        assert_eq!(result.jd_category, "21 Records");
        assert_eq!(result.issuer, "City Hospital");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let backend = OllamaBackend::new(&uri, "llama-test").unwrap();
        assert!(!backend.is_available().await);
    }
}
