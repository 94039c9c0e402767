//! Subscription CLI backend: runs `claude --print <prompt>`.

use super::backend::{decode_reply, BackendKind, CategorizationBackend};
use super::prompt::build_prompt;
use super::types::ClassificationResult;
use crate::config::NetworkConfig;
use crate::taxonomy::Taxonomy;
use crate::{JdexError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// `command` may carry leading arguments (`"npx claude"`); it is split on
/// whitespace.
#[derive(Debug, Clone)]
pub struct ClaudeCliBackend {
    command: String,
    probe_timeout: Duration,
    timeout: Duration,
}

impl ClaudeCliBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            probe_timeout: NetworkConfig::CLI_PROBE_TIMEOUT,
            timeout: NetworkConfig::CLI_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> Command {
        let mut parts = self.command.split_whitespace();
        let mut cmd = Command::new(parts.next().unwrap_or_default());
        cmd.args(parts)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CategorizationBackend for ClaudeCliBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ClaudeCode
    }

    async fn is_available(&self) -> bool {
        let mut cmd = self.command();
        let probe = cmd
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!("{} probe failed: {}", self.command, e);
                false
            }
            Err(_) => {
                debug!("{} probe timed out", self.command);
                false
            }
        }
    }

    async fn classify(&self, text: &str, taxonomy: &Taxonomy) -> Result<ClassificationResult> {
        let prompt = build_prompt(text, taxonomy);
        let kind = self.kind();

        let mut cmd = self.command();
        let run = cmd.arg("--print").arg(&prompt).output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| JdexError::Timeout(self.timeout))?
            .map_err(|e| JdexError::backend(kind.name(), format!("Failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JdexError::backend(
                kind.name(),
                format!("{} exited with {}: {}", self.command, output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{} replied with {} bytes", self.command, stdout.len());
        decode_reply(kind, &stdout)
    }
}
