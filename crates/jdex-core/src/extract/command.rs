use super::{extension, ExtractionOutput, TextExtractor};
use crate::config::IngestConfig;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Placeholder in `args` replaced by the document path.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Runs an external tool that prints the document's text on stdout.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    name: String,
    program: String,
    args: Vec<String>,
    extensions: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    /// `args` may contain [`INPUT_PLACEHOLDER`]; without it the path is
    /// appended as the last argument.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: &[&str],
        extensions: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            timeout: IngestConfig::EXTRACTOR_TIMEOUT,
        }
    }

    /// `pdftotext -layout <file> -` (poppler).
    pub fn pdftotext() -> Self {
        Self::new("pdftotext", "pdftotext", &["-layout", INPUT_PLACEHOLDER, "-"], &["pdf"])
    }

    /// `tesseract <file> stdout` for scanned images.
    pub fn tesseract() -> Self {
        Self::new(
            "tesseract",
            "tesseract",
            &[INPUT_PLACEHOLDER, "stdout"],
            &["png", "jpg", "jpeg", "tiff", "bmp"],
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        let mut substituted = false;
        for arg in &self.args {
            if arg == INPUT_PLACEHOLDER {
                cmd.arg(path);
                substituted = true;
            } else {
                cmd.arg(arg);
            }
        }
        if !substituted {
            cmd.arg(path);
        }
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, path: &Path) -> bool {
        self.extensions.contains(&extension(path))
    }

    async fn extract(&self, path: &Path) -> ExtractionOutput {
        let run = self.command(path).output();
        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ExtractionOutput::failed(format!("Failed to run {}: {}", self.program, e))
            }
            Err(_) => {
                return ExtractionOutput::failed(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                ))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return ExtractionOutput::failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("{} extracted {} chars from {}", self.name, text.len(), path.display());
        ExtractionOutput::ok(text).with_metadata("extractor", self.name.clone())
    }
}
