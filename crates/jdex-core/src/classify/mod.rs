//! Document categorization: backends, the fallback pipeline, and the
//! decoder for free-form model replies.

mod anthropic;
mod backend;
mod claude_cli;
pub mod decode;
mod keyword;
mod ollama;
mod openai;
mod pipeline;
pub mod prompt;
mod types;

pub use anthropic::AnthropicBackend;
pub use backend::{BackendKind, BackendStatus, CategorizationBackend};
pub use claude_cli::ClaudeCliBackend;
pub use keyword::KeywordBackend;
pub use ollama::{restrict_to_loopback, OllamaBackend};
pub use openai::OpenAiBackend;
pub use pipeline::{reconcile, CategorizationPipeline};
pub use types::{ClassificationResult, Confidence};
