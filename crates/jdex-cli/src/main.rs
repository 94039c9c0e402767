//! jdex - file documents into a Johnny.Decimal library.
//!
//! Thin driver over `jdex-core`: parses arguments, sets up logging on stderr,
//! resolves configuration and prints command results to stdout as JSON.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jdex_core::ConfigOverrides;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "jdex")]
#[command(about = "Classify and file documents into a Johnny.Decimal library")]
#[command(version)]
struct Args {
    /// Library root (default: settings, OUTPUT_DIR, ~/Documents/jd_documents)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Inbox directory (default: <library>/00-09 System/01 Inbox)
    #[arg(long, global = true)]
    inbox: Option<PathBuf>,

    /// Categorization backend: auto, claude-code, anthropic, openai, ollama, keywords
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Watch the inbox and file every new document
    Ingest {
        /// Process the inbox once and exit
        #[arg(long)]
        once: bool,

        /// Seconds between inbox scans
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Analyze inbox documents for review without moving them
    Preprocess,
    /// Extract and classify one document
    Analyze {
        file: PathBuf,

        /// Ignore a cached analysis
        #[arg(long)]
        force: bool,
    },
    /// File a document under an explicit area and category
    Move {
        file: PathBuf,

        #[arg(long)]
        area: String,

        #[arg(long)]
        category: String,
    },
    /// Delete a document and its sidecars
    Delete { file: PathBuf },
    /// List documents in a folder (default: the inbox)
    List {
        folder: Option<PathBuf>,

        #[arg(short, long)]
        recursive: bool,
    },
    /// Re-hash the library and rewrite the duplicate index
    RebuildIndex {
        /// Discard existing entries instead of merging
        #[arg(long)]
        fresh: bool,
    },
    /// Check a taxonomy against the numbering rules
    Validate {
        /// A jdex.json or bare taxonomy file (default: the library's taxonomy)
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Create the library taxonomy and folders from a template
    Init {
        #[arg(long, value_name = "KEY")]
        template: String,

        /// Replace an existing taxonomy
        #[arg(long)]
        force: bool,
    },
    /// List the built-in taxonomy templates
    Templates,
    /// Report which categorization backends are available
    Backends,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let poll_interval = match &self.command {
            Command::Ingest {
                interval: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        };
        ConfigOverrides {
            library_dir: self.library.clone(),
            inbox_dir: self.inbox.clone(),
            provider: self.backend.clone(),
            poll_interval,
            ..Default::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides --debug
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    let overrides = args.overrides();
    commands::run(args.command, &overrides).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_flags() {
        let args = Args::try_parse_from(["jdex", "ingest", "--once", "--interval", "30"]).unwrap();
        assert_eq!(
            args.command,
            Command::Ingest {
                once: true,
                interval: Some(30)
            }
        );
        assert_eq!(args.overrides().poll_interval, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "jdex",
            "list",
            "--recursive",
            "--library",
            "/tmp/lib",
            "--backend",
            "keywords",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.library_dir, Some(PathBuf::from("/tmp/lib")));
        assert_eq!(overrides.provider.as_deref(), Some("keywords"));
        assert_eq!(overrides.poll_interval, None);
        assert_eq!(
            args.command,
            Command::List {
                folder: None,
                recursive: true
            }
        );
    }

    #[test]
    fn test_move_requires_area_and_category() {
        assert!(Args::try_parse_from(["jdex", "move", "scan.pdf", "--area", "10-19 Finance"]).is_err());

        let args = Args::try_parse_from([
            "jdex",
            "move",
            "scan.pdf",
            "--area",
            "10-19 Finance",
            "--category",
            "14 Receipts",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Move {
                file: PathBuf::from("scan.pdf"),
                area: "10-19 Finance".to_string(),
                category: "14 Receipts".to_string(),
            }
        );
    }

    #[test]
    fn test_kebab_case_subcommands() {
        let args = Args::try_parse_from(["jdex", "rebuild-index", "--fresh"]).unwrap();
        assert_eq!(args.command, Command::RebuildIndex { fresh: true });

        let args = Args::try_parse_from(["jdex", "init", "--template", "personal"]).unwrap();
        assert_eq!(
            args.command,
            Command::Init {
                template: "personal".to_string(),
                force: false
            }
        );
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Args::try_parse_from(["jdex"]).is_err());
        assert!(Args::try_parse_from(["jdex", "init"]).is_err());
    }
}
