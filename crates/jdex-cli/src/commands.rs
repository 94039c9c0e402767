//! Subcommand dispatch.

use crate::Command;
use anyhow::{bail, Context, Result};
use jdex_core::ingest::IngestLoop;
use jdex_core::taxonomy::{self, templates, JdexDocument, Taxonomy};
use jdex_core::{
    CancellationToken, ConfigOverrides, JdexApi, JdexApiBuilder, JdexConfig, Settings,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

pub async fn run(command: Command, overrides: &ConfigOverrides) -> Result<()> {
    // Commands that never touch a library
    match &command {
        Command::Templates => return print_json(&templates::list()),
        Command::Validate { file: Some(path) } => return validate_file(path),
        _ => {}
    }

    let config = resolve_config(overrides)?;
    info!("Library: {}", config.library_dir.display());

    match command {
        Command::Ingest { once, .. } => {
            let mut ingest = IngestLoop::from_config(&config)?;
            if once {
                let report = ingest.run_once().await?;
                return print_json(&report);
            }

            let cancel = CancellationToken::new();
            let handle = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, finishing current document");
                    handle.cancel();
                }
            });
            ingest.run(&cancel).await?;
            Ok(())
        }
        Command::Preprocess => {
            let mut ingest = IngestLoop::from_config(&config)?;
            print_json(&ingest.preprocess().await?)
        }
        Command::Init { template, force } => {
            let api = JdexApiBuilder::from_config(&config)?
                .auto_create_dirs(true)
                .build()
                .await?;
            api.init_from_template(&template, force).await?;
            print_json(&api.areas().await)
        }
        command => {
            let api = JdexApiBuilder::from_config(&config)?.build().await?;
            run_api_command(&api, command).await
        }
    }
}

async fn run_api_command(api: &JdexApi, command: Command) -> Result<()> {
    match command {
        Command::Analyze { file, force } => print_json(&api.analyze_file(&file, force, None).await?),
        Command::Move {
            file,
            area,
            category,
        } => print_json(&api.move_file(&file, &area, &category).await?),
        Command::Delete { file } => print_json(&api.delete_file(&file).await?),
        Command::List { folder, recursive } => {
            print_json(&api.list_files(folder.as_deref(), recursive).await?)
        }
        Command::RebuildIndex { fresh } => print_json(&api.rebuild_hash_index(fresh).await?),
        Command::Validate { file: None } => {
            let report = api.validate_taxonomy().await;
            print_json(&report)?;
            if !report.is_ok() {
                bail!("taxonomy has {} violation(s)", report.violations.len());
            }
            Ok(())
        }
        Command::Backends => print_json(&api.list_backends().await),
        other => bail!("unsupported command: {:?}", other),
    }
}

fn resolve_config(overrides: &ConfigOverrides) -> Result<JdexConfig> {
    let settings = match Settings::default_path() {
        Ok(path) => Settings::load(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        Err(e) => {
            warn!("Using default settings: {}", e);
            Settings::default()
        }
    };
    Ok(JdexConfig::from_env(overrides, &settings)?)
}

/// Validate a `jdex.json` document or a bare area map.
fn validate_file(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let taxonomy: Taxonomy = if value.get("areas").is_some_and(|a| a.is_object()) {
        serde_json::from_value::<JdexDocument>(value)?.areas
    } else {
        serde_json::from_value(value)?
    };

    let report = taxonomy::validate(&taxonomy);
    print_json(&report)?;
    if !report.is_ok() {
        bail!("taxonomy has {} violation(s)", report.violations.len());
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_file_accepts_document_and_bare_map() {
        let tmp = TempDir::new().unwrap();
        let areas = serde_json::json!({
            "10-19 Finance": {
                "description": "Money",
                "categories": {"11 Banking": {"description": "", "keywords": ["bank"]}}
            }
        });

        let bare = tmp.path().join("areas.json");
        std::fs::write(&bare, areas.to_string()).unwrap();
        assert!(validate_file(&bare).is_ok());

        let document = tmp.path().join("jdex.json");
        std::fs::write(&document, serde_json::json!({"areas": areas}).to_string()).unwrap();
        assert!(validate_file(&document).is_ok());
    }

    #[test]
    fn test_validate_file_reports_violations() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jdex.json");
        let areas = serde_json::json!({
            "areas": {
                "10-19 Finance": {
                    "description": "",
                    "categories": {"25 Misplaced": {"description": "", "keywords": []}}
                }
            }
        });
        std::fs::write(&path, areas.to_string()).unwrap();

        assert!(validate_file(&path).is_err());
        assert!(validate_file(&tmp.path().join("missing.json")).is_err());
    }
}
