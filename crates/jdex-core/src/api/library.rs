//! Taxonomy and index maintenance on JdexApi.

use super::JdexApi;
use crate::classify::BackendStatus;
use crate::library::RebuildSummary;
use crate::taxonomy::{self, templates, Category, GenerationMethod, Taxonomy, ValidationReport};
use crate::{JdexError, Result};
use std::collections::BTreeMap;

impl JdexApi {
    // ========================================
    // Taxonomy
    // ========================================

    /// The effective taxonomy (the built-in default when none is saved).
    pub async fn areas(&self) -> Taxonomy {
        self.organizer.lock().await.taxonomy().clone()
    }

    /// Check the current taxonomy against the numbering rules.
    pub async fn validate_taxonomy(&self) -> ValidationReport {
        taxonomy::validate(self.organizer.lock().await.taxonomy())
    }

    /// Create the taxonomy from a built-in template and its folder tree.
    ///
    /// An existing taxonomy document is only replaced with `force`.
    pub async fn init_from_template(&self, key: &str, force: bool) -> Result<()> {
        let mut organizer = self.organizer.lock().await;
        let template = templates::get(key).ok_or_else(|| JdexError::InvalidParams {
            message: format!("Unknown template: {}", key),
        })?;

        let store = organizer.taxonomy_store_mut();
        if store.exists() && !force {
            return Err(JdexError::Config {
                message: format!("Taxonomy already exists at {}", store.path().display()),
            });
        }

        let mut context = BTreeMap::new();
        context.insert("template".to_string(), template.key.to_string());
        store.create_from_structure(template.taxonomy(), GenerationMethod::Template, context)?;
        store.create_folders()
    }

    /// Add an area; rejected wholesale if the taxonomy would become invalid.
    pub async fn add_area(
        &self,
        name: &str,
        description: &str,
        categories: BTreeMap<String, Category>,
        reason: &str,
    ) -> Result<()> {
        let mut organizer = self.organizer.lock().await;
        organizer
            .taxonomy_store_mut()
            .add_area(name, description, categories, reason)
    }

    /// Add a category; rejected wholesale if the taxonomy would become invalid.
    pub async fn add_category(
        &self,
        area: &str,
        name: &str,
        description: &str,
        keywords: Vec<String>,
        reason: &str,
    ) -> Result<()> {
        let mut organizer = self.organizer.lock().await;
        organizer
            .taxonomy_store_mut()
            .add_category(area, name, description, keywords, reason)
    }

    // ========================================
    // Indexes and backends
    // ========================================

    /// Re-hash the whole library (the inbox excluded).
    pub async fn rebuild_hash_index(&self, fresh: bool) -> Result<RebuildSummary> {
        let mut organizer = self.organizer.lock().await;
        let inbox = self.inbox_dir.clone();
        organizer.duplicate_index_mut().rebuild(Some(&inbox), fresh)
    }

    pub async fn list_backends(&self) -> Vec<BackendStatus> {
        self.analyzer.pipeline().list_backends().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn api() -> (TempDir, JdexApi) {
        let temp_dir = TempDir::new().unwrap();
        let api = JdexApi::builder(temp_dir.path())
            .auto_create_dirs(true)
            .build()
            .await
            .unwrap();
        (temp_dir, api)
    }

    #[tokio::test]
    async fn test_init_from_template_creates_folders() {
        let (tmp, api) = api().await;
        api.init_from_template("freelance", false).await.unwrap();

        assert!(tmp.path().join("jdex.json").exists());
        let areas = api.areas().await;
        for category in areas.categories() {
            assert!(tmp.path().join(category.area).join(category.category).is_dir());
        }
        assert!(api.validate_taxonomy().await.is_ok());

        assert!(api.init_from_template("personal", false).await.is_err());
        api.init_from_template("personal", true).await.unwrap();
        assert!(api.areas().await.contains("10-19 Finance", "14 Receipts"));
    }

    #[tokio::test]
    async fn test_unknown_template() {
        let (_tmp, api) = api().await;
        assert!(matches!(
            api.init_from_template("nope", false).await,
            Err(JdexError::InvalidParams { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_category_validated() {
        let (_tmp, api) = api().await;
        api.init_from_template("personal", false).await.unwrap();

        api.add_category("10-19 Finance", "15 Pensions", "Pension statements", vec!["pension".into()], "user request")
            .await
            .unwrap();
        let err = api
            .add_category("10-19 Finance", "25 Misplaced", "", Vec::new(), "user request")
            .await
            .unwrap_err();
        assert!(matches!(err, JdexError::Validation { .. }));
        assert!(!api.areas().await.contains("10-19 Finance", "25 Misplaced"));
    }

    #[tokio::test]
    async fn test_backends_always_include_keywords() {
        let (_tmp, api) = api().await;
        let backends = api.list_backends().await;
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].name, "keywords");
        assert!(backends[0].available);
    }
}
