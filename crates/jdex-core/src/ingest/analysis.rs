//! Extraction followed by classification, without moving anything.

use crate::classify::{BackendKind, CategorizationPipeline};
use crate::extract::{ExtractionOutput, ExtractorChain};
use crate::library::{hash_file_async, DocumentRecord};
use crate::settings::JdexConfig;
use crate::taxonomy::Taxonomy;
use crate::Result;
use std::path::Path;

/// Turns a document into a [`DocumentRecord`]: text plus classification.
pub struct Analyzer {
    extractors: ExtractorChain,
    pipeline: CategorizationPipeline,
}

impl Analyzer {
    pub fn new(extractors: ExtractorChain, pipeline: CategorizationPipeline) -> Self {
        Self {
            extractors,
            pipeline,
        }
    }

    /// Default extractors and every configured backend.
    pub fn from_config(config: &JdexConfig) -> Result<Self> {
        Ok(Self::new(
            ExtractorChain::default(),
            CategorizationPipeline::from_config(config)?,
        ))
    }

    pub fn pipeline(&self) -> &CategorizationPipeline {
        &self.pipeline
    }

    pub fn extractors(&self) -> &ExtractorChain {
        &self.extractors
    }

    /// Extract text, failing with `Extraction` when nothing usable comes out.
    pub async fn extract(&self, path: &Path) -> Result<ExtractionOutput> {
        self.extractors.extract(path).await
    }

    /// Extract and classify `path`. Classification itself cannot fail.
    pub async fn analyze(
        &self,
        path: &Path,
        taxonomy: &Taxonomy,
        hint: Option<BackendKind>,
    ) -> Result<DocumentRecord> {
        let extraction = self.extract(path).await?;
        let classification = self.pipeline.classify(&extraction.text, taxonomy, hint).await;

        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut record = DocumentRecord::analysis(&original_filename, classification, &extraction.text);
        record.file_hash = Some(hash_file_async(path).await?);
        record.extraction_metadata = extraction.metadata;
        Ok(record)
    }
}
