//! The inbox polling loop.
//!
//! One pass ("scan") walks the inbox in name order and fully handles each
//! supported file before the next: hash, ledger check, extraction,
//! classification, organizing. Between passes the loop is idle for the poll
//! interval. A source file always ends up in exactly one place: the library,
//! the `_failed` quarantine next to the inbox, or still in the inbox.

mod analysis;

pub use analysis::Analyzer;

use crate::cancel::CancellationToken;
use crate::classify::CategorizationPipeline;
use crate::config::{is_supported_extension, IngestConfig};
use crate::extract::ExtractorChain;
use crate::library::{
    hash_file_async, move_file, naming, write_sidecar, Organizer, ProcessedLedger, SidecarKind,
};
use crate::settings::JdexConfig;
use crate::{JdexError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Observable state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Idle,
    Scanning,
}

/// What happened to one inbox file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IngestAction {
    /// Filed into the library.
    Organized { destination: PathBuf, jd_id: String },
    /// Content already known; the inbox copy was removed.
    Duplicate { existing: Option<PathBuf> },
    /// Extraction failed; moved to the quarantine directory.
    Quarantined { path: PathBuf, error: String },
    /// Analysis sidecar written; the file stays in the inbox.
    Analyzed { sidecar: PathBuf, jd_area: String, jd_category: String },
    /// Something else failed; the file stays in the inbox.
    Retained { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub source: PathBuf,
    #[serde(flatten)]
    pub action: IngestAction,
}

/// Summary of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub organized: usize,
    pub skipped_duplicates: usize,
    pub failed: usize,
    pub analyzed: usize,
    pub left_in_inbox: usize,
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    fn push(&mut self, source: PathBuf, action: IngestAction) {
        match &action {
            IngestAction::Organized { .. } => self.organized += 1,
            IngestAction::Duplicate { .. } => self.skipped_duplicates += 1,
            IngestAction::Quarantined { .. } => self.failed += 1,
            IngestAction::Analyzed { .. } => self.analyzed += 1,
            IngestAction::Retained { .. } => self.left_in_inbox += 1,
        }
        self.outcomes.push(IngestOutcome { source, action });
    }

    /// True if the pass touched nothing.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

pub struct IngestLoop {
    inbox: PathBuf,
    failed_dir: PathBuf,
    organizer: Organizer,
    ledger: ProcessedLedger,
    analyzer: Analyzer,
    poll_interval: Duration,
    state: watch::Sender<LoopState>,
}

impl IngestLoop {
    /// Keyword classification and the default extractors. Use
    /// [`from_config`](Self::from_config) for configured backends.
    pub fn new(library_root: impl Into<PathBuf>, inbox: impl Into<PathBuf>) -> Result<Self> {
        let inbox = inbox.into();
        let organizer = Organizer::open(library_root)?.with_inbox(&inbox);
        let ledger = ProcessedLedger::open(organizer.library_root());
        let (state, _) = watch::channel(LoopState::Idle);

        Ok(Self {
            failed_dir: failed_dir_for(&inbox),
            inbox,
            organizer,
            ledger,
            analyzer: Analyzer::new(
                ExtractorChain::default(),
                CategorizationPipeline::keywords_only(),
            ),
            poll_interval: IngestConfig::DEFAULT_POLL_INTERVAL,
            state,
        })
    }

    pub fn from_config(config: &JdexConfig) -> Result<Self> {
        Ok(Self::new(&config.library_dir, &config.inbox_dir)?
            .with_analyzer(Analyzer::from_config(config)?)
            .with_poll_interval(config.poll_interval))
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    pub fn failed_dir(&self) -> &Path {
        &self.failed_dir
    }

    pub fn organizer(&self) -> &Organizer {
        &self.organizer
    }

    pub fn ledger(&self) -> &ProcessedLedger {
        &self.ledger
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Receiver that observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// One full pass over the inbox.
    pub async fn run_once(&mut self) -> Result<IngestReport> {
        self.scan(None).await
    }

    /// Alternate scanning and idling until `cancel` fires. The file being
    /// processed when cancellation is requested is always finished.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        info!(
            "Watching {} every {:?}",
            self.inbox.display(),
            self.poll_interval
        );
        while !cancel.is_cancelled() {
            let report = self.scan(Some(cancel)).await?;
            if !report.is_empty() {
                info!(
                    "Pass finished: {} organized, {} duplicates, {} failed, {} left in inbox",
                    report.organized, report.skipped_duplicates, report.failed, report.left_in_inbox
                );
            }
            idle(self.poll_interval, cancel).await;
        }
        info!("Ingest loop stopped");
        Ok(())
    }

    /// Extract and classify every inbox file without an analysis sidecar,
    /// writing one next to it. Nothing is moved.
    pub async fn preprocess(&mut self) -> Result<IngestReport> {
        self.set_state(LoopState::Scanning);
        let result = self.preprocess_pass().await;
        self.set_state(LoopState::Idle);
        result
    }

    async fn preprocess_pass(&mut self) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for path in self.inbox_files()? {
            if let Ok(Some(_)) = crate::library::read_sidecar(&path, SidecarKind::Analysis) {
                debug!("{} already analysed", path.display());
                continue;
            }

            let action = match self
                .analyzer
                .analyze(&path, self.organizer.taxonomy(), None)
                .await
            {
                Ok(record) => match write_sidecar(&path, SidecarKind::Analysis, &record) {
                    Ok(sidecar) => IngestAction::Analyzed {
                        sidecar,
                        jd_area: record.classification.jd_area,
                        jd_category: record.classification.jd_category,
                    },
                    Err(e) => retained(&path, e),
                },
                Err(e) => retained(&path, e),
            };
            report.push(path, action);
        }
        Ok(report)
    }

    async fn scan(&mut self, cancel: Option<&CancellationToken>) -> Result<IngestReport> {
        self.set_state(LoopState::Scanning);
        let result = self.scan_pass(cancel).await;
        self.set_state(LoopState::Idle);
        result
    }

    async fn scan_pass(&mut self, cancel: Option<&CancellationToken>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for path in self.inbox_files()? {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                debug!("Cancelled between files");
                break;
            }
            let action = self.process_file(&path).await;
            report.push(path, action);
        }
        Ok(report)
    }

    async fn process_file(&mut self, path: &Path) -> IngestAction {
        let hash = match hash_file_async(path).await {
            Ok(hash) => hash,
            Err(e) => return retained(path, e),
        };

        if let Some(entry) = self.ledger.get(&hash) {
            let existing = Some(PathBuf::from(&entry.destination));
            info!("{} was processed before, removing", path.display());
            return remove_duplicate(path, existing);
        }
        if let Some(existing) = self.organizer.find_duplicate(&hash, path) {
            info!("{} is already filed at {}", path.display(), existing.display());
            return remove_duplicate(path, Some(existing));
        }

        let extraction = match self.analyzer.extract(path).await {
            Ok(extraction) => extraction,
            Err(e) => return self.quarantine(path, e),
        };

        let classification = self
            .analyzer
            .pipeline()
            .classify(&extraction.text, self.organizer.taxonomy(), None)
            .await;

        match self
            .organizer
            .organize(path, &classification, &extraction.text)
        {
            Ok(outcome) => {
                let original = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.ledger.record(&outcome.hash, &original, &outcome.destination);
                if let Err(e) = self.ledger.save() {
                    warn!("Failed to save processed-file ledger: {}", e);
                }
                IngestAction::Organized {
                    destination: outcome.destination,
                    jd_id: outcome.jd_id,
                }
            }
            Err(JdexError::Duplicate { existing, .. }) => remove_duplicate(path, Some(existing)),
            Err(e) => retained(path, e),
        }
    }

    fn quarantine(&self, path: &Path, cause: JdexError) -> IngestAction {
        warn!("Quarantining {}: {}", path.display(), cause);
        let result = std::fs::create_dir_all(&self.failed_dir)
            .map_err(|e| JdexError::io_with_path(e, &self.failed_dir))
            .and_then(|()| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let target = naming::unique_destination(&self.failed_dir, &name);
                move_file(path, &target).map(|()| target)
            });

        match result {
            Ok(target) => IngestAction::Quarantined {
                path: target,
                error: cause.to_string(),
            },
            Err(e) => retained(path, e),
        }
    }

    /// Regular, non-hidden files with a supported extension, sorted by name.
    fn inbox_files(&self) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.inbox)
            .map_err(|e| JdexError::io_with_path(e, &self.inbox))?;

        let entries =
            std::fs::read_dir(&self.inbox).map_err(|e| JdexError::io_with_path(e, &self.inbox))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| {
                let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                if name.starts_with('.') {
                    return false;
                }
                let supported = p
                    .extension()
                    .map(|e| is_supported_extension(&e.to_string_lossy()))
                    .unwrap_or(false);
                if !supported {
                    debug!("Ignoring unsupported file {}", p.display());
                }
                supported
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn set_state(&self, state: LoopState) {
        self.state.send_replace(state);
    }
}

/// `<inbox parent>/_failed`.
pub fn failed_dir_for(inbox: &Path) -> PathBuf {
    match inbox.parent() {
        Some(parent) => parent.join(IngestConfig::FAILED_DIR_NAME),
        None => inbox.join(IngestConfig::FAILED_DIR_NAME),
    }
}

fn retained(path: &Path, cause: JdexError) -> IngestAction {
    error!("Leaving {} in the inbox: {}", path.display(), cause);
    IngestAction::Retained {
        error: cause.to_string(),
    }
}

fn remove_duplicate(path: &Path, existing: Option<PathBuf>) -> IngestAction {
    match std::fs::remove_file(path) {
        Ok(()) => IngestAction::Duplicate { existing },
        Err(e) => retained(path, JdexError::io_with_path(e, path)),
    }
}

/// Sleep for `interval`, waking early once `cancel` fires.
async fn idle(interval: Duration, cancel: &CancellationToken) {
    const SLICE: Duration = Duration::from_millis(250);
    let mut remaining = interval;
    while !remaining.is_zero() && !cancel.is_cancelled() {
        let step = remaining.min(SLICE);
        tokio::time::sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
}
