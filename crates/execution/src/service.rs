//! Capture orchestration.
//!
//! One capture is: detect the protocol, extract a snapshot, store it,
//! validate it and compare it with the previous snapshot of the same
//! protocol. Nothing after detection aborts a capture; extraction and
//! storage failures are carried in the result.

use crate::config::CaptureConfig;
use chrono::{Duration, Utc};
use lp_watch_analysis::{PortfolioStats, SnapshotComparator, SnapshotValidator, latest_positions};
use lp_watch_data::{
    CaptureHistory, CaptureQuery, CaptureRepository, DataResult, SnapshotCache,
};
use lp_watch_domain::{
    Capture, ComparisonReport, PositionRecord, Protocol, Snapshot, ValidationReport,
};
use lp_watch_protocols::{ExtractionFailure, PageDocument, ProtocolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything produced by capturing one supported page.
#[derive(Debug)]
pub struct CaptureReport {
    pub capture: Capture,
    pub validation: ValidationReport,
    /// `None` when there is no earlier snapshot to compare with.
    pub comparison: Option<ComparisonReport>,
    /// Set when the extractor failed and the snapshot is empty.
    pub failure: Option<ExtractionFailure>,
    /// Whether the capture reached the store.
    pub stored: bool,
}

impl CaptureReport {
    pub fn protocol(&self) -> Protocol {
        self.capture.protocol
    }
}

/// Result of [`CaptureService::capture`].
#[derive(Debug)]
pub enum CaptureOutcome {
    Captured(Box<CaptureReport>),
    /// No extractor recognises the page; nothing was extracted or stored.
    Unsupported { url: String },
}

impl CaptureOutcome {
    pub fn report(&self) -> Option<&CaptureReport> {
        match self {
            CaptureOutcome::Captured(report) => Some(&**report),
            CaptureOutcome::Unsupported { .. } => None,
        }
    }
}

/// Outcomes of a sequence of captures.
#[derive(Debug, Default)]
pub struct SessionReport {
    pub outcomes: Vec<CaptureOutcome>,
}

impl SessionReport {
    pub fn reports(&self) -> impl Iterator<Item = &CaptureReport> {
        self.outcomes.iter().filter_map(CaptureOutcome::report)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExtractionFailure> {
        self.reports().filter_map(|r| r.failure.as_ref())
    }

    pub fn unsupported(&self) -> usize {
        self.outcomes.len() - self.reports().count()
    }
}

/// Runs captures against a registry and a capture store.
pub struct CaptureService {
    registry: ProtocolRegistry,
    history: CaptureHistory,
    validator: SnapshotValidator,
    comparator: SnapshotComparator,
    config: CaptureConfig,
}

impl CaptureService {
    /// Creates a service over `repository` with the default extractors.
    pub fn new(repository: Arc<dyn CaptureRepository>, config: CaptureConfig) -> Self {
        Self::with_registry(ProtocolRegistry::with_defaults(), repository, config)
    }

    pub fn with_registry(
        registry: ProtocolRegistry,
        repository: Arc<dyn CaptureRepository>,
        config: CaptureConfig,
    ) -> Self {
        let cache = SnapshotCache::new(config.cache_ttl());
        let history = CaptureHistory::new(repository, cache, config.history_limit);
        Self {
            registry,
            history,
            validator: SnapshotValidator::new(),
            comparator: SnapshotComparator::new(),
            config,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn history(&self) -> &CaptureHistory {
        &self.history
    }

    /// Captures one page.
    pub async fn capture(&self, page: &PageDocument) -> CaptureOutcome {
        let address = page.address();
        let Some(extractor) = self.registry.detect(address) else {
            info!(url = %address, "No extractor for page");
            return CaptureOutcome::Unsupported {
                url: address.as_str().to_string(),
            };
        };

        let protocol = extractor.protocol();
        let captured_at = Utc::now();

        let (snapshot, failure) = match extractor.extract(page, captured_at) {
            Ok(snapshot) => (snapshot, None),
            Err(error) => {
                let failure = ExtractionFailure::new(protocol, error);
                warn!(%protocol, url = %address, error = %failure.error, "Extraction failed");
                (Snapshot::empty(captured_at), Some(failure))
            }
        };

        let mut capture = Capture::new(address.as_str(), page.title(), protocol, snapshot);
        if let Some(failure) = &failure {
            capture = capture.with_extraction_error(failure.to_string());
        }

        let validation = self.validator.validate(&capture.snapshot);
        if !validation.passed {
            for issue in &validation.issues {
                warn!(%protocol, finding = %issue, "Validation issue");
            }
        }

        let stored = match self.history.record(&capture).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%protocol, id = %capture.id, error = %e, "Failed to store capture");
                false
            }
        };

        let previous = self.history.previous_for(protocol, capture.id).await;
        let comparison = self
            .comparator
            .compare(&capture.snapshot, previous.as_ref().map(|c| &c.snapshot));

        info!(
            %protocol,
            id = %capture.id,
            positions = capture.snapshot.position_count,
            issues = validation.issues.len(),
            warnings = validation.warnings.len(),
            critical = comparison.as_ref().map_or(0, |c| c.critical_changes.len()),
            stored,
            "Captured page"
        );

        CaptureOutcome::Captured(Box::new(CaptureReport {
            capture,
            validation,
            comparison,
            failure,
            stored,
        }))
    }

    /// Captures pages one after another. A failing page never stops the session.
    pub async fn capture_session(&self, pages: &[PageDocument]) -> SessionReport {
        let mut session = SessionReport::default();
        for page in pages {
            session.outcomes.push(self.capture(page).await);
        }
        debug!(
            pages = pages.len(),
            failures = session.failures().count(),
            unsupported = session.unsupported(),
            "Capture session finished"
        );
        session
    }

    /// Stored captures matching `query`, newest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn captures(&self, query: &CaptureQuery) -> DataResult<Vec<Capture>> {
        self.history.recent(query).await
    }

    /// Latest position per protocol and pair, with aggregate statistics.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn portfolio(&self) -> DataResult<(Vec<PositionRecord>, PortfolioStats)> {
        let captures = self.history.recent(&CaptureQuery::default()).await?;
        let latest = latest_positions(&captures);
        let stats = PortfolioStats::from_positions(&latest);
        Ok((latest, stats))
    }

    /// Deletes captures older than `days` days.
    ///
    /// # Errors
    /// Returns an error if the store rejects the delete.
    pub async fn prune(&self, days: i64) -> DataResult<u64> {
        let cutoff = Utc::now() - Duration::days(days);
        let removed = self.history.prune(cutoff).await?;
        info!(days, removed, "Pruned old captures");
        Ok(removed)
    }
}
