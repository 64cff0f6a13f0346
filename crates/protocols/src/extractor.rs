use crate::error::ExtractionError;
use crate::page::{PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{Protocol, Snapshot};

/// Which kind of page an extractor is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageView {
    /// Portfolio page listing every position.
    Listing,
    /// Single-position (or single-vault) page.
    Detail,
}

/// Turns one protocol's page into a snapshot.
///
/// Extraction is a pure function of the page and the capture time: the
/// same document always yields the same snapshot.
pub trait Extractor: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Whether this extractor handles pages at `address`.
    fn detect(&self, address: &PageAddress) -> bool;

    fn view(&self, _address: &PageAddress) -> PageView {
        PageView::Listing
    }

    fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<Snapshot, ExtractionError>;
}

/// Fails with [`ExtractionError::EmptyPage`] when the page shows nothing.
pub(crate) fn ensure_content(page: &PageDocument) -> Result<(), ExtractionError> {
    if page.is_blank() {
        return Err(ExtractionError::EmptyPage);
    }
    Ok(())
}

/// Host check shared by all extractors.
pub(crate) fn host_matches(address: &PageAddress, markers: &[&str]) -> bool {
    markers.iter().any(|marker| address.host_contains(marker))
}
