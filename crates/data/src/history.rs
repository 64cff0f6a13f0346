//! Access to earlier captures for comparison.

use crate::cache::SnapshotCache;
use crate::error::DataResult;
use crate::repositories::{CaptureQuery, CaptureRepository};
use chrono::{DateTime, Utc};
use lp_watch_domain::{Capture, Protocol};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Repository plus cache, with a single write path that keeps them consistent.
pub struct CaptureHistory {
    repository: Arc<dyn CaptureRepository>,
    cache: SnapshotCache,
    /// How many recent captures to scan for a previous snapshot.
    history_limit: usize,
}

impl CaptureHistory {
    #[must_use]
    pub fn new(
        repository: Arc<dyn CaptureRepository>,
        cache: SnapshotCache,
        history_limit: usize,
    ) -> Self {
        Self {
            repository,
            cache,
            history_limit,
        }
    }

    pub fn repository(&self) -> &Arc<dyn CaptureRepository> {
        &self.repository
    }

    /// Stores a capture. The cache is invalidated whatever the outcome.
    ///
    /// # Errors
    /// Returns the repository error if the write failed.
    pub async fn record(&self, capture: &Capture) -> DataResult<()> {
        let result = self.repository.save(capture).await;
        self.cache.invalidate().await;
        result
    }

    /// Most recent capture for `protocol` with position data, other than `exclude`.
    ///
    /// Lookup failures are logged and reported as no previous capture.
    pub async fn previous_for(&self, protocol: Protocol, exclude: Uuid) -> Option<Capture> {
        let recent = match self.cache.get(protocol).await {
            Some(captures) => captures,
            None => {
                let query = CaptureQuery::for_protocol(protocol).limit(self.history_limit);
                match self.repository.query(&query).await {
                    Ok(captures) => {
                        self.cache.put(protocol, captures.clone()).await;
                        captures
                    }
                    Err(e) => {
                        warn!(protocol = %protocol, error = %e, "History lookup failed");
                        return None;
                    }
                }
            }
        };

        let previous = recent
            .into_iter()
            .find(|c| c.id != exclude && c.has_positions());
        debug!(protocol = %protocol, found = previous.is_some(), "Previous capture lookup");
        previous
    }

    /// Captures matching `query`, newest first. Always reads the repository.
    ///
    /// # Errors
    /// Returns an error if the repository query fails.
    pub async fn recent(&self, query: &CaptureQuery) -> DataResult<Vec<Capture>> {
        self.repository.query(query).await
    }

    /// Deletes captures older than `cutoff`. The cache is invalidated whatever the outcome.
    ///
    /// # Errors
    /// Returns the repository error if the delete failed.
    pub async fn prune(&self, cutoff: DateTime<Utc>) -> DataResult<u64> {
        let result = self.repository.delete_older_than(cutoff).await;
        self.cache.invalidate().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryCaptureRepository;
    use async_trait::async_trait;
    use chrono::Duration;
    use lp_watch_domain::{PortfolioSummary, Position, Snapshot};
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;

    fn capture(minutes_ago: i64, with_position: bool) -> Capture {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        let mut positions = Vec::new();
        if with_position {
            let mut p = Position::empty(at);
            p.pair = Some("SOL/USDC".to_string());
            p.balance = Some(dec!(100));
            positions.push(p);
        }
        let snapshot = Snapshot::new(PortfolioSummary::default(), positions, at);
        Capture::new("https://www.orca.so/portfolio", "Orca", Protocol::Orca, snapshot)
    }

    fn history(ttl: StdDuration) -> CaptureHistory {
        CaptureHistory::new(
            Arc::new(InMemoryCaptureRepository::new(100)),
            SnapshotCache::new(ttl),
            50,
        )
    }

    #[tokio::test]
    async fn test_previous_skips_current_and_empty_captures() {
        let history = history(StdDuration::from_secs(60));
        let older = capture(30, true);
        let empty = capture(10, false);
        let current = capture(0, true);
        for c in [&older, &empty, &current] {
            history.record(c).await.unwrap();
        }

        let previous = history.previous_for(Protocol::Orca, current.id).await;
        assert_eq!(previous.map(|c| c.id), Some(older.id));
        assert!(history.previous_for(Protocol::Cetus, current.id).await.is_none());
    }

    #[tokio::test]
    async fn test_record_invalidates_cached_history() {
        let history = history(StdDuration::from_secs(3600));
        let first = capture(30, true);
        history.record(&first).await.unwrap();

        // Warm the cache with only `first`.
        let unrelated = Uuid::new_v4();
        assert_eq!(
            history.previous_for(Protocol::Orca, unrelated).await.map(|c| c.id),
            Some(first.id)
        );

        let second = capture(5, true);
        history.record(&second).await.unwrap();
        assert_eq!(
            history.previous_for(Protocol::Orca, unrelated).await.map(|c| c.id),
            Some(second.id)
        );
    }

    struct FailingRepository;

    #[async_trait]
    impl CaptureRepository for FailingRepository {
        async fn save(&self, _capture: &Capture) -> DataResult<()> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn query(&self, _query: &CaptureQuery) -> DataResult<Vec<Capture>> {
            Err(std::io::Error::other("offline").into())
        }

        async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> DataResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_means_no_previous() {
        let history = CaptureHistory::new(
            Arc::new(FailingRepository),
            SnapshotCache::default(),
            50,
        );
        assert!(history.record(&capture(0, true)).await.is_err());
        assert!(
            history
                .previous_for(Protocol::Orca, Uuid::new_v4())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_prune_removes_old_captures() {
        let history = history(StdDuration::from_secs(60));
        history.record(&capture(60 * 24 * 45, true)).await.unwrap();
        let recent = capture(1, true);
        history.record(&recent).await.unwrap();

        let removed = history.prune(Utc::now() - Duration::days(30)).await.unwrap();
        assert_eq!(removed, 1);
        let left = history.recent(&CaptureQuery::default()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, recent.id);
    }
}
