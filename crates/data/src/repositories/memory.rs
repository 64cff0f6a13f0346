//! In-memory capture store with optional JSON file persistence.

use super::{CaptureQuery, CaptureRepository};
use crate::error::DataResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lp_watch_domain::Capture;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Keeps the most recent captures in memory, newest first.
///
/// When opened on a file, every write rewrites the file with the full set.
pub struct InMemoryCaptureRepository {
    captures: RwLock<Vec<Capture>>,
    max_captures: usize,
    file: Option<PathBuf>,
}

impl InMemoryCaptureRepository {
    /// Creates an empty store holding at most `max_captures`.
    #[must_use]
    pub fn new(max_captures: usize) -> Self {
        Self {
            captures: RwLock::new(Vec::new()),
            max_captures,
            file: None,
        }
    }

    /// Opens a file-backed store, loading existing captures if the file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>, max_captures: usize) -> DataResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut captures: Vec<Capture> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        captures.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        captures.truncate(max_captures);

        info!(path = %path.display(), captures = captures.len(), "Opened capture store");

        Ok(Self {
            captures: RwLock::new(captures),
            max_captures,
            file: Some(path),
        })
    }

    /// Number of stored captures.
    pub async fn len(&self) -> usize {
        self.captures.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.captures.read().await.is_empty()
    }

    async fn persist(&self, captures: &[Capture]) -> DataResult<()> {
        if let Some(path) = &self.file {
            let json = serde_json::to_vec_pretty(captures)?;
            tokio::fs::write(path, json).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CaptureRepository for InMemoryCaptureRepository {
    async fn save(&self, capture: &Capture) -> DataResult<()> {
        let mut captures = self.captures.write().await;
        captures.retain(|c| c.id != capture.id);

        let at = captures
            .iter()
            .position(|c| c.timestamp <= capture.timestamp)
            .unwrap_or(captures.len());
        captures.insert(at, capture.clone());
        captures.truncate(self.max_captures);

        debug!(id = %capture.id, protocol = %capture.protocol, stored = captures.len(), "Saved capture");
        self.persist(&captures).await
    }

    async fn query(&self, query: &CaptureQuery) -> DataResult<Vec<Capture>> {
        let captures = self.captures.read().await;
        Ok(captures
            .iter()
            .filter(|c| query.matches(c))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> DataResult<u64> {
        let mut captures = self.captures.write().await;
        let before = captures.len();
        captures.retain(|c| c.timestamp >= cutoff);
        let removed = (before - captures.len()) as u64;

        if removed > 0 {
            self.persist(&captures).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
    use rust_decimal_macros::dec;

    fn capture(protocol: Protocol, minutes_ago: i64, pair: &str) -> Capture {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        let mut position = Position::empty(at);
        position.pair = Some(pair.to_string());
        position.balance = Some(dec!(100));
        let snapshot = Snapshot::new(PortfolioSummary::default(), vec![position], at);
        Capture::new("https://example.org", "page", protocol, snapshot)
    }

    #[tokio::test]
    async fn test_query_is_newest_first() {
        let repo = InMemoryCaptureRepository::new(10);
        let old = capture(Protocol::Orca, 30, "SOL/USDC");
        let new = capture(Protocol::Orca, 1, "SOL/USDC");
        let other = capture(Protocol::Cetus, 10, "SUI/USDC");

        repo.save(&new).await.unwrap();
        repo.save(&old).await.unwrap();
        repo.save(&other).await.unwrap();

        let all = repo.query(&CaptureQuery::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![new.id, other.id, old.id]);

        let orca = repo
            .query(&CaptureQuery::for_protocol(Protocol::Orca).limit(1))
            .await
            .unwrap();
        assert_eq!(orca.len(), 1);
        assert_eq!(orca[0].id, new.id);
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let repo = InMemoryCaptureRepository::new(2);
        for minutes in [3, 2, 1] {
            repo.save(&capture(Protocol::Orca, minutes, "SOL/USDC"))
                .await
                .unwrap();
        }
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let repo = InMemoryCaptureRepository::new(10);
        repo.save(&capture(Protocol::Orca, 60 * 24 * 40, "SOL/USDC"))
            .await
            .unwrap();
        repo.save(&capture(Protocol::Orca, 5, "SOL/USDC"))
            .await
            .unwrap();

        let removed = repo
            .delete_older_than(Utc::now() - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captures.json");

        let saved = capture(Protocol::Beefy, 1, "WETH/USDC");
        {
            let repo = InMemoryCaptureRepository::open(&path, 10).await.unwrap();
            assert!(repo.is_empty().await);
            repo.save(&saved).await.unwrap();
        }

        let reopened = InMemoryCaptureRepository::open(&path, 10).await.unwrap();
        let captures = reopened.query(&CaptureQuery::default()).await.unwrap();
        assert_eq!(captures, vec![saved]);
    }
}
