//! Short-lived cache of recent captures per protocol.
//!
//! Entries expire after the configured TTL. Writers must call
//! [`SnapshotCache::invalidate`] after every store mutation.

use lp_watch_domain::{Capture, Protocol};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct CacheEntry {
    stored_at: Instant,
    captures: Vec<Capture>,
}

/// Recent captures keyed by protocol, newest first.
pub struct SnapshotCache {
    ttl: Duration,
    entries: RwLock<HashMap<Protocol, CacheEntry>>,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached captures for `protocol` if still fresh.
    pub async fn get(&self, protocol: Protocol) -> Option<Vec<Capture>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&protocol)?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.captures.clone())
    }

    pub async fn put(&self, protocol: Protocol, captures: Vec<Capture>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            protocol,
            CacheEntry {
                stored_at: Instant::now(),
                captures,
            },
        );
    }

    /// Drops every entry.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            debug!(entries = entries.len(), "Invalidating snapshot cache");
        }
        entries.clear();
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        assert!(cache.get(Protocol::Orca).await.is_none());

        cache.put(Protocol::Orca, Vec::new()).await;
        assert_eq!(cache.get(Protocol::Orca).await, Some(Vec::new()));
        assert!(cache.get(Protocol::Cetus).await.is_none());

        cache.invalidate().await;
        assert!(cache.get(Protocol::Orca).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_never_serves() {
        let cache = SnapshotCache::new(Duration::ZERO);
        cache.put(Protocol::Orca, Vec::new()).await;
        assert!(cache.get(Protocol::Orca).await.is_none());
    }
}
