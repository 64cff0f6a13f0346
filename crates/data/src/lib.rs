//! Capture storage for lp-watch.
//!
//! Provides the [`CaptureRepository`] abstraction with an in-memory
//! (optionally file-backed) store and a PostgreSQL store, plus the
//! history lookup used to find the snapshot a new capture is compared to.

/// Snapshot cache with explicit invalidation.
pub mod cache;
/// Storage errors.
pub mod error;
/// Previous-capture lookup over a repository and cache.
pub mod history;
/// Repository implementations.
pub mod repositories;

pub use cache::SnapshotCache;
pub use error::{DataError, DataResult};
pub use history::CaptureHistory;
pub use repositories::{
    CaptureQuery, CaptureRepository, Database, InMemoryCaptureRepository, PgCaptureRepository,
};
