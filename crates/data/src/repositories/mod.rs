//! Repository implementations for capture persistence.
//!
//! [`CaptureRepository`] is the storage seam used by the capture service.
//! Queries always return captures newest first.

mod capture_repository;
mod memory;

pub use capture_repository::PgCaptureRepository;
pub use memory::InMemoryCaptureRepository;

use crate::error::DataResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lp_watch_domain::{Capture, Protocol};
use sqlx::PgPool;
use std::sync::Arc;

/// Filters for [`CaptureRepository::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureQuery {
    pub protocol: Option<Protocol>,
    /// Only captures holding a position with this pair.
    pub pair: Option<String>,
    pub limit: Option<usize>,
}

impl CaptureQuery {
    #[must_use]
    pub fn for_protocol(protocol: Protocol) -> Self {
        Self {
            protocol: Some(protocol),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a capture passes the protocol and pair filters.
    pub fn matches(&self, capture: &Capture) -> bool {
        self.protocol.is_none_or(|p| p == capture.protocol)
            && self
                .pair
                .as_deref()
                .is_none_or(|pair| capture.snapshot.find(pair).is_some())
    }
}

/// Storage for captures.
#[async_trait]
pub trait CaptureRepository: Send + Sync {
    /// Persists a capture.
    async fn save(&self, capture: &Capture) -> DataResult<()>;

    /// Returns matching captures, newest first.
    async fn query(&self, query: &CaptureQuery) -> DataResult<Vec<Capture>>;

    /// Deletes captures taken before `cutoff`, returning how many were removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> DataResult<u64>;
}

/// Database connection wrapper for repositories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Creates a new Database wrapper from a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Creates a new database connection from a connection string.
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a PgCaptureRepository instance.
    #[must_use]
    pub fn captures(&self) -> PgCaptureRepository {
        PgCaptureRepository::new(self.pool.clone())
    }

    /// Runs database migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_initial_schema.sql"))
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
