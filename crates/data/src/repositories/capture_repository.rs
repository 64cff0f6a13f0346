//! PostgreSQL capture repository.

use super::{CaptureQuery, CaptureRepository};
use crate::error::DataResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lp_watch_domain::{Capture, PositionRecord, Protocol, Snapshot};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{debug, warn};

/// Rebuilds a capture from a `captures` row.
fn capture_from_row(row: &PgRow) -> DataResult<Capture> {
    let protocol: String = row.try_get("protocol")?;
    let snapshot: serde_json::Value = row.try_get("snapshot")?;
    let snapshot: Snapshot = serde_json::from_value(snapshot)?;
    Ok(Capture {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        protocol: protocol.parse::<Protocol>()?,
        timestamp: row.try_get("captured_at")?,
        snapshot,
        extraction_error: row.try_get("extraction_error")?,
    })
}

/// Repository for captures and their denormalised positions.
#[derive(Clone)]
pub struct PgCaptureRepository {
    pool: Arc<PgPool>,
}

impl PgCaptureRepository {
    /// Creates a new PgCaptureRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Replaces the `positions` rows of the capture, one row per position.
    ///
    /// # Errors
    /// Returns an error if the delete or any insert fails.
    async fn replace_positions(&self, capture: &Capture) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM positions WHERE capture_id = $1")
            .bind(capture.id)
            .execute(&mut *tx)
            .await?;
        for record in PositionRecord::from_capture(capture) {
            let p = &record.position;
            sqlx::query(
                r#"
                INSERT INTO positions (capture_id, protocol, pair, balance, pending_yield, apy,
                                       range_min, range_max, current_price, in_range, range_status,
                                       fee_tier, network, is_automated, captured_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(record.capture_id)
            .bind(record.protocol.name())
            .bind(p.pair.as_deref())
            .bind(p.balance)
            .bind(p.pending_yield)
            .bind(p.apy)
            .bind(p.range_min)
            .bind(p.range_max)
            .bind(p.current_price)
            .bind(p.in_range)
            .bind(p.range_status.map(|s| s.as_str()))
            .bind(p.fee_tier)
            .bind(p.network.as_deref())
            .bind(p.is_automated)
            .bind(capture.timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}

#[async_trait]
impl CaptureRepository for PgCaptureRepository {
    async fn save(&self, capture: &Capture) -> DataResult<()> {
        let snapshot = serde_json::to_value(&capture.snapshot)?;
        sqlx::query(
            r#"
            INSERT INTO captures (id, url, title, protocol, captured_at, snapshot, extraction_error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                snapshot = EXCLUDED.snapshot,
                extraction_error = EXCLUDED.extraction_error
            "#,
        )
        .bind(capture.id)
        .bind(&capture.url)
        .bind(&capture.title)
        .bind(capture.protocol.name())
        .bind(capture.timestamp)
        .bind(&snapshot)
        .bind(capture.extraction_error.as_deref())
        .execute(self.pool.as_ref())
        .await?;

        // The capture row is authoritative; position rows are derived from it.
        if let Err(e) = self.replace_positions(capture).await {
            warn!(id = %capture.id, error = %e, "Failed to store position rows");
        }

        debug!(id = %capture.id, protocol = %capture.protocol, "Saved capture");
        Ok(())
    }

    async fn query(&self, query: &CaptureQuery) -> DataResult<Vec<Capture>> {
        let rows = sqlx::query(
            r#"
            SELECT c.* FROM captures c
            WHERE ($1::text IS NULL OR c.protocol = $1)
              AND ($2::text IS NULL OR EXISTS (
                    SELECT 1 FROM positions p WHERE p.capture_id = c.id AND p.pair = $2))
            ORDER BY c.captured_at DESC
            LIMIT $3
            "#,
        )
        .bind(query.protocol.map(|p| p.name()))
        .bind(query.pair.as_deref())
        .bind(query.limit.map(|l| l as i64))
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(capture_from_row).collect()
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> DataResult<u64> {
        let result = sqlx::query("DELETE FROM captures WHERE captured_at < $1")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }
}
