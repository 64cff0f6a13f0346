use super::position::Position;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Protocol-level aggregates shown on a portfolio page. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Option<Decimal>,
    pub pending_yield: Option<Decimal>,
    pub estimated_yield_amount: Option<Decimal>,
    pub estimated_yield_percent: Option<Decimal>,
    pub avg_apy: Option<Decimal>,
    pub daily_yield: Option<Decimal>,
}

impl PortfolioSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of one extraction pass over a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub summary: PortfolioSummary,
    pub positions: Vec<Position>,
    pub position_count: usize,
    pub in_range_count: usize,
    pub out_of_range_count: usize,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Builds a snapshot and derives its counts.
    pub fn new(
        summary: PortfolioSummary,
        positions: Vec<Position>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let in_range_count = positions.iter().filter(|p| p.is_in_range()).count();
        let out_of_range_count = positions.iter().filter(|p| p.is_out_of_range()).count();
        Self {
            summary,
            position_count: positions.len(),
            positions,
            in_range_count,
            out_of_range_count,
            captured_at,
        }
    }

    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self::new(PortfolioSummary::default(), Vec::new(), captured_at)
    }

    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    pub fn find(&self, pair: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.pair.as_deref() == Some(pair))
    }
}
