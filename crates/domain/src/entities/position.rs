use crate::enums::RangeStatus;
use crate::value_objects::PriceBounds;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One liquidity position as observed on a protocol page at capture time.
///
/// Every field the page did not show is `None`; zero is a real observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Canonical `TOKEN0/TOKEN1` identifier.
    pub pair: Option<String>,
    pub token0: Option<String>,
    pub token1: Option<String>,

    /// Position value in USD.
    pub balance: Option<Decimal>,
    /// Unclaimed rewards in USD.
    pub pending_yield: Option<Decimal>,
    /// Annualised yield in percentage points.
    pub apy: Option<Decimal>,

    pub range_min: Option<Decimal>,
    pub range_max: Option<Decimal>,
    /// Lower/upper bound distance labels as shown by the page (e.g. `-12.5%`).
    pub range_min_percent: Option<String>,
    pub range_max_percent: Option<String>,
    pub current_price: Option<Decimal>,

    pub in_range: Option<bool>,
    pub range_status: Option<RangeStatus>,
    /// Signed distance such as `+25.00%`.
    pub distance_from_range: Option<String>,

    /// Pool fee tier in percentage points.
    pub fee_tier: Option<Decimal>,
    pub network: Option<String>,
    /// Underlying DEX for vault-style positions.
    pub protocol: Option<String>,
    /// Daily rate label (e.g. `0.027%`) when the page shows one.
    pub daily_yield: Option<String>,
    /// Range managed by an automated liquidity manager.
    #[serde(default)]
    pub is_automated: bool,

    pub captured_at: DateTime<Utc>,
}

impl Position {
    /// An empty observation; extractors fill it field by field.
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            pair: None,
            token0: None,
            token1: None,
            balance: None,
            pending_yield: None,
            apy: None,
            range_min: None,
            range_max: None,
            range_min_percent: None,
            range_max_percent: None,
            current_price: None,
            in_range: None,
            range_status: None,
            distance_from_range: None,
            fee_tier: None,
            network: None,
            protocol: None,
            daily_yield: None,
            is_automated: false,
            captured_at,
        }
    }

    /// Human-readable identifier: the pair, or `Position {n}` (1-based).
    pub fn label(&self, index: usize) -> String {
        match &self.pair {
            Some(pair) if !pair.is_empty() => pair.clone(),
            _ => format!("Position {}", index + 1),
        }
    }

    /// Range bounds as stored, even when inverted.
    pub fn raw_bounds(&self) -> Option<(Decimal, Decimal)> {
        Some((self.range_min?, self.range_max?))
    }

    /// Range bounds when present and well ordered.
    pub fn bounds(&self) -> Option<PriceBounds> {
        let (lower, upper) = self.raw_bounds()?;
        PriceBounds::checked(lower, upper)
    }

    /// Boundary test from the stored bounds and price, ignoring the stored flag.
    ///
    /// Inverted bounds are taken as stored, so no price falls inside them.
    pub fn computed_in_range(&self) -> Option<bool> {
        let price = self.current_price?;
        let (min, max) = self.raw_bounds()?;
        Some(min <= price && price <= max)
    }

    pub fn is_in_range(&self) -> bool {
        self.in_range == Some(true)
    }

    pub fn is_out_of_range(&self) -> bool {
        self.in_range == Some(false)
    }
}
