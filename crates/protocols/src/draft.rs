//! Field-by-field construction of positions and the shared dedup pass.

use crate::normalize::{assess_range, canonical_pair, status_from_flag};
use chrono::{DateTime, Utc};
use lp_watch_domain::{Position, PriceBounds, RangeStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Positions below this USD balance are dust and dropped.
pub const DUST_BALANCE: Decimal = dec!(0.01);

/// A position under construction.
///
/// Every setter keeps the first value it receives, so extractors can try
/// several patterns in priority order and stop caring once one succeeds.
#[derive(Debug, Clone, Default)]
pub struct PositionDraft {
    tokens: Option<(String, String)>,
    balance: Option<Decimal>,
    pending_yield: Option<Decimal>,
    apy: Option<Decimal>,
    range_min: Option<Decimal>,
    range_max: Option<Decimal>,
    range_min_percent: Option<String>,
    range_max_percent: Option<String>,
    current_price: Option<Decimal>,
    in_range_label: Option<bool>,
    fee_tier: Option<Decimal>,
    network: Option<String>,
    protocol: Option<String>,
    daily_yield: Option<String>,
    automated: bool,
}

fn keep_first<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl PositionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&mut self, tokens: Option<(String, String)>) -> &mut Self {
        keep_first(&mut self.tokens, tokens);
        self
    }

    pub fn balance(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.balance, value);
        self
    }

    pub fn pending_yield(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.pending_yield, value);
        self
    }

    pub fn apy(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.apy, value);
        self
    }

    pub fn range_min(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.range_min, value);
        self
    }

    pub fn range_max(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.range_max, value);
        self
    }

    /// Both bounds at once; raw order does not matter.
    pub fn range(&mut self, bounds: Option<(Decimal, Decimal)>) -> &mut Self {
        if let Some((a, b)) = bounds {
            self.range_min(Some(a));
            self.range_max(Some(b));
        }
        self
    }

    pub fn range_percents(&mut self, lower: Option<String>, upper: Option<String>) -> &mut Self {
        keep_first(&mut self.range_min_percent, lower);
        keep_first(&mut self.range_max_percent, upper);
        self
    }

    pub fn current_price(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.current_price, value);
        self
    }

    /// Range flag from an on-page label; used only when bounds or price are missing.
    pub fn in_range_label(&mut self, value: Option<bool>) -> &mut Self {
        keep_first(&mut self.in_range_label, value);
        self
    }

    pub fn fee_tier(&mut self, value: Option<Decimal>) -> &mut Self {
        keep_first(&mut self.fee_tier, value);
        self
    }

    pub fn network(&mut self, value: Option<String>) -> &mut Self {
        keep_first(&mut self.network, value);
        self
    }

    pub fn protocol(&mut self, value: Option<String>) -> &mut Self {
        keep_first(&mut self.protocol, value);
        self
    }

    pub fn daily_yield(&mut self, value: Option<String>) -> &mut Self {
        keep_first(&mut self.daily_yield, value);
        self
    }

    /// Marks the range as managed by an automated liquidity manager.
    pub fn automated(&mut self) -> &mut Self {
        self.automated = true;
        self
    }

    /// Builds the position, or `None` unless both pair and balance were found.
    pub fn finish(self, captured_at: DateTime<Utc>) -> Option<Position> {
        let (token0, token1) = self.tokens?;
        let balance = self.balance?;

        let mut position = Position::empty(captured_at);
        position.pair = Some(canonical_pair(&token0, &token1));
        position.token0 = Some(token0);
        position.token1 = Some(token1);
        position.balance = Some(balance);
        position.pending_yield = self.pending_yield;
        position.apy = self.apy;
        position.range_min_percent = self.range_min_percent;
        position.range_max_percent = self.range_max_percent;
        position.current_price = self.current_price;
        position.fee_tier = self.fee_tier;
        position.network = self.network;
        position.protocol = self.protocol;
        position.daily_yield = self.daily_yield;

        if self.automated {
            position.is_automated = true;
            position.in_range = Some(true);
            position.range_status = Some(RangeStatus::AlmManaged);
            return Some(position);
        }

        let bounds = match (self.range_min, self.range_max) {
            (Some(a), Some(b)) => Some(PriceBounds::ordered(a, b)),
            _ => None,
        };
        if let Some(bounds) = bounds {
            position.range_min = Some(bounds.lower());
            position.range_max = Some(bounds.upper());
        }

        match (bounds, self.current_price) {
            (Some(bounds), Some(price)) => {
                let assessment = assess_range(bounds, price);
                position.in_range = Some(assessment.in_range);
                position.range_status = Some(assessment.status);
                position.distance_from_range = assessment.distance_from_range;
            }
            _ => {
                if let Some(flag) = self.in_range_label {
                    position.in_range = Some(flag);
                    position.range_status = Some(status_from_flag(flag));
                }
            }
        }
        Some(position)
    }
}

/// Which duplicate survives when the same pair appears several times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Nested containers repeat a position; the largest balance is the real one.
    KeepLargest,
    /// Outer containers aggregate several cards; the smallest balance is the card.
    KeepSmallest,
}

/// Collapses positions by pair and drops dust.
///
/// Output keeps the order in which each pair first appeared.
pub fn dedupe_by_pair(positions: Vec<Position>, policy: DuplicatePolicy) -> Vec<Position> {
    let mut kept: Vec<Position> = Vec::with_capacity(positions.len());
    let mut index_by_pair: HashMap<String, usize> = HashMap::new();

    for position in positions {
        let Some(balance) = position.balance else {
            continue;
        };
        if balance < DUST_BALANCE {
            continue;
        }
        let pair = position.pair.clone().unwrap_or_default();

        match index_by_pair.get(&pair) {
            Some(&index) => {
                let existing = kept[index].balance.unwrap_or_default();
                let replace = match policy {
                    DuplicatePolicy::KeepLargest => balance > existing,
                    DuplicatePolicy::KeepSmallest => balance < existing,
                };
                if replace {
                    kept[index] = position;
                }
            }
            None => {
                index_by_pair.insert(pair, kept.len());
                kept.push(position);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(pair: (&str, &str), balance: Decimal) -> PositionDraft {
        let mut draft = PositionDraft::new();
        draft
            .tokens(Some((pair.0.to_string(), pair.1.to_string())))
            .balance(Some(balance));
        draft
    }

    #[test]
    fn test_finish_requires_pair_and_balance() {
        let now = Utc::now();
        let mut no_balance = PositionDraft::new();
        no_balance.tokens(Some(("SOL".into(), "USDC".into())));
        assert!(no_balance.finish(now).is_none());

        let mut no_pair = PositionDraft::new();
        no_pair.balance(Some(dec!(10)));
        assert!(no_pair.finish(now).is_none());

        let position = draft(("SOL", "USDC"), dec!(10)).finish(now).unwrap();
        assert_eq!(position.pair.as_deref(), Some("SOL/USDC"));
        assert_eq!(position.in_range, None);
    }

    #[test]
    fn test_setters_keep_first_value() {
        let mut d = draft(("SOL", "USDC"), dec!(10));
        d.balance(Some(dec!(99))).apy(None).apy(Some(dec!(5))).apy(Some(dec!(7)));
        let position = d.finish(Utc::now()).unwrap();
        assert_eq!(position.balance, Some(dec!(10)));
        assert_eq!(position.apy, Some(dec!(5)));
    }

    #[test]
    fn test_finish_orders_bounds_and_computes_status() {
        let mut d = draft(("SOL", "USDC"), dec!(10));
        d.range(Some((dec!(20), dec!(10))))
            .current_price(Some(dec!(25)))
            .in_range_label(Some(true));
        let position = d.finish(Utc::now()).unwrap();
        assert_eq!(position.range_min, Some(dec!(10)));
        assert_eq!(position.range_max, Some(dec!(20)));
        assert_eq!(position.in_range, Some(false));
        assert_eq!(position.range_status, Some(RangeStatus::Above));
        assert_eq!(position.distance_from_range.as_deref(), Some("+25.00%"));
    }

    #[test]
    fn test_label_used_without_price() {
        let mut d = draft(("APT", "USDC"), dec!(10));
        d.in_range_label(Some(false));
        let position = d.finish(Utc::now()).unwrap();
        assert_eq!(position.in_range, Some(false));
        assert_eq!(position.range_status, Some(RangeStatus::OutOfRange));
    }

    #[test]
    fn test_automated_positions_have_no_bounds() {
        let mut d = draft(("WETH", "USDC"), dec!(10));
        d.range(Some((dec!(1), dec!(2))))
            .current_price(Some(dec!(5)))
            .automated();
        let position = d.finish(Utc::now()).unwrap();
        assert!(position.is_automated);
        assert_eq!(position.range_min, None);
        assert_eq!(position.range_max, None);
        assert_eq!(position.in_range, Some(true));
        assert_eq!(position.range_status, Some(RangeStatus::AlmManaged));
    }

    #[test]
    fn test_dedupe_by_pair() {
        let now = Utc::now();
        let positions = vec![
            draft(("SOL", "USDC"), dec!(100)).finish(now).unwrap(),
            draft(("ETH", "USDC"), dec!(0.001)).finish(now).unwrap(),
            draft(("SOL", "USDC"), dec!(250)).finish(now).unwrap(),
            draft(("APT", "USDC"), dec!(5)).finish(now).unwrap(),
        ];

        let largest = dedupe_by_pair(positions.clone(), DuplicatePolicy::KeepLargest);
        assert_eq!(largest.len(), 2);
        assert_eq!(largest[0].pair.as_deref(), Some("SOL/USDC"));
        assert_eq!(largest[0].balance, Some(dec!(250)));
        assert_eq!(largest[1].pair.as_deref(), Some("APT/USDC"));

        let smallest = dedupe_by_pair(positions, DuplicatePolicy::KeepSmallest);
        assert_eq!(smallest[0].balance, Some(dec!(100)));
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let now = Utc::now();
        let positions = vec![
            draft(("SOL", "USDC"), dec!(100)).finish(now).unwrap(),
            draft(("SOL", "USDC"), dec!(250)).finish(now).unwrap(),
        ];
        let once = dedupe_by_pair(positions, DuplicatePolicy::KeepLargest);
        let twice = dedupe_by_pair(once.clone(), DuplicatePolicy::KeepLargest);
        assert_eq!(once, twice);
    }
}
