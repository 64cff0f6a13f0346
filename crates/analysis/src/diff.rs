//! Change detection between two snapshots of the same protocol.
//!
//! Positions are matched by pair only. Positions without a pair take no
//! part in the comparison.

use lp_watch_domain::{ComparisonReport, Percentage, Position, Snapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use tracing::debug;

/// Relative balance change (as a ratio) that counts as critical.
pub const BALANCE_CHANGE_THRESHOLD: Decimal = dec!(0.5);
/// Absolute APY change in percentage points that counts as significant.
pub const APY_CHANGE_THRESHOLD: Decimal = dec!(20);
/// Share of the range width around each bound that counts as "near".
pub const BOUNDARY_PROXIMITY: Decimal = dec!(0.10);
/// Relative change of the portfolio total that counts as significant.
pub const TOTAL_VALUE_CHANGE_THRESHOLD: Decimal = dec!(0.2);

/// Compares a fresh snapshot against the previous one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotComparator;

impl SnapshotComparator {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` without a previous snapshot or when `current` has no positions.
    pub fn compare(
        &self,
        current: &Snapshot,
        previous: Option<&Snapshot>,
    ) -> Option<ComparisonReport> {
        let previous = previous?;
        if !current.has_positions() {
            return None;
        }

        let mut report = ComparisonReport::new(previous.captured_at);

        for pair in pairs(current) {
            let Some(now) = current.find(pair) else {
                continue;
            };
            match previous.find(pair) {
                Some(before) => compare_position(pair, before, now, &mut report),
                None => report.positions_added.push(pair.to_string()),
            }
        }

        for pair in pairs(previous) {
            if current.find(pair).is_none() {
                report.positions_removed.push(pair.to_string());
            }
        }

        if let (Some(before), Some(now)) =
            (previous.summary.total_value, current.summary.total_value)
            && let Some(change) = relative_change_over(before, now, TOTAL_VALUE_CHANGE_THRESHOLD)
        {
            report.significant_changes.push(format!(
                "Total portfolio value {} by {}",
                direction(before, now),
                change.abs().to_fixed_string(1)
            ));
        }

        debug!(
            added = report.positions_added.len(),
            removed = report.positions_removed.len(),
            significant = report.significant_changes.len(),
            critical = report.critical_changes.len(),
            "Compared snapshots"
        );

        Some(report)
    }
}

/// Distinct pairs in first-appearance order.
fn pairs(snapshot: &Snapshot) -> Vec<&str> {
    let mut seen = HashSet::new();
    snapshot
        .positions
        .iter()
        .filter_map(|p| p.pair.as_deref())
        .filter(|pair| !pair.is_empty() && seen.insert(*pair))
        .collect()
}

fn compare_position(
    pair: &str,
    before: &Position,
    now: &Position,
    report: &mut ComparisonReport,
) {
    match (before.in_range, now.in_range) {
        (Some(true), Some(false)) => report
            .critical_changes
            .push(format!("{}: Position went OUT OF RANGE", pair)),
        (Some(false), Some(true)) => report
            .significant_changes
            .push(format!("{}: Position came back IN RANGE", pair)),
        _ => {}
    }

    if let (Some(old), Some(new)) = (before.balance, now.balance)
        && let Some(change) = relative_change_over(old, new, BALANCE_CHANGE_THRESHOLD)
    {
        report.critical_changes.push(format!(
            "{}: Balance {} by {}",
            pair,
            direction(old, new),
            change.abs().to_fixed_string(1)
        ));
    }

    if let (Some(old), Some(new)) = (before.apy, now.apy)
        && new
            .checked_sub(old)
            .is_some_and(|delta| delta.abs() > APY_CHANGE_THRESHOLD)
    {
        report.significant_changes.push(format!(
            "{}: APY {} from {} to {}",
            pair,
            direction(old, new),
            Percentage::new(old).to_fixed_string(1),
            Percentage::new(new).to_fixed_string(1)
        ));
    }

    if approaching_boundary(now) {
        report
            .critical_changes
            .push(format!("{}: Price approaching range boundary", pair));
    }
}

/// Relative change when it exceeds `threshold` (a ratio).
///
/// A zero base or a change too large to represent never qualifies.
fn relative_change_over(old: Decimal, new: Decimal, threshold: Decimal) -> Option<Percentage> {
    let change = Percentage::relative_change(old, new)?;
    let limit = Percentage::from_ratio(threshold)?;
    (change.abs() > limit).then_some(change)
}

fn direction(old: Decimal, new: Decimal) -> &'static str {
    if new > old { "increased" } else { "decreased" }
}

fn approaching_boundary(position: &Position) -> bool {
    if !position.is_in_range() {
        return false;
    }
    let (Some(bounds), Some(price)) = (position.bounds(), position.current_price) else {
        return false;
    };
    bounds.distance_to_nearest_boundary(price) < bounds.width() * BOUNDARY_PROXIMITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lp_watch_domain::PortfolioSummary;

    fn position(pair: &str, balance: Decimal) -> Position {
        let mut p = Position::empty(Utc::now());
        p.pair = Some(pair.to_string());
        p.balance = Some(balance);
        p
    }

    fn snapshot(total: Option<Decimal>, positions: Vec<Position>) -> Snapshot {
        let summary = PortfolioSummary {
            total_value: total,
            ..PortfolioSummary::default()
        };
        Snapshot::new(summary, positions, Utc::now())
    }

    #[test]
    fn test_critical_balance_swing() {
        let previous = snapshot(None, vec![position("ETH/USDC", dec!(1000))]);
        let current = snapshot(None, vec![position("ETH/USDC", dec!(1600))]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();

        assert_eq!(
            report.critical_changes,
            vec!["ETH/USDC: Balance increased by 60.0%".to_string()]
        );
        assert_eq!(report.previous_timestamp, previous.captured_at);
    }

    #[test]
    fn test_balance_drop_reports_decrease() {
        let previous = snapshot(None, vec![position("ETH/USDC", dec!(1000))]);
        let current = snapshot(None, vec![position("ETH/USDC", dec!(400))]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert_eq!(
            report.critical_changes,
            vec!["ETH/USDC: Balance decreased by 60.0%".to_string()]
        );
    }

    #[test]
    fn test_no_previous_or_no_positions() {
        let current = snapshot(Some(dec!(10)), vec![position("SOL/USDC", dec!(10))]);
        let comparator = SnapshotComparator::new();
        assert!(comparator.compare(&current, None).is_none());

        let empty = snapshot(Some(dec!(10)), Vec::new());
        assert!(comparator.compare(&empty, Some(&current)).is_none());
    }

    #[test]
    fn test_self_comparison_is_quiet() {
        let mut p = position("SOL/USDC", dec!(500));
        p.apy = Some(dec!(45));
        p.in_range = Some(false);
        let current = snapshot(Some(dec!(500)), vec![p, position("ETH/USDC", dec!(20))]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&current))
            .unwrap();
        assert!(report.is_quiet());
    }

    #[test]
    fn test_added_and_removed_pairs() {
        let previous = snapshot(
            None,
            vec![position("SOL/USDC", dec!(10)), position("JUP/SOL", dec!(10))],
        );
        let current = snapshot(
            None,
            vec![position("SOL/USDC", dec!(10)), position("BONK/SOL", dec!(10))],
        );

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert_eq!(report.positions_added, vec!["BONK/SOL".to_string()]);
        assert_eq!(report.positions_removed, vec!["JUP/SOL".to_string()]);
    }

    #[test]
    fn test_range_transitions() {
        let mut was_in = position("SOL/USDC", dec!(100));
        was_in.in_range = Some(true);
        let mut was_out = position("ETH/USDC", dec!(100));
        was_out.in_range = Some(false);
        let previous = snapshot(None, vec![was_in.clone(), was_out.clone()]);

        was_in.in_range = Some(false);
        was_out.in_range = Some(true);
        let current = snapshot(None, vec![was_in, was_out]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert!(
            report
                .critical_changes
                .contains(&"SOL/USDC: Position went OUT OF RANGE".to_string())
        );
        assert!(
            report
                .significant_changes
                .contains(&"ETH/USDC: Position came back IN RANGE".to_string())
        );
    }

    #[test]
    fn test_unknown_range_state_is_not_a_transition() {
        let mut before = position("SOL/USDC", dec!(100));
        before.in_range = Some(true);
        let previous = snapshot(None, vec![before]);
        let current = snapshot(None, vec![position("SOL/USDC", dec!(100))]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert!(report.critical_changes.is_empty());
    }

    #[test]
    fn test_apy_shift_and_total_value() {
        let mut before = position("SOL/USDC", dec!(100));
        before.apy = Some(dec!(12.5));
        let mut after = position("SOL/USDC", dec!(100));
        after.apy = Some(dec!(40));

        let mut previous = snapshot(Some(dec!(1000)), vec![before]);
        previous.captured_at = Utc::now() - Duration::hours(1);
        let current = snapshot(Some(dec!(1250)), vec![after]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert_eq!(
            report.significant_changes,
            vec![
                "SOL/USDC: APY increased from 12.5% to 40.0%".to_string(),
                "Total portfolio value increased by 25.0%".to_string(),
            ]
        );
    }

    #[test]
    fn test_small_changes_stay_below_thresholds() {
        let mut before = position("SOL/USDC", dec!(1000));
        before.apy = Some(dec!(30));
        let mut after = position("SOL/USDC", dec!(1500));
        after.apy = Some(dec!(50));

        let previous = snapshot(Some(dec!(1000)), vec![before]);
        let current = snapshot(Some(dec!(1200)), vec![after]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert!(report.is_quiet());
    }

    #[test]
    fn test_unrepresentable_swing_is_skipped() {
        let huge = dec!(1000000000000000000000000000);
        let mut before = position("SOL/USDC", Decimal::ONE);
        before.apy = Some(Decimal::MIN);
        let mut after = position("SOL/USDC", huge);
        after.apy = Some(Decimal::MAX);

        let previous = snapshot(Some(Decimal::ONE), vec![before]);
        let current = snapshot(Some(huge), vec![after]);

        let report = SnapshotComparator::new()
            .compare(&current, Some(&previous))
            .unwrap();
        assert!(report.is_quiet());
    }

    #[test]
    fn test_price_approaching_boundary() {
        let mut p = position("SOL/USDC", dec!(100));
        p.range_min = Some(dec!(100));
        p.range_max = Some(dec!(200));
        p.current_price = Some(dec!(195));
        p.in_range = Some(true);
        let previous = snapshot(None, vec![p.clone()]);

        let report = SnapshotComparator::new()
            .compare(&snapshot(None, vec![p.clone()]), Some(&previous))
            .unwrap();
        assert_eq!(
            report.critical_changes,
            vec!["SOL/USDC: Price approaching range boundary".to_string()]
        );

        p.current_price = Some(dec!(150));
        let report = SnapshotComparator::new()
            .compare(&snapshot(None, vec![p]), Some(&previous))
            .unwrap();
        assert!(report.critical_changes.is_empty());
    }
}
