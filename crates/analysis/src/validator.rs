//! Consistency rules for a single snapshot.
//!
//! Every rule runs on every position; findings accumulate and nothing is
//! corrected. Issues fail the report, warnings do not.

use lp_watch_domain::reports::SUMMARY_SUBJECT;
use lp_watch_domain::{Finding, FindingKind, Position, Snapshot, ValidationReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// APY above this many percentage points is flagged as suspicious.
pub const MAX_PLAUSIBLE_APY: Decimal = dec!(10000);

/// Runs the fixed rule set over a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotValidator;

impl SnapshotValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, snapshot: &Snapshot) -> ValidationReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        match snapshot.summary.total_value {
            None => warnings.push(Finding::new(
                SUMMARY_SUBJECT,
                FindingKind::MissingTotalValue,
                "Missing total portfolio value",
            )),
            Some(total) if total < Decimal::ZERO => issues.push(Finding::new(
                SUMMARY_SUBJECT,
                FindingKind::NegativeTotalValue,
                format!("Negative total portfolio value ({})", total),
            )),
            Some(_) => {}
        }

        for (index, position) in snapshot.positions.iter().enumerate() {
            check_position(&position.label(index), position, &mut issues, &mut warnings);
        }

        debug!(
            positions = snapshot.positions.len(),
            issues = issues.len(),
            warnings = warnings.len(),
            "Validated snapshot"
        );

        ValidationReport::from_findings(issues, warnings)
    }
}

fn check_position(
    subject: &str,
    position: &Position,
    issues: &mut Vec<Finding>,
    warnings: &mut Vec<Finding>,
) {
    if position.pair.as_deref().is_none_or(str::is_empty) {
        warnings.push(Finding::new(
            subject,
            FindingKind::MissingPair,
            "Missing pair name",
        ));
    }

    if position.balance.is_none() {
        warnings.push(Finding::new(
            subject,
            FindingKind::MissingBalance,
            "Missing balance",
        ));
    }

    if let Some((min, max)) = position.raw_bounds()
        && min > max
    {
        issues.push(Finding::new(
            subject,
            FindingKind::InvertedRange,
            format!("Range min ({}) > range max ({})", min, max),
        ));
    }

    // Needs the flag, both bounds and the price. Inverted bounds still apply.
    if let (Some(stored), Some(computed)) = (position.in_range, position.computed_in_range())
        && stored != computed
    {
        issues.push(Finding::new(
            subject,
            FindingKind::InRangeMismatch,
            format!(
                "In-range logic error (flag {}, price {} within range is {})",
                stored,
                position.current_price.unwrap_or_default(),
                computed
            ),
        ));
    }

    if let Some(apy) = position.apy {
        if apy > MAX_PLAUSIBLE_APY {
            warnings.push(Finding::new(
                subject,
                FindingKind::ExtremeApy,
                format!("Very high APY ({}%)", apy.normalize()),
            ));
        }
        if apy < Decimal::ZERO {
            issues.push(Finding::new(
                subject,
                FindingKind::NegativeApy,
                format!("Negative APY ({}%)", apy.normalize()),
            ));
        }
    }

    if let Some(balance) = position.balance
        && balance < Decimal::ZERO
    {
        issues.push(Finding::new(
            subject,
            FindingKind::NegativeBalance,
            format!("Negative balance ({})", balance),
        ));
    }
}
