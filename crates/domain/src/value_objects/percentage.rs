use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A percentage value in points (12.5 means 12.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percentage(pub Decimal);

impl Percentage {
    pub fn new(points: Decimal) -> Self {
        Self(points)
    }

    /// Converts a ratio (0.25) into points (25%), `None` on overflow.
    pub fn from_ratio(ratio: Decimal) -> Option<Self> {
        ratio.checked_mul(Decimal::ONE_HUNDRED).map(Self)
    }

    /// Relative change from `from` to `to`.
    ///
    /// `None` when `from` is zero or the change does not fit a `Decimal`.
    pub fn relative_change(from: Decimal, to: Decimal) -> Option<Self> {
        if from.is_zero() {
            return None;
        }
        Self::from_ratio(to.checked_sub(from)?.checked_div(from)?)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Rounds half away from zero, normalising negative zero.
    pub fn rounded(&self, dp: u32) -> Decimal {
        let r = self
            .0
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        if r.is_zero() { Decimal::ZERO } else { r }
    }

    /// Formats with an explicit sign, e.g. `+25.00%` or `-3.10%`.
    pub fn to_signed_string(&self, dp: u32) -> String {
        let r = self.rounded(dp);
        let sign = if r.is_sign_negative() { "-" } else { "+" };
        format!("{}{:.*}%", sign, dp as usize, r.abs())
    }

    /// Formats without a sign, e.g. `60.0%`.
    pub fn to_fixed_string(&self, dp: u32) -> String {
        format!("{:.*}%", dp as usize, self.rounded(dp))
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}
