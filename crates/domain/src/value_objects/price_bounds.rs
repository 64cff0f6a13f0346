use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lower and upper price of an active liquidity range. Always `lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBounds {
    lower: Decimal,
    upper: Decimal,
}

impl PriceBounds {
    /// Builds bounds from two prices in any order.
    pub fn ordered(a: Decimal, b: Decimal) -> Self {
        if a <= b {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    /// Builds bounds only if `lower <= upper`.
    pub fn checked(lower: Decimal, upper: Decimal) -> Option<Self> {
        (lower <= upper).then_some(Self { lower, upper })
    }

    pub fn lower(&self) -> Decimal {
        self.lower
    }

    pub fn upper(&self) -> Decimal {
        self.upper
    }

    pub fn width(&self) -> Decimal {
        self.upper.saturating_sub(self.lower)
    }

    pub fn midpoint(&self) -> Decimal {
        self.lower / Decimal::TWO + self.upper / Decimal::TWO
    }

    /// Inclusive on both ends.
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.lower && price <= self.upper
    }

    /// Absolute distance from `price` to the closer boundary.
    pub fn distance_to_nearest_boundary(&self, price: Decimal) -> Decimal {
        let below = price.saturating_sub(self.lower).abs();
        let above = self.upper.saturating_sub(price).abs();
        below.min(above)
    }
}
