use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Liquidity protocols whose position pages can be captured.
///
/// The declaration order is the detection order used by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    Orca,
    Raydium,
    Aerodrome,
    Cetus,
    Hyperion,
    PancakeSwap,
    Beefy,
}

impl Protocol {
    /// All supported protocols in detection order.
    pub const ALL: [Protocol; 7] = [
        Protocol::Orca,
        Protocol::Raydium,
        Protocol::Aerodrome,
        Protocol::Cetus,
        Protocol::Hyperion,
        Protocol::PancakeSwap,
        Protocol::Beefy,
    ];

    /// Display name as stored alongside captures.
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Orca => "Orca",
            Protocol::Raydium => "Raydium",
            Protocol::Aerodrome => "Aerodrome",
            Protocol::Cetus => "Cetus",
            Protocol::Hyperion => "Hyperion",
            Protocol::PancakeSwap => "PancakeSwap",
            Protocol::Beefy => "Beefy",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a protocol name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown protocol: {0}")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownProtocol(s.to_string()))
    }
}

/// Where the observed price sits relative to a position's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeStatus {
    InRange,
    /// Out of range, side unknown (status came from a page label).
    OutOfRange,
    Below,
    Above,
    /// Range is rebalanced by an automated liquidity manager.
    AlmManaged,
}

impl RangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeStatus::InRange => "in-range",
            RangeStatus::OutOfRange => "out-of-range",
            RangeStatus::Below => "below",
            RangeStatus::Above => "above",
            RangeStatus::AlmManaged => "alm-managed",
        }
    }

    /// Whether the status means the position is earning.
    pub fn is_in_range(&self) -> bool {
        matches!(self, RangeStatus::InRange | RangeStatus::AlmManaged)
    }
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_str_is_case_insensitive() {
        assert_eq!("pancakeswap".parse::<Protocol>(), Ok(Protocol::PancakeSwap));
        assert_eq!(" Orca ".parse::<Protocol>(), Ok(Protocol::Orca));
        assert!("uniswap".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_range_status_serializes_kebab_case() {
        let json = serde_json::to_string(&RangeStatus::AlmManaged).unwrap();
        assert_eq!(json, "\"alm-managed\"");
        let json = serde_json::to_string(&RangeStatus::OutOfRange).unwrap();
        assert_eq!(json, "\"out-of-range\"");
    }
}
