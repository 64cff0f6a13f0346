//! Core data model for liquidity position captures.
//!
//! Positions and snapshots are produced by the protocol extractors and
//! never mutated afterwards; validation and comparison only derive reports.

pub mod entities;
pub mod enums;
pub mod reports;
pub mod value_objects;

pub use entities::{Capture, PortfolioSummary, Position, PositionRecord, Snapshot};
pub use enums::{Protocol, RangeStatus, UnknownProtocol};
pub use reports::{ComparisonReport, Finding, FindingKind, ValidationReport};
pub use value_objects::{Percentage, PriceBounds};
