//! Checks and comparisons over extracted snapshots.
//!
//! - [`validator`]: internal consistency rules for one snapshot
//! - [`diff`]: change detection against the previous snapshot of a protocol
//! - [`portfolio`]: cross-capture views over stored positions
//!
//! Everything here is a pure function of its inputs.

/// Prelude module for convenient imports.
pub mod prelude;

/// Snapshot comparison.
pub mod diff;
/// Cross-capture position views.
pub mod portfolio;
/// Snapshot validation.
pub mod validator;

pub use diff::SnapshotComparator;
pub use portfolio::{PortfolioStats, latest_positions};
pub use validator::SnapshotValidator;
