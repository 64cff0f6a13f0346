//! Prelude module for convenient imports.
//!
//! ```rust
//! use lp_watch_analysis::prelude::*;
//! ```

pub use crate::diff::{
    APY_CHANGE_THRESHOLD, BALANCE_CHANGE_THRESHOLD, BOUNDARY_PROXIMITY, SnapshotComparator,
    TOTAL_VALUE_CHANGE_THRESHOLD,
};
pub use crate::portfolio::{PortfolioStats, latest_positions};
pub use crate::validator::{MAX_PLAUSIBLE_APY, SnapshotValidator};
