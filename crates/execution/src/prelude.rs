//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use lp_watch_execution::prelude::*;
//! ```

// Config
pub use crate::config::CaptureConfig;

// Service
pub use crate::service::{CaptureOutcome, CaptureReport, CaptureService, SessionReport};

// Sources
pub use crate::source::{FilePageSource, PageSource, PageSourceError, parse_fixture};
