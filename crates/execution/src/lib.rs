//! Capture orchestration for lp-watch.
//!
//! This crate ties the pieces together:
//! - Page sources that load rendered protocol pages
//! - The capture service: extraction, storage, validation and comparison
//! - Runtime configuration

/// Prelude module for convenient imports.
pub mod prelude;

/// Runtime configuration.
pub mod config;
/// Capture orchestration.
pub mod service;
/// Page sources.
pub mod source;
