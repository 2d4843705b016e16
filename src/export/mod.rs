//! Report export functionality
//!
//! This module serializes the analyzed model for external consumers.
//! Currently supports a JSON report carrying totals, per-file coverage,
//! hotspots, and the rooted call tree.

pub mod json_report;

pub use json_report::{build_report, write_report, ProfileReport};
