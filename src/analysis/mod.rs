//! Post-parse analysis passes
//!
//! - `coverage`: roll line execution up into per-function, per-file, and
//!   profile-wide coverage figures
//! - `hotspot`: rank functions by exclusive cost of the primary event

pub mod coverage;
pub mod hotspot;

pub use coverage::compute_coverage;
pub use hotspot::{rank_hotspots, FunctionHotspot};
