//! Hotspot ranking for profile data.
//!
//! Aggregates nothing new, since functions already carry their exclusive
//! totals; this module just ranks them by the primary cost metric (cycles when
//! recorded, instructions otherwise) and computes each function's share of
//! the profile-wide total for display.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

use crate::profile_data::Profile;

/// A function hotspot with aggregated statistics.
///
/// This is the "view model" returned by [`rank_hotspots`] for display in a
/// summary table or the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionHotspot {
    /// Source file the function lives in, as spelled in the profile.
    pub file: String,

    pub name: String,

    /// Exclusive cost in the primary event.
    pub cost: u64,

    /// Percentage of the profile-wide primary cost (0.0 - 100.0).
    pub percentage: f64,

    /// Covered-line fraction of the function's compiled lines, 0-100.
    pub coverage: f64,
}

/// Rank all functions by exclusive primary cost, descending.
///
/// The denominator is the `summary:` total when the profile carried one,
/// otherwise the sum of per-function exclusive totals. `limit = 0` means
/// unbounded.
#[must_use]
pub fn rank_hotspots(profile: &Profile, limit: usize) -> Vec<FunctionHotspot> {
    let primary = profile.events.primary();
    let denominator = profile
        .summary
        .as_ref()
        .map_or_else(|| profile.exclusive_totals().get(primary), |s| s.get(primary));

    let mut hotspots: Vec<FunctionHotspot> = profile
        .files()
        .iter()
        .flat_map(|file| file.functions())
        .map(|function| {
            let cost = function.totals.get(primary);
            let percentage =
                if denominator > 0 { cost as f64 / denominator as f64 * 100.0 } else { 0.0 };
            let compiled = function.covered.len() + function.uncovered.len();
            let coverage = if compiled == 0 {
                0.0
            } else {
                function.covered.len() as f64 / compiled as f64 * 100.0
            };
            FunctionHotspot {
                file: function.file.clone(),
                name: function.name.clone(),
                cost,
                percentage,
                coverage,
            }
        })
        .collect();

    // Sort by cost (descending) - unstable sort is faster
    hotspots.sort_unstable_by_key(|h| std::cmp::Reverse(h.cost));
    if limit > 0 {
        hotspots.truncate(limit);
    }
    hotspots
}
