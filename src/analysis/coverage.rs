//! Coverage aggregation
//!
//! A compiled line is one that appears in the profile at all; comments and
//! blank lines never show up as data rows, so they are excluded by
//! construction. A covered line is a compiled line that executed at least
//! once. Coverage is rolled up function → file → profile in one pass after
//! parsing, before the model freezes.

use std::collections::BTreeSet;

use crate::profile_data::Profile;

/// Fill in covered/uncovered line lists and coverage percentages.
///
/// Called exactly once, between parsing and index construction.
#[allow(clippy::cast_precision_loss)]
pub fn compute_coverage(profile: &mut Profile) {
    let mut total_compiled = 0;
    let mut total_covered = 0;

    for file in profile.files_mut() {
        let mut covered: BTreeSet<u32> = BTreeSet::new();
        let mut uncovered: BTreeSet<u32> = BTreeSet::new();

        for function in file.functions_mut() {
            function.covered =
                function.lines.iter().filter(|(_, r)| r.executed()).map(|(&l, _)| l).collect();
            function.uncovered =
                function.lines.iter().filter(|(_, r)| !r.executed()).map(|(&l, _)| l).collect();
            covered.extend(function.covered.iter().copied());
            uncovered.extend(function.uncovered.iter().copied());
        }

        // A line both covered in one function and compiled-but-idle in
        // another counts once toward the union
        file.compiled_lines = covered.union(&uncovered).count();
        file.coverage = if file.compiled_lines == 0 {
            0.0
        } else {
            covered.len() as f64 / file.compiled_lines as f64 * 100.0
        };

        total_compiled += file.compiled_lines;
        total_covered += covered.len();

        file.covered = covered;
        file.uncovered = uncovered;
    }

    profile.total_compiled_lines = total_compiled;
    profile.total_covered_lines = total_covered;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{parse_profile, ParseOptions};
    use std::io::Cursor;

    fn analyzed(text: &str) -> Profile {
        let mut profile =
            parse_profile(Cursor::new(text), &ParseOptions::default()).expect("parse");
        compute_coverage(&mut profile);
        profile
    }

    #[test]
    fn test_half_covered_function() {
        let profile = analyzed(
            "events: Ir\n\
             fl=x.c\n\
             fn=g\n\
             5 100\n\
             7 0\n",
        );

        let g = profile.function("x.c", "g").unwrap();
        assert_eq!(g.covered, [5]);
        assert_eq!(g.uncovered, [7]);

        let file = profile.file("x.c").unwrap();
        assert_eq!(file.compiled_lines, 2);
        assert!((file.coverage - 50.0).abs() < 1e-9);
        assert!((profile.coverage() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_file_unions_over_functions() {
        let profile = analyzed(
            "events: Ir\n\
             fl=x.c\n\
             fn=a\n\
             1 1\n\
             2 0\n\
             fn=b\n\
             3 1\n\
             4 1\n",
        );

        let file = profile.file("x.c").unwrap();
        assert_eq!(file.covered.iter().copied().collect::<Vec<_>>(), [1, 3, 4]);
        assert_eq!(file.uncovered.iter().copied().collect::<Vec<_>>(), [2]);
        assert_eq!(file.compiled_lines, 4);
        assert!((file.coverage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_file_has_zero_coverage() {
        let profile = analyzed("events: Ir\nfl=empty.c\n");
        let file = profile.file("empty.c").unwrap();
        assert_eq!(file.compiled_lines, 0);
        assert_eq!(file.coverage, 0.0);
    }

    #[test]
    fn test_profile_totals_sum_across_files() {
        let profile = analyzed(
            "events: Ir\n\
             fl=a.c\n\
             fn=f\n\
             1 1\n\
             fl=b.c\n\
             fn=g\n\
             1 0\n\
             2 1\n",
        );
        assert_eq!(profile.total_compiled_lines, 3);
        assert_eq!(profile.total_covered_lines, 2);
    }
}
