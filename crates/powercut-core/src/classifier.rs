//! Journaling verdicts
//!
//! [`classify`] maps an [`IntegrityReport`] to a [`JournalingVerdict`]. Rules
//! are tried in order and the first match wins; anything not covered is
//! [`Rating::Undefined`], so every combination of the four booleans has
//! exactly one verdict.

use crate::verifier::IntegrityReport;
use serde::Serialize;

/// Effectiveness rating of a filesystem's journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    /// Rolled back cleanly or completed despite the crash
    Excellent,
    /// Source preserved, destination partial
    Good,
    /// Data lost or corrupted
    Poor,
    /// State not covered by any rule
    Undefined,
}

impl Rating {
    /// Upper-case label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "EXCELLENT",
            Rating::Good => "GOOD",
            Rating::Poor => "POOR",
            Rating::Undefined => "UNDEFINED",
        }
    }

    /// Whether the journal did its job
    pub fn is_effective(&self) -> bool {
        matches!(self, Rating::Excellent | Rating::Good)
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A rating with its explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JournalingVerdict {
    /// The rating
    pub rating: Rating,
    /// Human-readable rationale
    pub rationale: &'static str,
}

/// Decide how well the journal held up
pub fn classify(report: &IntegrityReport) -> JournalingVerdict {
    let source_exists = report.source_exists();
    let source_intact = report.source_intact();
    let dest_exists = report.destination_exists();
    let dest_intact = report.destination_intact();

    let (rating, rationale) = if source_intact && !dest_exists {
        (
            Rating::Excellent,
            "Journaling worked perfectly! Operation completely rolled back with source intact.",
        )
    } else if source_exists && dest_exists && dest_intact {
        (
            Rating::Excellent,
            "Journaling worked perfectly! Operation completed successfully despite crash.",
        )
    } else if source_intact && dest_exists && !dest_intact {
        (
            Rating::Good,
            "Journaling worked well! Source preserved, but destination incomplete.",
        )
    } else if !source_exists && !dest_intact {
        (
            Rating::Poor,
            "Journaling failed! Source lost and destination corrupted.",
        )
    } else if !source_intact && !dest_intact {
        (
            Rating::Poor,
            "Journaling failed! Both source and destination corrupted.",
        )
    } else {
        (Rating::Undefined, "Unexpected state. Review result details.")
    };

    JournalingVerdict { rating, rationale }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(se: bool, si: bool, de: bool, di: bool) -> JournalingVerdict {
        classify(&IntegrityReport::new(se, si, de, di))
    }

    fn all_reports() -> Vec<IntegrityReport> {
        (0u8..16)
            .map(|bits| {
                IntegrityReport::new(bits & 8 != 0, bits & 4 != 0, bits & 2 != 0, bits & 1 != 0)
            })
            .collect()
    }

    #[test]
    fn test_rolled_back() {
        let v = verdict(true, true, false, false);
        assert_eq!(v.rating, Rating::Excellent);
        assert!(v.rationale.contains("rolled back"));
    }

    #[test]
    fn test_completed_despite_crash() {
        let v = verdict(true, true, true, true);
        assert_eq!(v.rating, Rating::Excellent);
        assert!(v.rationale.contains("completed successfully"));
    }

    #[test]
    fn test_destination_partial() {
        let v = verdict(true, true, true, false);
        assert_eq!(v.rating, Rating::Good);
        assert!(v.rationale.contains("destination incomplete"));
    }

    #[test]
    fn test_source_lost() {
        let v = verdict(false, false, true, false);
        assert_eq!(v.rating, Rating::Poor);
        assert!(v.rationale.contains("Source lost"));

        let v = verdict(false, false, false, false);
        assert_eq!(v.rating, Rating::Poor);
        assert!(v.rationale.contains("Source lost"));
    }

    #[test]
    fn test_both_corrupted() {
        let v = verdict(true, false, true, false);
        assert_eq!(v.rating, Rating::Poor);
        assert!(v.rationale.contains("Both source and destination corrupted"));
    }

    #[test]
    fn test_source_corrupted_destination_intact_is_excellent() {
        // rule 2 only asks that the source exists
        assert_eq!(verdict(true, false, true, true).rating, Rating::Excellent);
    }

    #[test]
    fn test_undefined_states() {
        // destination intact without a source
        assert_eq!(verdict(false, false, true, true).rating, Rating::Undefined);
        // source corrupted, destination gone but "intact"
        assert_eq!(verdict(true, false, false, true).rating, Rating::Undefined);
        assert_eq!(
            verdict(false, false, true, true).rationale,
            "Unexpected state. Review result details."
        );
    }

    #[test]
    fn test_total_and_pure() {
        for report in all_reports() {
            let first = classify(&report);
            let second = classify(&report);
            assert_eq!(first, second);
            assert!(matches!(
                first.rating,
                Rating::Excellent | Rating::Good | Rating::Poor | Rating::Undefined
            ));
            assert!(!first.rationale.is_empty());
        }
    }

    #[test]
    fn test_every_rating_reachable() {
        let ratings: std::collections::HashSet<Rating> =
            all_reports().iter().map(|r| classify(r).rating).collect();
        assert_eq!(ratings.len(), 4);
    }

    #[test]
    fn test_rating_labels() {
        assert_eq!(Rating::Excellent.to_string(), "EXCELLENT");
        assert_eq!(Rating::Good.to_string(), "GOOD");
        assert_eq!(Rating::Poor.to_string(), "POOR");
        assert_eq!(Rating::Undefined.to_string(), "UNDEFINED");
        assert!(Rating::Good.is_effective());
        assert!(!Rating::Poor.is_effective());
        assert!(!Rating::Undefined.is_effective());
    }

    #[test]
    fn test_rating_serializes_upper_case() {
        let json = serde_json::to_string(&Rating::Excellent).unwrap();
        assert_eq!(json, "\"EXCELLENT\"");
    }
}
