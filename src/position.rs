//! Positional algebra over half-open text spans.
//!
//! All spans are `[start, end)` byte ranges into the article text. The
//! predicates here are the shared vocabulary of resolution, combination and
//! scoring: exact match, containment and overlap, plus the finer-grained
//! [`PositionRelation`] used by the word-level cursor walk.

use serde::{Deserialize, Serialize};

/// Whether two spans occupy exactly the same position.
#[must_use]
pub fn same_span(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start == b_start && a_end == b_end
}

/// Whether span A fully encloses span B (boundaries included).
#[must_use]
pub fn contains(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start <= b_start && a_end >= b_end
}

/// Whether two spans have a non-empty intersection. Exact matches and
/// containment both count as overlap; merely touching spans do not.
#[must_use]
pub fn overlaps(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    !(a_end <= b_start || b_end <= a_start)
}

/// Fine-grained relative position of two spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionRelation {
    /// The first span ends strictly before the second starts.
    CompletePrecedes,
    /// The first span starts strictly after the second ends.
    CompleteSucceeds,
    /// The first span starts earlier and the two at most share a boundary or
    /// partially intersect.
    PartialPrecedes,
    /// The first span starts later and the two at most share a boundary or
    /// partially intersect.
    PartialSucceeds,
    /// The first span fully contains the second.
    Contains,
    /// The first span is fully contained in the second.
    IsContained,
    /// Both spans occupy the exact same position.
    PerfectMatch,
}

impl PositionRelation {
    /// Classify the relative position of `[a_start, a_end)` with respect to
    /// `[b_start, b_end)`.
    #[must_use]
    pub fn of(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> Self {
        use PositionRelation::*;
        if a_start < b_start {
            if a_end < b_start {
                CompletePrecedes
            } else if a_end == b_start {
                PartialPrecedes
            } else if a_end < b_end {
                PartialPrecedes
            } else {
                Contains
            }
        } else if a_start == b_start {
            if a_end < b_end {
                IsContained
            } else if a_end == b_end {
                PerfectMatch
            } else {
                Contains
            }
        } else if a_start < b_end {
            if a_end <= b_end {
                IsContained
            } else {
                PartialSucceeds
            }
        } else if a_start == b_end {
            PartialSucceeds
        } else {
            CompleteSucceeds
        }
    }

    /// The symmetric relation (B relative to A).
    #[must_use]
    pub fn flip(self) -> Self {
        use PositionRelation::*;
        match self {
            CompletePrecedes => CompleteSucceeds,
            CompleteSucceeds => CompletePrecedes,
            PartialPrecedes => PartialSucceeds,
            PartialSucceeds => PartialPrecedes,
            Contains => IsContained,
            IsContained => Contains,
            PerfectMatch => PerfectMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_cases() {
        // [0,10) vs [5,15): overlap, no containment, not same
        assert!(overlaps(0, 10, 5, 15));
        assert!(!contains(0, 10, 5, 15));
        assert!(!contains(5, 15, 0, 10));
        assert!(!same_span(0, 10, 5, 15));
        // identical spans
        assert!(same_span(0, 10, 0, 10));
        assert!(overlaps(0, 10, 0, 10));
        assert!(contains(0, 10, 0, 10));
        // touching spans do not overlap
        assert!(!overlaps(0, 5, 5, 10));
    }

    #[test]
    fn relation_table() {
        use PositionRelation::*;
        assert_eq!(PositionRelation::of(0, 3, 5, 9), CompletePrecedes);
        assert_eq!(PositionRelation::of(5, 9, 0, 3), CompleteSucceeds);
        assert_eq!(PositionRelation::of(0, 5, 5, 9), PartialPrecedes);
        assert_eq!(PositionRelation::of(0, 7, 5, 9), PartialPrecedes);
        assert_eq!(PositionRelation::of(5, 9, 0, 7), PartialSucceeds);
        assert_eq!(PositionRelation::of(0, 9, 2, 7), Contains);
        assert_eq!(PositionRelation::of(0, 9, 0, 7), Contains);
        assert_eq!(PositionRelation::of(2, 7, 0, 9), IsContained);
        assert_eq!(PositionRelation::of(2, 9, 2, 9), PerfectMatch);
    }

    #[test]
    fn relation_flip_is_involution() {
        use PositionRelation::*;
        for rel in [
            CompletePrecedes,
            CompleteSucceeds,
            PartialPrecedes,
            PartialSucceeds,
            Contains,
            IsContained,
            PerfectMatch,
        ] {
            assert_eq!(rel.flip().flip(), rel);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            s1 in 0usize..100, l1 in 1usize..50,
            s2 in 0usize..100, l2 in 1usize..50,
        ) {
            prop_assert_eq!(
                overlaps(s1, s1 + l1, s2, s2 + l2),
                overlaps(s2, s2 + l2, s1, s1 + l1)
            );
        }

        #[test]
        fn relation_matches_predicates(
            s1 in 0usize..100, l1 in 1usize..50,
            s2 in 0usize..100, l2 in 1usize..50,
        ) {
            let (e1, e2) = (s1 + l1, s2 + l2);
            let rel = PositionRelation::of(s1, e1, s2, e2);
            if same_span(s1, e1, s2, e2) {
                prop_assert_eq!(rel, PositionRelation::PerfectMatch);
            }
            if rel == PositionRelation::Contains {
                prop_assert!(contains(s1, e1, s2, e2));
            }
            if rel == PositionRelation::CompletePrecedes
                || rel == PositionRelation::CompleteSucceeds {
                prop_assert!(!overlaps(s1, e1, s2, e2));
            }
        }

        #[test]
        fn flip_agrees_with_swapped_arguments(
            s1 in 0usize..100, l1 in 1usize..50,
            s2 in 0usize..100, l2 in 1usize..50,
        ) {
            let (e1, e2) = (s1 + l1, s2 + l2);
            // Boundary-touching spans classify as partial from either side,
            // so flip agrees with argument swapping everywhere.
            prop_assert_eq!(
                PositionRelation::of(s1, e1, s2, e2).flip(),
                PositionRelation::of(s2, e2, s1, e1)
            );
        }
    }
}
