//! Istanbul-style recognition measure.
//!
//! Purely descriptive: eight counts crossing the spatial relation (exact,
//! excess, partial) with type correctness, plus plain false positives and
//! negatives. No derived scores. Processing order matters: exact positions
//! first, then estimations strictly enclosing their reference, then any
//! remaining overlap, and finally the leftovers.

use std::path::Path;

use crate::article::ArticleCategory;
use crate::entity::EntityType;
use crate::error::Result;
use crate::eval::measure::{
    clean_mentions, compute_scores, read_table, write_table, Breakdown, Scores,
};
use crate::Mentions;

/// Perfectly estimated mention.
pub const TRUE_POSITIVE_CORRECT_TYPE: &str = "TruePositiveCorrectType";
/// Limits are correct, type is wrong.
pub const TRUE_POSITIVE_WRONG_TYPE: &str = "TruePositiveWrongType";
/// Estimated limits contain more than the reference, type is correct.
pub const EXCESS_POSITIVE_CORRECT_TYPE: &str = "ExcessPositiveCorrectType";
/// Estimated limits contain more than the reference, type is wrong.
pub const EXCESS_POSITIVE_WRONG_TYPE: &str = "ExcessPositiveWrongType";
/// Estimated limits contain less than the reference, type is correct.
pub const PARTIAL_POSITIVE_CORRECT_TYPE: &str = "PartialPositiveCorrectType";
/// Estimated limits contain less than the reference, type is wrong.
pub const PARTIAL_POSITIVE_WRONG_TYPE: &str = "PartialPositiveWrongType";
/// Estimated limits intersect no reference mention.
pub const FALSE_POSITIVE: &str = "FalsePositive";
/// Reference limits intersect no estimated mention.
pub const FALSE_NEGATIVE: &str = "FalseNegative";

const COUNT_NAMES: &[&str] = &[
    TRUE_POSITIVE_CORRECT_TYPE,
    TRUE_POSITIVE_WRONG_TYPE,
    EXCESS_POSITIVE_CORRECT_TYPE,
    EXCESS_POSITIVE_WRONG_TYPE,
    PARTIAL_POSITIVE_CORRECT_TYPE,
    PARTIAL_POSITIVE_WRONG_TYPE,
    FALSE_POSITIVE,
    FALSE_NEGATIVE,
];
const SCORE_NAMES: &[&str] = &[];

/// Istanbul-style measure comparing an estimated mention set to a reference
/// one.
#[derive(Debug, Clone)]
pub struct IstanbulMeasure {
    counts: Breakdown,
}

impl IstanbulMeasure {
    /// Conventional name of the measure.
    pub const NAME: &'static str = "ISTANBUL";
    /// File name under which results are persisted.
    pub const FILE_NAME: &'static str = "istanbul.txt";

    /// An empty measure for the given evaluated types, to aggregate into.
    #[must_use]
    pub fn new(types: &[EntityType]) -> Self {
        Self {
            counts: Breakdown::new(COUNT_NAMES, types),
        }
    }

    /// Evaluate `estimation` against `reference` for one article.
    #[must_use]
    pub fn evaluate(
        types: &[EntityType],
        reference: &Mentions,
        estimation: &Mentions,
        categories: &[ArticleCategory],
    ) -> Self {
        let mut measure = Self::new(types);
        measure.process(
            clean_mentions(reference, types),
            clean_mentions(estimation, types),
            categories,
        );
        measure
    }

    fn process(
        &mut self,
        mut reference: Vec<crate::Mention>,
        mut estimation: Vec<crate::Mention>,
        categories: &[ArticleCategory],
    ) {
        // exact positions
        self.pass(
            &mut reference,
            &mut estimation,
            TRUE_POSITIVE_CORRECT_TYPE,
            TRUE_POSITIVE_WRONG_TYPE,
            categories,
            |r, e| r.has_same_position(e),
        );
        // estimation strictly contains the reference
        self.pass(
            &mut reference,
            &mut estimation,
            EXCESS_POSITIVE_CORRECT_TYPE,
            EXCESS_POSITIVE_WRONG_TYPE,
            categories,
            |r, e| e.contains(r),
        );
        // any remaining overlap
        self.pass(
            &mut reference,
            &mut estimation,
            PARTIAL_POSITIVE_CORRECT_TYPE,
            PARTIAL_POSITIVE_WRONG_TYPE,
            categories,
            |r, e| e.overlaps_with(r),
        );

        // everything left unmatched
        for est in &estimation {
            self.counts.add(FALSE_POSITIVE, est.entity_type, categories);
        }
        for ref_mention in &reference {
            self.counts
                .add(FALSE_NEGATIVE, ref_mention.entity_type, categories);
        }
    }

    /// One matching pass: the first estimated mention satisfying `matches`
    /// claims each reference mention, and the pair is counted under the
    /// correct- or wrong-type name keyed by the reference type.
    fn pass(
        &mut self,
        reference: &mut Vec<crate::Mention>,
        estimation: &mut Vec<crate::Mention>,
        correct_type: &'static str,
        wrong_type: &'static str,
        categories: &[ArticleCategory],
        matches: impl Fn(&crate::Mention, &crate::Mention) -> bool,
    ) {
        let mut r = 0;
        while r < reference.len() {
            let position = estimation.iter().position(|est| matches(&reference[r], est));
            match position {
                Some(e) => {
                    let ref_mention = reference.remove(r);
                    let est_mention = estimation.remove(e);
                    let name = if ref_mention.entity_type == est_mention.entity_type {
                        correct_type
                    } else {
                        wrong_type
                    };
                    self.counts.add(name, ref_mention.entity_type, categories);
                }
                None => r += 1,
            }
        }
    }

    /// The overall value of a count.
    #[must_use]
    pub fn count(&self, name: &str) -> i64 {
        self.counts.count(name)
    }

    /// The value of a count restricted to one entity type.
    #[must_use]
    pub fn count_by_type(&self, name: &str, entity_type: EntityType) -> i64 {
        self.counts.count_by_type(name, entity_type)
    }

    /// The value of a count restricted to one article category.
    #[must_use]
    pub fn count_by_category(&self, name: &str, category: ArticleCategory) -> i64 {
        self.counts.count_by_category(name, category)
    }

    /// Add another measure's counts into this one (corpus aggregation).
    pub fn merge(&mut self, other: &IstanbulMeasure) -> Result<()> {
        self.counts.merge(&other.counts)
    }

    /// This measure defines no derived scores; the table is always empty.
    pub fn scores(&self) -> Result<Scores> {
        compute_scores(&self.counts, SCORE_NAMES, &|_| Ok(Vec::new()))
    }

    /// Write the counts to `path` in the tabular text format.
    pub fn write_to(&self, path: &Path, tool: &str, dataset: &str) -> Result<()> {
        write_table(path, tool, dataset, Self::NAME, &self.counts, &self.scores()?)
    }

    /// Read a measure back from `path`.
    pub fn read_from(path: &Path) -> Result<Self> {
        let (counts, _) = read_table(path, COUNT_NAMES, SCORE_NAMES)?;
        Ok(Self { counts })
    }
}
