//! MUC-style recognition measure.
//!
//! The scheme of the Message Understanding Conference series, as described in
//! Nadeau & Sekine, "A survey of named entity recognition and classification"
//! (2007): three counts mixing the spatial and typical dimensions, with
//! `Actual` roughly twice the number of detected mentions and `Possible`
//! roughly twice the reference count.

use std::path::Path;

use crate::article::ArticleCategory;
use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::eval::measure::{
    clean_mentions, compute_scores, f_measure, ratio, read_table, write_table, Breakdown, Scores,
};
use crate::Mentions;

/// Perfect spatial matches or correct types.
pub const CORRECT: &str = "Correct";
/// Twice the number of detected mentions.
pub const ACTUAL: &str = "Actual";
/// Twice the number of reference mentions.
pub const POSSIBLE: &str = "Possible";

/// Precision, mixing the spatial and typical aspects.
pub const PRECISION: &str = "Precision";
/// Recall, mixing the spatial and typical aspects.
pub const RECALL: &str = "Recall";
/// Harmonic mean of precision and recall.
pub const F_MEASURE: &str = "F-Measure";

const COUNT_NAMES: &[&str] = &[CORRECT, ACTUAL, POSSIBLE];
const SCORE_NAMES: &[&str] = &[PRECISION, RECALL, F_MEASURE];

/// MUC-style measure comparing an estimated mention set to a reference one.
#[derive(Debug, Clone)]
pub struct MucMeasure {
    counts: Breakdown,
}

impl MucMeasure {
    /// Conventional name of the measure.
    pub const NAME: &'static str = "MUC";
    /// File name under which results are persisted.
    pub const FILE_NAME: &'static str = "muc.txt";

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
        // exact spatial matches
        let mut r = 0;
        while r < reference.len() {
            let position = estimation
                .iter()
                .position(|est| reference[r].has_same_position(est));
            match position {
                Some(e) => {
                    let ref_mention = reference.remove(r);
                    let est_mention = estimation.remove(e);
                    let (rt, et) = (ref_mention.entity_type, est_mention.entity_type);
                    // spatial evaluation
                    self.counts.add_dual(CORRECT, rt, et, categories);
                    self.counts.add_dual(ACTUAL, rt, et, categories);
                    self.counts.add_dual(POSSIBLE, rt, et, categories);
                    // typical evaluation
                    if rt == et {
                        self.counts.add(CORRECT, rt, categories);
                    }
                    self.counts.add(ACTUAL, et, categories);
                    self.counts.add(POSSIBLE, rt, categories);
                }
                None => r += 1,
            }
        }

        // partial spatial matches
        let mut r = 0;
        while r < reference.len() {
            let position = estimation
                .iter()
                .position(|est| reference[r].overlaps_with(est));
            match position {
                Some(e) => {
                    let ref_mention = reference.remove(r);
                    let est_mention = estimation.remove(e);
                    let (rt, et) = (ref_mention.entity_type, est_mention.entity_type);
                    // spatial evaluation: no correct count for a partial hit
                    self.counts.add(ACTUAL, et, categories);
                    self.counts.add(POSSIBLE, rt, categories);
                    // typical evaluation
                    if rt == et {
                        self.counts.add(CORRECT, rt, categories);
                    }
                    self.counts.add(ACTUAL, et, categories);
                    self.counts.add(POSSIBLE, rt, categories);
                }
                None => r += 1,
            }
        }

        // false alarms: estimated mentions with no reference counterpart
        for est in &estimation {
            let et = est.entity_type;
            self.counts.add(ACTUAL, et, categories);
            self.counts.add(ACTUAL, et, categories);
        }

        // omissions: reference mentions never detected
        for reference in &reference {
            let rt = reference.entity_type;
            self.counts.add(POSSIBLE, rt, categories);
            self.counts.add(POSSIBLE, rt, categories);
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
    pub fn merge(&mut self, other: &MucMeasure) -> Result<()> {
        self.counts.merge(&other.counts)
    }

    /// Compute the scores from the current counts.
    ///
    /// A precision or recall above 1 denotes corrupted counts and raises
    /// rather than being clamped.
    pub fn scores(&self) -> Result<Scores> {
        compute_scores(&self.counts, SCORE_NAMES, &|count| {
            let correct = count(CORRECT);
            let actual = count(ACTUAL);
            let possible = count(POSSIBLE);

            let precision = ratio(correct, actual);
            if precision > 1.0 {
                return Err(Error::evaluation(format!(
                    "precision above 1: {correct}/{actual}"
                )));
            }
            let recall = ratio(correct, possible);
            if recall > 1.0 {
                return Err(Error::evaluation(format!(
                    "recall above 1: {correct}/{possible}"
                )));
            }
            Ok(vec![
                (PRECISION, precision),
                (RECALL, recall),
                (F_MEASURE, f_measure(precision, recall)),
            ])
        })
    }

    /// Write counts and scores to `path` in the tabular text format.
    pub fn write_to(&self, path: &Path, tool: &str, dataset: &str) -> Result<()> {
        write_table(path, tool, dataset, Self::NAME, &self.counts, &self.scores()?)
    }

    /// Read a measure back from `path`, returning it together with the
    /// persisted scores.
    pub fn read_from(path: &Path) -> Result<(Self, Scores)> {
        let (counts, scores) = read_table(path, COUNT_NAMES, SCORE_NAMES)?;
        Ok((Self { counts }, scores))
    }
}
