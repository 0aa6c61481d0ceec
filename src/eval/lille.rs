//! Lille-style recognition measure.
//!
//! Separates the spatial dimension (full/partial match, wrong hit, complete
//! miss) from the typical one (true/false positive, false negative, only
//! counted where a spatial match exists). Spatial scores come in full,
//! partial and total variants, where the total is the sum of the other two.

use std::path::Path;

use crate::article::ArticleCategory;
use crate::entity::EntityType;
use crate::error::Result;
use crate::eval::measure::{
    clean_mentions, compute_scores, f_measure, ratio, read_table, write_table, Breakdown, Scores,
};
use crate::Mentions;

/// Both mentions occupy exactly the same position.
pub const FULL_MATCHES: &str = "FullMatches";
/// The mention positions overlap without coinciding.
pub const PARTIAL_MATCHES: &str = "PartialMatches";
/// A mention was detected where the reference has nothing.
pub const WRONG_HITS: &str = "WrongHits";
/// Nothing was detected where the reference has a mention.
pub const COMPLETE_MISSES: &str = "CompleteMisses";
/// Matched mention with the correct type.
pub const TRUE_POSITIVES: &str = "TruePositives";
/// Detected type where another one was expected, or spurious detection.
pub const FALSE_POSITIVES: &str = "FalsePositives";
/// Expected type not found, or missed reference mention.
pub const FALSE_NEGATIVES: &str = "FalseNegatives";

/// Precision earned by the full matches.
pub const FULL_PRECISION: &str = "FullPrecision";
/// Precision earned by the partial matches.
pub const PARTIAL_PRECISION: &str = "PartialPrecision";
/// Sum of the full and partial precisions.
pub const TOTAL_PRECISION: &str = "TotalPrecision";
/// Recall earned by the full matches.
pub const FULL_RECALL: &str = "FullRecall";
/// Recall earned by the partial matches.
pub const PARTIAL_RECALL: &str = "PartialRecall";
/// Sum of the full and partial recalls.
pub const TOTAL_RECALL: &str = "TotalRecall";
/// Harmonic mean of the total precision and recall.
pub const TOTAL_F_MEASURE: &str = "TF-Measure";
/// Precision over the typical counts.
pub const PRECISION: &str = "Precision";
/// Recall over the typical counts.
pub const RECALL: &str = "Recall";
/// Harmonic mean of the typical precision and recall.
pub const F_MEASURE: &str = "F-Measure";

const COUNT_NAMES: &[&str] = &[
    FULL_MATCHES,
    PARTIAL_MATCHES,
    WRONG_HITS,
    COMPLETE_MISSES,
    TRUE_POSITIVES,
    FALSE_POSITIVES,
    FALSE_NEGATIVES,
];
const SCORE_NAMES: &[&str] = &[
    FULL_PRECISION,
    PARTIAL_PRECISION,
    TOTAL_PRECISION,
    FULL_RECALL,
    PARTIAL_RECALL,
    TOTAL_RECALL,
    TOTAL_F_MEASURE,
    PRECISION,
    RECALL,
    F_MEASURE,
];

/// Lille-style measure comparing an estimated mention set to a reference one.
#[derive(Debug, Clone)]
pub struct LilleMeasure {
    counts: Breakdown,
}

impl LilleMeasure {
    /// Conventional name of the measure.
    pub const NAME: &'static str = "LILLE";
    /// File name under which results are persisted.
    pub const FILE_NAME: &'static str = "lille.txt";

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
        // full spatial matches
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
                    // a type mismatch attributes the match to both types
                    self.counts.add_dual(FULL_MATCHES, rt, et, categories);
                    self.typical(rt, et, categories);
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
                    self.counts.add_dual(PARTIAL_MATCHES, rt, et, categories);
                    self.typical(rt, et, categories);
                }
                None => r += 1,
            }
        }

        // wrong hits: leftover estimated mentions
        for est in &estimation {
            let et = est.entity_type;
            self.counts.add(WRONG_HITS, et, categories);
            self.counts.add(FALSE_POSITIVES, et, categories);
        }

        // complete misses: leftover reference mentions
        for ref_mention in &reference {
            let rt = ref_mention.entity_type;
            self.counts.add(COMPLETE_MISSES, rt, categories);
            self.counts.add(FALSE_NEGATIVES, rt, categories);
        }
    }

    /// Typical (type-comparison) counts for a spatially matched pair.
    fn typical(&mut self, rt: EntityType, et: EntityType, categories: &[ArticleCategory]) {
        if rt == et {
            self.counts.add(TRUE_POSITIVES, et, categories);
        } else {
            self.counts.add(FALSE_NEGATIVES, rt, categories);
            self.counts.add(FALSE_POSITIVES, et, categories);
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
    pub fn merge(&mut self, other: &LilleMeasure) -> Result<()> {
        self.counts.merge(&other.counts)
    }

    /// Compute the scores from the current counts.
    pub fn scores(&self) -> Result<Scores> {
        compute_scores(&self.counts, SCORE_NAMES, &|count| {
            let fm = count(FULL_MATCHES);
            let pm = count(PARTIAL_MATCHES);
            let wh = count(WRONG_HITS);
            let cm = count(COMPLETE_MISSES);

            let full_precision = ratio(fm, fm + pm + wh);
            let partial_precision = ratio(pm, fm + pm + wh);
            let total_precision = full_precision + partial_precision;
            let full_recall = ratio(fm, fm + pm + cm);
            let partial_recall = ratio(pm, fm + pm + cm);
            let total_recall = full_recall + partial_recall;
            let total_f = f_measure(total_precision, total_recall);

            let tp = count(TRUE_POSITIVES);
            let fp = count(FALSE_POSITIVES);
            let fn_ = count(FALSE_NEGATIVES);
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);

            Ok(vec![
                (FULL_PRECISION, full_precision),
                (PARTIAL_PRECISION, partial_precision),
                (TOTAL_PRECISION, total_precision),
                (FULL_RECALL, full_recall),
                (PARTIAL_RECALL, partial_recall),
                (TOTAL_RECALL, total_recall),
                (TOTAL_F_MEASURE, total_f),
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
