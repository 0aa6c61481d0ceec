//! Vote-based combination of recognizer outputs.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::article::{Article, ArticleCategory};
use crate::combine::overlap::overlap_groups;
use crate::combine::weights::{CategoryProportions, VoteWeights};
use crate::entity::{EntityType, EntityValue};
use crate::error::{Error, Result};
use crate::eval::lille;
use crate::mention::{Mention, ProcessId};
use crate::Mentions;

/// How recognizer votes are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteMode {
    /// Every recognizer casts the same vote (weight 1)
    Uniform,
    /// Votes weighted by each recognizer's overall scores on training data
    WeightedOverall,
    /// Votes weighted by category-wise scores on training data
    WeightedCategory,
}

impl VoteMode {
    /// Whether this mode requires loaded vote weights.
    #[must_use]
    pub fn has_weights(self) -> bool {
        matches!(self, VoteMode::WeightedOverall | VoteMode::WeightedCategory)
    }
}

/// Fuses several recognizers' outputs by letting them vote, per overlap
/// group, on mention existence, boundaries, type and value.
///
/// Optional "against" votes (`use_recall`) subtract weight from positions and
/// types proposed by other recognizers, penalizing recall-poor recognizers.
#[derive(Debug, Clone)]
pub struct VoteCombiner {
    source: ProcessId,
    recognizers: Vec<ProcessId>,
    handled_types: Vec<EntityType>,
    vote_mode: VoteMode,
    use_recall: bool,
    exist_vote: bool,
    weights: VoteWeights,
    proportions: CategoryProportions,
}

impl VoteCombiner {
    /// Create a combiner with explicit weights and proportions.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: ProcessId,
        recognizers: Vec<ProcessId>,
        handled_types: Vec<EntityType>,
        vote_mode: VoteMode,
        use_recall: bool,
        exist_vote: bool,
        weights: VoteWeights,
        proportions: CategoryProportions,
    ) -> Self {
        Self {
            source,
            recognizers,
            handled_types,
            vote_mode,
            use_recall,
            exist_vote,
            weights,
            proportions,
        }
    }

    /// Create a uniform-vote combiner with no training data.
    #[must_use]
    pub fn uniform(
        source: ProcessId,
        recognizers: Vec<ProcessId>,
        handled_types: Vec<EntityType>,
        exist_vote: bool,
    ) -> Self {
        let weights = VoteWeights::uniform(&recognizers);
        Self::new(
            source,
            recognizers,
            handled_types,
            VoteMode::Uniform,
            false,
            exist_vote,
            weights,
            CategoryProportions::uniform(),
        )
    }

    /// The entity types this combiner produces.
    #[must_use]
    pub fn handled_types(&self) -> &[EntityType] {
        &self.handled_types
    }

    /// Fuse the per-recognizer outputs for `article` into one consensus
    /// mention set.
    pub fn combine(
        &self,
        article: &Article,
        outputs: &BTreeMap<ProcessId, Mentions>,
    ) -> Result<Mentions> {
        let mut result = Mentions::new(self.source.clone());

        let mut filtered = outputs.clone();
        for mentions in filtered.values_mut() {
            mentions.retain_types(&self.handled_types);
        }
        let groups = overlap_groups(&filtered);
        let category_weights = self.proportions.category_weights(article);

        for group in groups {
            if !self.vote_for_existence(article, &category_weights, &group) {
                debug!("group voted out of existence");
                continue;
            }
            let uniform = self.vote_mode == VoteMode::Uniform;
            let Some((start, end)) = vote_for_position(
                article,
                &category_weights,
                &group,
                &self.recognizers,
                &self.weights,
                uniform,
                self.use_recall,
            ) else {
                warn!("no consistent position could be voted, dropping group");
                continue;
            };
            let entity_type =
                self.vote_for_type(article, &category_weights, &group);
            let text = article.text.get(start..end).ok_or_else(|| {
                Error::invalid_input(format!("voted span {start}..{end} outside article text"))
            })?;
            let mut mention = Mention::new(entity_type, start, end, text, self.source.clone());
            if entity_type.is_valued() {
                mention.value = vote_for_value(&group, &self.recognizers, entity_type);
            }
            result.add(mention);
        }
        Ok(result)
    }

    fn weight(
        &self,
        article: &Article,
        recognizer: &ProcessId,
        score: &str,
        category_weights: &BTreeMap<ArticleCategory, f32>,
    ) -> f32 {
        if self.vote_mode == VoteMode::Uniform {
            1.0
        } else {
            self.weights
                .voting_weight(article, recognizer, score, category_weights)
        }
    }

    /// Decide whether the group corresponds to an actual mention. Without
    /// `exist_vote`, any proposal wins.
    fn vote_for_existence(
        &self,
        article: &Article,
        category_weights: &BTreeMap<ArticleCategory, f32>,
        group: &BTreeMap<ProcessId, Mention>,
    ) -> bool {
        if !self.exist_vote {
            return true;
        }
        let mut vote_for = 0.0f32;
        let mut vote_against = 0.0f32;
        for recognizer in &self.recognizers {
            match group.get(recognizer) {
                Some(_) => {
                    vote_for +=
                        self.weight(article, recognizer, lille::TOTAL_PRECISION, category_weights);
                }
                None => {
                    let score = if self.use_recall {
                        lille::TOTAL_RECALL
                    } else {
                        lille::TOTAL_PRECISION
                    };
                    vote_against += self.weight(article, recognizer, score, category_weights);
                }
            }
        }
        vote_for - vote_against >= 0.0
    }

    /// Decide the mention type by weighted majority over the group.
    fn vote_for_type(
        &self,
        article: &Article,
        category_weights: &BTreeMap<ArticleCategory, f32>,
        group: &BTreeMap<ProcessId, Mention>,
    ) -> EntityType {
        let mut scores: BTreeMap<EntityType, f32> = BTreeMap::new();
        for recognizer in &self.recognizers {
            if let Some(mention) = group.get(recognizer) {
                let weight =
                    self.weight(article, recognizer, lille::TOTAL_PRECISION, category_weights);
                *scores.entry(mention.entity_type).or_insert(0.0) += weight;
            }
        }
        if self.use_recall {
            for recognizer in &self.recognizers {
                if let Some(mention) = group.get(recognizer) {
                    let weight =
                        self.weight(article, recognizer, lille::TOTAL_RECALL, category_weights);
                    for (entity_type, score) in scores.iter_mut() {
                        if *entity_type != mention.entity_type {
                            *score -= weight;
                        }
                    }
                }
            }
        }
        scores
            .into_iter()
            .max_by(|(ta, a), (tb, b)| {
                a.partial_cmp(b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // ties broken towards the earlier type, deterministically
                    .then(tb.cmp(ta))
            })
            .map(|(entity_type, _)| entity_type)
            // a group built from unregistered recognizers casts no votes;
            // take its first proposal
            .or_else(|| group.values().next().map(|m| m.entity_type))
            .expect("groups are never empty")
    }
}

/// Let the group's mentions vote on mention boundaries: each proposed start
/// and end position accumulates its proposer's weight, against-votes subtract
/// from the other candidates, and the best-scored consistent (start ≤ end)
/// pair wins, falling back along the ranked candidates when the top pair is
/// inconsistent.
pub(crate) fn vote_for_position(
    article: &Article,
    category_weights: &BTreeMap<ArticleCategory, f32>,
    group: &BTreeMap<ProcessId, Mention>,
    recognizers: &[ProcessId],
    weights: &VoteWeights,
    uniform: bool,
    use_recall: bool,
) -> Option<(usize, usize)> {
    let mut start_scores: BTreeMap<usize, f32> = BTreeMap::new();
    let mut end_scores: BTreeMap<usize, f32> = BTreeMap::new();

    // pro votes
    for recognizer in recognizers {
        if let Some(mention) = group.get(recognizer) {
            let weight = if uniform {
                1.0
            } else {
                weights.voting_weight(article, recognizer, lille::FULL_PRECISION, category_weights)
            };
            *start_scores.entry(mention.start).or_insert(0.0) += weight;
            *end_scores.entry(mention.end).or_insert(0.0) += weight;
        }
    }

    // against votes
    if use_recall {
        for recognizer in recognizers {
            if let Some(mention) = group.get(recognizer) {
                let weight = if uniform {
                    1.0
                } else {
                    weights.voting_weight(article, recognizer, lille::FULL_RECALL, category_weights)
                };
                for (pos, score) in start_scores.iter_mut() {
                    if *pos != mention.start {
                        *score -= weight;
                    }
                }
                for (pos, score) in end_scores.iter_mut() {
                    if *pos != mention.end {
                        *score -= weight;
                    }
                }
            }
        }
    }

    position_from_scores(&start_scores, &end_scores)
}

/// Pick the best-scored consistent (start, end) pair from the two score maps.
pub(crate) fn position_from_scores(
    start_scores: &BTreeMap<usize, f32>,
    end_scores: &BTreeMap<usize, f32>,
) -> Option<(usize, usize)> {
    let starts = ranked_positions(start_scores);
    let ends = ranked_positions(end_scores);
    if starts.is_empty() || ends.is_empty() {
        return None;
    }

    let mut si = 0;
    let mut ei = 0;
    while starts[si] > ends[ei] {
        if ei + 1 < ends.len() {
            ei += 1;
        } else if si + 1 < starts.len() {
            si += 1;
            ei = 0;
        } else {
            return None;
        }
    }
    Some((starts[si], ends[ei]))
}

/// Positions sorted by descending score, ties towards the earlier position.
fn ranked_positions(scores: &BTreeMap<usize, f32>) -> Vec<usize> {
    let mut positions: Vec<usize> = scores.keys().copied().collect();
    positions.sort_by(|a, b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });
    positions
}

/// Uniform vote on the value of a valued mention: the most proposed value
/// among group members of the decided type, if any.
pub(crate) fn vote_for_value(
    group: &BTreeMap<ProcessId, Mention>,
    recognizers: &[ProcessId],
    entity_type: EntityType,
) -> Option<EntityValue> {
    let mut scores: BTreeMap<EntityValue, u32> = BTreeMap::new();
    for recognizer in recognizers {
        if let Some(mention) = group.get(recognizer) {
            if mention.entity_type == entity_type {
                if let Some(value) = &mention.value {
                    *scores.entry(value.clone()).or_insert(0) += 1;
                }
            }
        }
    }
    scores
        .into_iter()
        .max_by(|(va, a), (vb, b)| a.cmp(b).then(vb.cmp(va)))
        .map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(entries: &[(&str, EntityType, usize, usize)]) -> BTreeMap<ProcessId, Mention> {
        entries
            .iter()
            .map(|(name, t, start, end)| {
                let id = ProcessId::new(*name);
                (id.clone(), Mention::new(*t, *start, *end, "m", id))
            })
            .collect()
    }

    fn recognizers(names: &[&str]) -> Vec<ProcessId> {
        names.iter().map(|n| ProcessId::new(*n)).collect()
    }

    fn outputs(sets: &[(&str, &[(EntityType, usize, usize)])]) -> BTreeMap<ProcessId, Mentions> {
        let mut result = BTreeMap::new();
        for (name, spans) in sets {
            let id = ProcessId::new(*name);
            let mut mentions = Mentions::new(id.clone());
            for (t, start, end) in *spans {
                mentions.add(Mention::new(*t, *start, *end, "m", id.clone()));
            }
            result.insert(id, mentions);
        }
        result
    }

    #[test]
    fn majority_start_and_end_win() {
        let recs = recognizers(&["a", "b", "c"]);
        let g = group(&[
            ("a", EntityType::Person, 0, 10),
            ("b", EntityType::Person, 0, 10),
            ("c", EntityType::Person, 2, 12),
        ]);
        let article = Article::new("t", "x".repeat(20));
        let weights = VoteWeights::uniform(&recs);
        let cat_weights = BTreeMap::new();
        let pos = vote_for_position(&article, &cat_weights, &g, &recs, &weights, true, false);
        assert_eq!(pos, Some((0, 10)));
    }

    #[test]
    fn inconsistent_top_pair_falls_back() {
        // start 12 scores highest, end 5 scores highest, but 12 > 5:
        // the walk advances through ranked ends, then ranked starts
        let mut start_scores = BTreeMap::new();
        start_scores.insert(12usize, 3.0f32);
        start_scores.insert(2usize, 2.0f32);
        let mut end_scores = BTreeMap::new();
        end_scores.insert(5usize, 3.0f32);
        assert_eq!(
            position_from_scores(&start_scores, &end_scores),
            Some((2, 5))
        );
    }

    #[test]
    fn no_consistent_position_yields_none() {
        let mut start_scores = BTreeMap::new();
        start_scores.insert(10usize, 1.0f32);
        let mut end_scores = BTreeMap::new();
        end_scores.insert(5usize, 1.0f32);
        assert_eq!(position_from_scores(&start_scores, &end_scores), None);
    }

    #[test]
    fn uniform_combiner_takes_majority_type() {
        let recs = recognizers(&["a", "b", "c"]);
        let combiner = VoteCombiner::uniform(
            ProcessId::new("vote"),
            recs,
            vec![EntityType::Person, EntityType::Location],
            false,
        );
        let article = Article::new("t", "Springfield is a place");
        let outs = outputs(&[
            ("a", &[(EntityType::Person, 0, 11)]),
            ("b", &[(EntityType::Location, 0, 11)]),
            ("c", &[(EntityType::Location, 0, 11)]),
        ]);
        let result = combiner.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 1);
        let m = result.get(0).unwrap();
        assert_eq!(m.entity_type, EntityType::Location);
        assert_eq!((m.start, m.end), (0, 11));
        assert_eq!(m.text, "Springfield");
    }

    #[test]
    fn existence_vote_drops_minority_proposals() {
        let recs = recognizers(&["a", "b", "c"]);
        let combiner = VoteCombiner::uniform(
            ProcessId::new("vote"),
            recs,
            vec![EntityType::Person],
            true,
        );
        let article = Article::new("t", "Some text with words");
        // only one of three recognizers proposes anything: 1 for, 2 against
        let outs = outputs(&[
            ("a", &[(EntityType::Person, 0, 4)]),
            ("b", &[]),
            ("c", &[]),
        ]);
        let result = combiner.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 0);

        // two of three: 2 for, 1 against
        let outs = outputs(&[
            ("a", &[(EntityType::Person, 0, 4)]),
            ("b", &[(EntityType::Person, 0, 4)]),
            ("c", &[]),
        ]);
        let result = combiner.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn types_outside_handled_list_are_ignored() {
        let recs = recognizers(&["a", "b"]);
        let combiner = VoteCombiner::uniform(
            ProcessId::new("vote"),
            recs,
            vec![EntityType::Person],
            false,
        );
        let article = Article::new("t", "Monday morning");
        let outs = outputs(&[
            ("a", &[(EntityType::Date, 0, 6)]),
            ("b", &[(EntityType::Date, 0, 6)]),
        ]);
        let result = combiner.combine(&article, &outs).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn value_vote_takes_majority() {
        use chrono::NaiveDate;
        let recs = recognizers(&["a", "b", "c"]);
        let d1 = EntityValue::Date(NaiveDate::from_ymd_opt(2013, 6, 4).unwrap());
        let d2 = EntityValue::Date(NaiveDate::from_ymd_opt(2013, 6, 5).unwrap());
        let mut g = BTreeMap::new();
        for (name, value) in [("a", &d1), ("b", &d1), ("c", &d2)] {
            let id = ProcessId::new(name);
            g.insert(
                id.clone(),
                Mention::new(EntityType::Date, 0, 10, "m", id).with_value(value.clone()),
            );
        }
        assert_eq!(
            vote_for_value(&g, &recs, EntityType::Date),
            Some(d1)
        );
    }
}
