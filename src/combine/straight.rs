//! The no-model baseline combiner.

use std::collections::BTreeMap;

use crate::article::Article;
use crate::combine::vote::{VoteCombiner, VoteMode};
use crate::combine::weights::{CategoryProportions, VoteWeights};
use crate::entity::EntityType;
use crate::error::Result;
use crate::mention::ProcessId;
use crate::Mentions;

/// Combines recognizer outputs with no trained data at all: any proposal is
/// kept, and uniform votes settle boundaries and type per overlap group.
/// Useful as the baseline the trained combiners are measured against.
#[derive(Debug, Clone)]
pub struct StraightCombiner {
    inner: VoteCombiner,
}

impl StraightCombiner {
    /// Create a baseline combiner for the given recognizers and types.
    #[must_use]
    pub fn new(
        source: ProcessId,
        recognizers: Vec<ProcessId>,
        handled_types: Vec<EntityType>,
    ) -> Self {
        let weights = VoteWeights::uniform(&recognizers);
        let inner = VoteCombiner::new(
            source,
            recognizers,
            handled_types,
            VoteMode::Uniform,
            false,
            false,
            weights,
            CategoryProportions::uniform(),
        );
        Self { inner }
    }

    /// Fuse the per-recognizer outputs for `article` into one consensus
    /// mention set.
    pub fn combine(
        &self,
        article: &Article,
        outputs: &BTreeMap<ProcessId, Mentions>,
    ) -> Result<Mentions> {
        self.inner.combine(article, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::Mention;

    #[test]
    fn every_group_with_a_proposal_survives() {
        let recognizers = vec![ProcessId::new("a"), ProcessId::new("b")];
        let combiner = StraightCombiner::new(
            ProcessId::new("straight"),
            recognizers,
            vec![EntityType::Person, EntityType::Location],
        );
        let article = Article::new("t", "Alice went to Paris");

        let mut outputs = BTreeMap::new();
        let a = ProcessId::new("a");
        let mut mentions_a = Mentions::new(a.clone());
        mentions_a.add(Mention::new(EntityType::Person, 0, 5, "Alice", a.clone()));
        outputs.insert(a, mentions_a);
        let b = ProcessId::new("b");
        let mut mentions_b = Mentions::new(b.clone());
        mentions_b.add(Mention::new(EntityType::Location, 14, 19, "Paris", b.clone()));
        outputs.insert(b, mentions_b);

        let result = combiner.combine(&article, &outputs).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(0).unwrap().text, "Alice");
        assert_eq!(result.get(1).unwrap().text, "Paris");
    }
}
