//! Recognizer-output combination.
//!
//! All combiners share one contract: one [`Mentions`](crate::Mentions) object
//! per recognizer for the same article in, one consensus
//! [`Mentions`](crate::Mentions) out. Two strategies are provided:
//!
//! - [`VoteCombiner`]: weighted voting over whole mentions grouped by spatial
//!   overlap (with [`StraightCombiner`] as the uniform no-model baseline);
//! - [`SvmCombiner`]: a pre-trained classifier decides existence and type,
//!   either per overlap group or per word (BIO chunking), with voting only
//!   used to settle boundaries in the group-based mode.

mod overlap;
mod straight;
mod svm;
mod vote;
mod weights;

pub use overlap::{overlap_groups, word_groups, word_spans, WordMention};
pub use straight::StraightCombiner;
pub use svm::{Classifier, ClassifierFn, CombineMode, LazyClassifier, SvmCombiner, WordTag};
pub use vote::{VoteCombiner, VoteMode};
pub use weights::{CategoryProportions, VoteWeights};

use std::collections::BTreeMap;

use crate::article::Article;
use crate::error::Result;
use crate::mention::ProcessId;
use crate::{Mentions, Recognizer};

/// Run every recognizer on `article` and collect the per-recognizer outputs,
/// keeping only mentions whose type belongs to `handled_types`.
pub fn apply_recognizers(
    recognizers: &[&dyn Recognizer],
    article: &Article,
    handled_types: &[crate::EntityType],
) -> Result<BTreeMap<ProcessId, Mentions>> {
    let mut outputs = BTreeMap::new();
    for recognizer in recognizers {
        let mut mentions = recognizer.recognize(article)?;
        mentions.retain_types(handled_types);
        outputs.insert(recognizer.id(), mentions);
    }
    Ok(outputs)
}
