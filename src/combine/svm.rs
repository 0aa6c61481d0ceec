//! Classifier-driven combination of recognizer outputs.
//!
//! The combiner encodes each unit of work (an overlap group, or one word in
//! BIO mode) as a fixed-order sparse feature vector, feeds it to a
//! pre-trained [`Classifier`], and decodes the returned class id back into a
//! decision. Class ids and decisions are related through explicit mapping
//! tables built once from the ordered handled-type list, so a changed type
//! list cannot silently shift the meaning of a class.

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use tracing::warn;

use crate::article::{Article, ArticleCategory};
use crate::combine::overlap::{overlap_groups, word_groups, WordMention};
use crate::combine::vote::{vote_for_position, vote_for_value};
use crate::combine::weights::{CategoryProportions, VoteWeights};
use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::mention::{Mention, ProcessId};
use crate::Mentions;

/// A trained classification model, as seen by the combiner: a fixed-order
/// sparse feature vector of (1-based index, value) pairs goes in, a numeric
/// class id comes out.
pub trait Classifier: Send + Sync {
    /// Predict the class of one encoded unit.
    fn predict(&self, features: &[(usize, f64)]) -> Result<f64>;
}

/// A classifier backed by a plain function, convenient for tests and for
/// wrapping external inference engines.
pub struct ClassifierFn<F>(pub F);

impl<F> Classifier for ClassifierFn<F>
where
    F: Fn(&[(usize, f64)]) -> Result<f64> + Send + Sync,
{
    fn predict(&self, features: &[(usize, f64)]) -> Result<f64> {
        (self.0)(features)
    }
}

/// A classifier loaded on first use. The loader runs at most once; a loading
/// failure surfaces on every prediction attempt.
pub struct LazyClassifier<F> {
    loader: F,
    cell: OnceCell<Box<dyn Classifier>>,
}

impl<F> LazyClassifier<F>
where
    F: Fn() -> Result<Box<dyn Classifier>> + Send + Sync,
{
    /// Create a lazily loaded classifier from a loader function.
    pub fn new(loader: F) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }
}

impl<F> Classifier for LazyClassifier<F>
where
    F: Fn() -> Result<Box<dyn Classifier>> + Send + Sync,
{
    fn predict(&self, features: &[(usize, f64)]) -> Result<f64> {
        let inner = self.cell.get_or_try_init(|| (self.loader)())?;
        inner.predict(features)
    }
}

/// Granularity and weighting of the classifier-driven combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// One overlap group per prediction, uniform boundary votes
    MentionUniform,
    /// One overlap group per prediction, overall-score boundary votes
    MentionWeightedOverall,
    /// One overlap group per prediction, category-score boundary votes
    MentionWeightedCategory,
    /// One word per prediction (BIO chunking)
    ChunkSingle,
    /// One word per prediction, previous decision fed back as a feature
    ChunkPrevious,
}

impl CombineMode {
    /// Whether this mode requires loaded vote weights.
    #[must_use]
    pub fn has_weights(self) -> bool {
        matches!(
            self,
            CombineMode::MentionWeightedOverall | CombineMode::MentionWeightedCategory
        )
    }

    /// Whether this mode classifies word chunks rather than whole mentions.
    #[must_use]
    pub fn is_chunk_based(self) -> bool {
        matches!(self, CombineMode::ChunkSingle | CombineMode::ChunkPrevious)
    }
}

/// BIO decision for one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordTag {
    /// The word is outside any mention
    Outside,
    /// The word begins a mention of the given type
    Begin(EntityType),
    /// The word continues a mention of the given type
    Inside(EntityType),
}

/// Bidirectional mapping between chunk-mode class ids and word tags:
/// class 1 is Outside, class 2k begins the k-th handled type, class 2k+1
/// continues it.
#[derive(Debug, Clone)]
struct ChunkClassMap {
    tags: Vec<WordTag>,
}

impl ChunkClassMap {
    fn new(handled_types: &[EntityType]) -> Self {
        let mut tags = vec![WordTag::Outside];
        for entity_type in handled_types {
            tags.push(WordTag::Begin(*entity_type));
            tags.push(WordTag::Inside(*entity_type));
        }
        Self { tags }
    }

    fn decode(&self, class: f64) -> Result<WordTag> {
        let index = class as i64;
        if index < 1 || index as usize > self.tags.len() {
            return Err(Error::decoding(format!(
                "chunk class {class} outside 1..={}",
                self.tags.len()
            )));
        }
        Ok(self.tags[index as usize - 1])
    }

    #[cfg(test)]
    fn encode(&self, tag: WordTag) -> Option<usize> {
        self.tags.iter().position(|t| *t == tag).map(|i| i + 1)
    }
}

/// Mapping between mention-mode class ids and type decisions: class 1 means
/// no mention, class k+1 means the k-th handled type.
#[derive(Debug, Clone)]
struct MentionClassMap {
    types: Vec<EntityType>,
}

impl MentionClassMap {
    fn new(handled_types: &[EntityType]) -> Self {
        Self {
            types: handled_types.to_vec(),
        }
    }

    fn decode(&self, class: f64) -> Result<Option<EntityType>> {
        let index = class as i64;
        if index < 1 || index as usize > self.types.len() + 1 {
            return Err(Error::decoding(format!(
                "mention class {class} outside 1..={}",
                self.types.len() + 1
            )));
        }
        if index == 1 {
            Ok(None)
        } else {
            Ok(Some(self.types[index as usize - 2]))
        }
    }
}

/// Fuses several recognizers' outputs through a pre-trained classifier,
/// either mention-group by mention-group or word by word.
pub struct SvmCombiner {
    source: ProcessId,
    recognizers: Vec<ProcessId>,
    handled_types: Vec<EntityType>,
    combine_mode: CombineMode,
    use_categories: bool,
    use_recall: bool,
    classifier: Box<dyn Classifier>,
    weights: VoteWeights,
    proportions: CategoryProportions,
    mention_classes: MentionClassMap,
    chunk_classes: ChunkClassMap,
}

impl SvmCombiner {
    /// Create a combiner around a trained classifier.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: ProcessId,
        recognizers: Vec<ProcessId>,
        handled_types: Vec<EntityType>,
        combine_mode: CombineMode,
        use_categories: bool,
        use_recall: bool,
        classifier: Box<dyn Classifier>,
        weights: VoteWeights,
        proportions: CategoryProportions,
    ) -> Self {
        let mention_classes = MentionClassMap::new(&handled_types);
        let chunk_classes = ChunkClassMap::new(&handled_types);
        Self {
            source,
            recognizers,
            handled_types,
            combine_mode,
            use_categories,
            use_recall,
            classifier,
            weights,
            proportions,
            mention_classes,
            chunk_classes,
        }
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
        let mut filtered = outputs.clone();
        for mentions in filtered.values_mut() {
            mentions.retain_types(&self.handled_types);
        }
        if self.combine_mode.is_chunk_based() {
            self.combine_by_word(article, &filtered)
        } else {
            self.combine_by_mention(article, &filtered)
        }
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    fn push_category_block(&self, article: &Article, features: &mut Vec<(usize, f64)>) {
        for category in ArticleCategory::ALL {
            let value = if article.categories.contains(&category) {
                1.0
            } else {
                -1.0
            };
            features.push((features.len() + 1, value));
        }
    }

    /// One-hot block over the handled types: +1 for the proposed type, -1
    /// elsewhere (all -1 when the recognizer proposed nothing).
    fn push_type_block(&self, proposed: Option<EntityType>, features: &mut Vec<(usize, f64)>) {
        for entity_type in &self.handled_types {
            let value = if proposed == Some(*entity_type) {
                1.0
            } else {
                -1.0
            };
            features.push((features.len() + 1, value));
        }
    }

    /// Type block plus the two BIO flag slots (B, I). `None` tag means
    /// Outside.
    fn push_word_block(
        &self,
        proposed: Option<(EntityType, bool)>,
        features: &mut Vec<(usize, f64)>,
    ) {
        self.push_type_block(proposed.map(|(t, _)| t), features);
        let (begin, inside) = match proposed {
            None => (-1.0, -1.0),
            Some((_, true)) => (1.0, -1.0),
            Some((_, false)) => (-1.0, 1.0),
        };
        features.push((features.len() + 1, begin));
        features.push((features.len() + 1, inside));
    }

    fn check_shape(&self, features: &[(usize, f64)], expected: usize) -> Result<()> {
        if features.len() != expected {
            return Err(Error::encoding(format!(
                "feature vector has {} slots, expected {expected}",
                features.len()
            )));
        }
        Ok(())
    }

    /// Encode an overlap group for the mention-by-mention mode.
    fn encode_group(
        &self,
        article: &Article,
        group: &BTreeMap<ProcessId, Mention>,
    ) -> Result<Vec<(usize, f64)>> {
        let mut expected = self.recognizers.len() * self.handled_types.len();
        if self.use_categories {
            expected += ArticleCategory::ALL.len();
        }
        let mut features = Vec::with_capacity(expected);
        if self.use_categories {
            self.push_category_block(article, &mut features);
        }
        for recognizer in &self.recognizers {
            let proposed = group.get(recognizer).map(|m| m.entity_type);
            self.push_type_block(proposed, &mut features);
        }
        self.check_shape(&features, expected)?;
        Ok(features)
    }

    /// Encode one word for the chunk-based modes.
    fn encode_word(
        &self,
        article: &Article,
        previous: Option<(EntityType, bool)>,
        word: &BTreeMap<ProcessId, WordMention>,
    ) -> Result<Vec<(usize, f64)>> {
        let slot = self.handled_types.len() + 2;
        let mut expected = self.recognizers.len() * slot;
        if self.use_categories {
            expected += ArticleCategory::ALL.len();
        }
        if self.combine_mode == CombineMode::ChunkPrevious {
            expected += slot;
        }
        let mut features = Vec::with_capacity(expected);
        if self.use_categories {
            self.push_category_block(article, &mut features);
        }
        if self.combine_mode == CombineMode::ChunkPrevious {
            self.push_word_block(previous, &mut features);
        }
        for recognizer in &self.recognizers {
            let proposed = word
                .get(recognizer)
                .map(|wm| (wm.mention.entity_type, wm.beginning));
            self.push_word_block(proposed, &mut features);
        }
        self.check_shape(&features, expected)?;
        Ok(features)
    }

    // ------------------------------------------------------------------
    // Mention-by-mention combination
    // ------------------------------------------------------------------

    fn combine_by_mention(
        &self,
        article: &Article,
        outputs: &BTreeMap<ProcessId, Mentions>,
    ) -> Result<Mentions> {
        let mut result = Mentions::new(self.source.clone());
        let category_weights = self.proportions.category_weights(article);

        for group in overlap_groups(outputs) {
            let features = self.encode_group(article, &group)?;
            let class = self.classifier.predict(&features)?;
            let Some(entity_type) = self.mention_classes.decode(class)? else {
                continue;
            };

            let uniform = self.combine_mode == CombineMode::MentionUniform;
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

    // ------------------------------------------------------------------
    // Word-by-word combination
    // ------------------------------------------------------------------

    fn combine_by_word(
        &self,
        article: &Article,
        outputs: &BTreeMap<ProcessId, Mentions>,
    ) -> Result<Mentions> {
        let mut result = Mentions::new(self.source.clone());
        let mut open: Option<(EntityType, usize, usize)> = None;
        let mut previous: Option<(EntityType, bool)> = None;

        for word in word_groups(article, outputs) {
            // a word overlapping no proposal at all is an outside word
            if word.is_empty() {
                self.close_open_mention(article, &mut open, &mut result)?;
                previous = None;
                continue;
            }

            let (word_start, word_end) = word
                .values()
                .next()
                .map(|wm| (wm.start, wm.end))
                .expect("word map is non-empty");
            let features = self.encode_word(article, previous, &word)?;
            let class = self.classifier.predict(&features)?;
            let tag = self.chunk_classes.decode(class)?;
            match tag {
                WordTag::Outside => {
                    self.close_open_mention(article, &mut open, &mut result)?;
                    previous = None;
                }
                WordTag::Begin(entity_type) | WordTag::Inside(entity_type) => {
                    let begins = matches!(tag, WordTag::Begin(_));
                    let extends = matches!(open, Some((t, _, _)) if !begins && t == entity_type);
                    if extends {
                        if let Some((_, _, open_end)) = &mut open {
                            *open_end = word_end;
                        }
                        previous = Some((entity_type, false));
                    } else {
                        // a type change is an implicit boundary, like an
                        // explicit Begin; the first tagged word after an
                        // outside stretch opens a mention whatever its flag
                        self.close_open_mention(article, &mut open, &mut result)?;
                        open = Some((entity_type, word_start, word_end));
                        previous = Some((entity_type, true));
                    }
                }
            }
        }
        self.close_open_mention(article, &mut open, &mut result)?;
        Ok(result)
    }

    fn close_open_mention(
        &self,
        article: &Article,
        open: &mut Option<(EntityType, usize, usize)>,
        result: &mut Mentions,
    ) -> Result<()> {
        if let Some((entity_type, start, end)) = open.take() {
            let text = article.text.get(start..end).ok_or_else(|| {
                Error::invalid_input(format!("decoded span {start}..{end} outside article text"))
            })?;
            result.add(Mention::new(
                entity_type,
                start,
                end,
                text,
                self.source.clone(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: [EntityType; 3] = [
        EntityType::Location,
        EntityType::Organization,
        EntityType::Person,
    ];

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

    /// A classifier answering the same class for every unit.
    fn constant(class: f64) -> Box<dyn Classifier> {
        Box::new(ClassifierFn(move |_: &[(usize, f64)]| Ok(class)))
    }

    /// A classifier answering a scripted sequence of classes, one per call.
    fn scripted(classes: Vec<f64>) -> Box<dyn Classifier> {
        let remaining = std::sync::Mutex::new(classes.into_iter());
        Box::new(ClassifierFn(move |_: &[(usize, f64)]| {
            remaining
                .lock()
                .expect("poisoned")
                .next()
                .ok_or_else(|| Error::inference("scripted classifier exhausted"))
        }))
    }

    fn combiner(
        recs: &[ProcessId],
        mode: CombineMode,
        classifier: Box<dyn Classifier>,
    ) -> SvmCombiner {
        let weights = VoteWeights::uniform(recs);
        SvmCombiner::new(
            ProcessId::new("svm"),
            recs.to_vec(),
            TYPES.to_vec(),
            mode,
            false,
            false,
            classifier,
            weights,
            CategoryProportions::uniform(),
        )
    }

    #[test]
    fn chunk_class_map_is_invertible() {
        let map = ChunkClassMap::new(&TYPES);
        assert_eq!(map.decode(1.0).unwrap(), WordTag::Outside);
        // class 2k begins the k-th type, class 2k+1 continues it
        assert_eq!(map.decode(2.0).unwrap(), WordTag::Begin(EntityType::Location));
        assert_eq!(map.decode(3.0).unwrap(), WordTag::Inside(EntityType::Location));
        assert_eq!(map.decode(6.0).unwrap(), WordTag::Begin(EntityType::Person));
        assert_eq!(map.decode(7.0).unwrap(), WordTag::Inside(EntityType::Person));
        for class in 1..=7 {
            let tag = map.decode(class as f64).unwrap();
            assert_eq!(map.encode(tag), Some(class));
        }
        assert!(map.decode(0.0).is_err());
        assert!(map.decode(8.0).is_err());
    }

    #[test]
    fn mention_class_map_decodes_no_mention_and_types() {
        let map = MentionClassMap::new(&TYPES);
        assert_eq!(map.decode(1.0).unwrap(), None);
        assert_eq!(map.decode(2.0).unwrap(), Some(EntityType::Location));
        assert_eq!(map.decode(4.0).unwrap(), Some(EntityType::Person));
        assert!(map.decode(5.0).is_err());
    }

    #[test]
    fn group_encoding_has_fixed_shape_and_order() {
        let recs = recognizers(&["a", "b"]);
        let c = combiner(
            &recs,
            CombineMode::MentionUniform,
            constant(1.0),
        );
        let article = Article::new("t", "Paris is nice");
        let outs = outputs(&[("a", &[(EntityType::Location, 0, 5)]), ("b", &[])]);
        let groups = overlap_groups(&outs);
        let features = c.encode_group(&article, &groups[0]).unwrap();
        // 2 recognizers x 3 types; "a" voted Location, "b" contributed nothing
        assert_eq!(features.len(), 6);
        let values: Vec<f64> = features.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1.0, -1.0, -1.0, -1.0, -1.0, -1.0]);
        // indices are 1-based and consecutive
        assert_eq!(features[0].0, 1);
        assert_eq!(features[5].0, 6);
    }

    #[test]
    fn category_block_changes_shape() {
        let recs = recognizers(&["a"]);
        let weights = VoteWeights::uniform(&recs);
        let c = SvmCombiner::new(
            ProcessId::new("svm"),
            recs.clone(),
            TYPES.to_vec(),
            CombineMode::MentionUniform,
            true,
            false,
            constant(1.0),
            weights,
            CategoryProportions::uniform(),
        );
        let article = Article::new("t", "Paris").with_categories(vec![ArticleCategory::Sport]);
        let outs = outputs(&[("a", &[(EntityType::Location, 0, 5)])]);
        let groups = overlap_groups(&outs);
        let features = c.encode_group(&article, &groups[0]).unwrap();
        assert_eq!(features.len(), ArticleCategory::ALL.len() + 3);
    }

    #[test]
    fn mention_mode_emits_decided_type_with_voted_position() {
        let recs = recognizers(&["a", "b"]);
        // always answer class 2: the first handled type (Location)
        let c = combiner(&recs, CombineMode::MentionUniform, constant(2.0));
        let article = Article::new("t", "Springfield town");
        let outs = outputs(&[
            ("a", &[(EntityType::Person, 0, 11)]),
            ("b", &[(EntityType::Location, 0, 11)]),
        ]);
        let result = c.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 1);
        let m = result.get(0).unwrap();
        assert_eq!(m.entity_type, EntityType::Location);
        assert_eq!((m.start, m.end), (0, 11));
    }

    #[test]
    fn mention_mode_class_one_means_no_mention() {
        let recs = recognizers(&["a", "b"]);
        let c = combiner(&recs, CombineMode::MentionUniform, constant(1.0));
        let article = Article::new("t", "Springfield town");
        let outs = outputs(&[
            ("a", &[(EntityType::Person, 0, 11)]),
            ("b", &[(EntityType::Location, 0, 11)]),
        ]);
        let result = c.combine(&article, &outs).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn word_mode_decodes_bio_stream() {
        // text: "John Smith then London"
        //        0    5     11   16
        let article = Article::new("t", "John Smith then London");
        let recs = recognizers(&["a"]);
        // one recognizer proposal covers the first three words, another the
        // last, so the classifier is consulted on all four
        let outs = outputs(&[(
            "a",
            &[(EntityType::Person, 0, 15), (EntityType::Location, 16, 22)],
        )]);

        // class sequence: B-PER, I-PER, O, B-LOC
        let person_b = 2.0 * 3.0; // Person is the 3rd handled type
        let person_i = person_b + 1.0;
        let location_b = 2.0;
        let c = combiner(
            &recs,
            CombineMode::ChunkSingle,
            scripted(vec![person_b, person_i, 1.0, location_b]),
        );

        let result = c.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 2);
        let first = result.get(0).unwrap();
        assert_eq!(first.entity_type, EntityType::Person);
        assert_eq!((first.start, first.end), (0, 10));
        assert_eq!(first.text, "John Smith");
        let second = result.get(1).unwrap();
        assert_eq!(second.entity_type, EntityType::Location);
        assert_eq!((second.start, second.end), (16, 22));
        assert_eq!(second.text, "London");
    }

    #[test]
    fn word_mode_type_change_reopens_mention() {
        let article = Article::new("t", "Alpha Beta");
        let recs = recognizers(&["a"]);
        let outs = outputs(&[("a", &[(EntityType::Person, 0, 10)])]);

        // I-PER then I-LOC: the type change closes and reopens
        let person_i = 2.0 * 3.0 + 1.0;
        let location_i = 3.0;
        let c = combiner(
            &recs,
            CombineMode::ChunkSingle,
            scripted(vec![person_i, location_i]),
        );
        let result = c.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(0).unwrap().entity_type, EntityType::Person);
        assert_eq!(result.get(0).unwrap().text, "Alpha");
        assert_eq!(result.get(1).unwrap().entity_type, EntityType::Location);
        assert_eq!(result.get(1).unwrap().text, "Beta");
    }

    #[test]
    fn word_mode_emits_mention_open_at_stream_end() {
        let article = Article::new("t", "London");
        let recs = recognizers(&["a"]);
        let outs = outputs(&[("a", &[(EntityType::Location, 0, 6)])]);
        let c = combiner(&recs, CombineMode::ChunkSingle, constant(2.0));
        let result = c.combine(&article, &outs).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(0).unwrap().text, "London");
    }

    #[test]
    fn chunk_previous_mode_widens_the_vector() {
        use std::sync::{Arc, Mutex};
        let recs = recognizers(&["a"]);
        let article = Article::new("t", "London calling");
        let outs = outputs(&[("a", &[(EntityType::Location, 0, 6)])]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let c = SvmCombiner::new(
            ProcessId::new("svm"),
            recs.clone(),
            TYPES.to_vec(),
            CombineMode::ChunkPrevious,
            false,
            false,
            Box::new(ClassifierFn(move |features: &[(usize, f64)]| {
                sink.lock().expect("poisoned").push(features.len());
                Ok(2.0)
            })),
            VoteWeights::uniform(&recs),
            CategoryProportions::uniform(),
        );
        // one recognizer block plus the previous-chunk block, T+2 slots each
        let _ = c.combine(&article, &outs);
        let lens = seen.lock().expect("poisoned");
        assert!(!lens.is_empty());
        assert_eq!(lens[0], (3 + 2) * 2);
    }

    #[test]
    fn out_of_range_class_fails_fast() {
        let recs = recognizers(&["a"]);
        let c = combiner(&recs, CombineMode::MentionUniform, constant(42.0));
        let article = Article::new("t", "Paris");
        let outs = outputs(&[("a", &[(EntityType::Location, 0, 5)])]);
        assert!(matches!(
            c.combine(&article, &outs),
            Err(Error::Decoding(_))
        ));
    }
}
