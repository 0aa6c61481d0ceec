//! # nerfuse
//!
//! Entity/mention data model, recognizer-output fusion and NER evaluation.
//!
//! The crate is the core of a named-entity-recognition research platform: it
//! owns the in-memory representation of mentions and entities, resolves
//! mentions to entities, fuses the outputs of several independent recognizers
//! into one consensus annotation, and scores recognizer output against
//! reference annotations using the MUC, Lille and Istanbul protocols.
//! External NLP tools, web services and article retrieval stay outside: they
//! enter the picture only through the [`Recognizer`] and
//! [`Classifier`](combine::Classifier) traits.
//!
//! ## Data model
//!
//! A [`Mention`] is a typed span of article text; an [`Entity`] is the
//! abstract referent one or more mentions denote. Both live in aggregate
//! collections ([`Mentions`], [`Entities`]) carrying the producing process
//! and timestamps. [`Entities`] maintains indices by id, external id, surface
//! form and value, kept consistent on every mutation.
//!
//! ```rust
//! use nerfuse::{Entities, EntityType, Mention, Mentions, ProcessId, Resolver};
//!
//! let source = ProcessId::new("stanford");
//! let mut mentions = Mentions::new(source.clone());
//! mentions.add(Mention::new(EntityType::Person, 0, 10, "John Smith", source));
//!
//! let mut entities = Entities::new();
//! let resolver = Resolver::new(ProcessId::new("naive"), true);
//! resolver.complete(&mut mentions, &mut entities).unwrap();
//! assert_eq!(entities.len(), 1);
//! ```
//!
//! ## Combination
//!
//! [`combine::VoteCombiner`] fuses per-recognizer outputs by weighted voting
//! per overlap group; [`combine::SvmCombiner`] drives a pre-trained
//! classifier over overlap groups or BIO-tagged words.
//!
//! ## Evaluation
//!
//! [`eval::MucMeasure`], [`eval::LilleMeasure`] and [`eval::IstanbulMeasure`]
//! compare an estimated mention set against a reference one, aggregate over a
//! corpus, and persist to tabular text files.

#![warn(missing_docs)]

pub mod article;
pub mod combine;
pub mod entities;
pub mod entity;
mod error;
pub mod eval;
pub mod mention;
pub mod mentions;
pub mod position;
pub mod resolve;
pub mod xml;

pub use article::{Article, ArticleCategory};
pub use entities::Entities;
pub use entity::{
    Entity, EntityType, EntityValue, KnowledgeBase, NamedEntity, ValuedEntity, UNASSIGNED_ID,
};
pub use error::{Error, Result};
pub use mention::{Mention, ProcessId};
pub use mentions::Mentions;
pub use position::PositionRelation;
pub use resolve::{merge_entities, Resolver};

/// Trait for mention recognizers.
///
/// A recognizer is anything that can detect entity mentions in an article:
/// an external NLP tool adapter, a web service client, or a combiner fusing
/// other recognizers. The core only consumes this interface.
pub trait Recognizer: Send + Sync {
    /// Detect the mentions of `article`.
    fn recognize(&self, article: &Article) -> Result<Mentions>;

    /// The entity types this recognizer can detect with its current
    /// model/parameters.
    fn handled_types(&self) -> Vec<EntityType>;

    /// The process id stamped on produced mention sets.
    fn id(&self) -> ProcessId;

    /// Whether this recognizer supports the given language (ISO 639-1 code).
    fn supports_language(&self, _language: &str) -> bool {
        true
    }
}

/// A scripted recognizer for tests: returns a fixed mention list for any
/// article.
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    id: ProcessId,
    types: Vec<EntityType>,
    mentions: Vec<Mention>,
}

impl MockRecognizer {
    /// Create a mock recognizer with the given process id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ProcessId::new(id),
            types: EntityType::ALL.to_vec(),
            mentions: Vec::new(),
        }
    }

    /// Set the mentions to return on recognition.
    #[must_use]
    pub fn with_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Set the supported entity types.
    #[must_use]
    pub fn with_types(mut self, types: Vec<EntityType>) -> Self {
        self.types = types;
        self
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(&self, _article: &Article) -> Result<Mentions> {
        let mut result = Mentions::new(self.id.clone());
        for mention in &self.mentions {
            result.add(mention.clone());
        }
        Ok(result)
    }

    fn handled_types(&self) -> Vec<EntityType> {
        self.types.clone()
    }

    fn id(&self) -> ProcessId {
        self.id.clone()
    }
}

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    pub use crate::combine::{
        Classifier, CombineMode, StraightCombiner, SvmCombiner, VoteCombiner, VoteMode,
    };
    pub use crate::eval::{IstanbulMeasure, LilleMeasure, MucMeasure};
    pub use crate::{
        Article, ArticleCategory, Entities, Entity, EntityType, EntityValue, Error, KnowledgeBase,
        Mention, Mentions, MockRecognizer, ProcessId, Recognizer, Resolver, Result,
    };
}
