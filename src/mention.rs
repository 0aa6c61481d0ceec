//! Mentions: concrete spans of text tagged with an entity type.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityType, EntityValue};
use crate::position;

/// Identifier of the process that produced a set of mentions or entities:
/// a recognizer, resolver, linker or combiner name, or [`ProcessId::reference`]
/// for manual annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(String);

impl ProcessId {
    /// Create a process id from a tool name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ProcessId(name.into())
    }

    /// The id reserved for manual reference annotations.
    #[must_use]
    pub fn reference() -> Self {
        ProcessId("reference".to_string())
    }

    /// Whether this id denotes manual reference annotation.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.0 == "reference"
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(s: &str) -> Self {
        ProcessId::new(s)
    }
}

/// A mention: a span `[start, end)` of the article text, tagged with an
/// entity type by some process, and optionally resolved to an entity of the
/// companion [`Entities`](crate::Entities) collection.
///
/// The entity reference is a plain internal id, not an owning link: it is
/// only meaningful relative to the collection the mention was resolved
/// against, and rewiring it is a cheap id rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Entity type assigned by the producing process
    pub entity_type: EntityType,
    /// Start position (byte offset, inclusive)
    pub start: usize,
    /// End position (byte offset, exclusive)
    pub end: usize,
    /// Surface string (the raw text if unmodified)
    pub text: String,
    /// Process that produced this mention
    pub source: ProcessId,
    /// Internal id of the resolved entity, if any
    pub entity: Option<i64>,
    /// Parsed value, for valued-type mentions
    pub value: Option<EntityValue>,
}

impl Mention {
    /// Create a new unresolved mention.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        start: usize,
        end: usize,
        text: impl Into<String>,
        source: ProcessId,
    ) -> Self {
        Self {
            entity_type,
            start,
            end,
            text: text.into(),
            source,
            entity: None,
            value: None,
        }
    }

    /// Attach a parsed value (builder style).
    #[must_use]
    pub fn with_value(mut self, value: EntityValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Whether this mention and `other` occupy exactly the same span.
    #[must_use]
    pub fn has_same_position(&self, other: &Mention) -> bool {
        position::same_span(self.start, self.end, other.start, other.end)
    }

    /// Whether this mention's span intersects `other`'s.
    #[must_use]
    pub fn overlaps_with(&self, other: &Mention) -> bool {
        position::overlaps(self.start, self.end, other.start, other.end)
    }

    /// Whether this mention's span fully encloses `other`'s.
    #[must_use]
    pub fn contains(&self, other: &Mention) -> bool {
        position::contains(self.start, self.end, other.start, other.end)
    }

    /// Whether the given text position falls inside this mention.
    #[must_use]
    pub fn contains_position(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Position-based ordering: by start, then end. Used for sorting mention
    /// lists; not an `Ord` impl since equality is structural.
    #[must_use]
    pub fn position_cmp(&self, other: &Mention) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
    }

    /// Whether this mention starts strictly before `other` in the text.
    #[must_use]
    pub fn precedes(&self, other: &Mention) -> bool {
        self.position_cmp(other) == Ordering::Less
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(\"{}\", {}-{})",
            self.entity_type, self.text, self.start, self.end
        )
    }
}
