//! Entity types and structures.
//!
//! An entity is an abstract referent (a person, a place, a date) that one or
//! more text mentions denote. Named entities carry a main name, a set of
//! surface forms and external knowledge-base identifiers; valued entities
//! carry a single comparable value instead.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Internal id used for entities that have not been inserted into an
/// [`Entities`](crate::Entities) collection yet. Insertion assigns a fresh id.
pub const UNASSIGNED_ID: i64 = -1;

/// Entity type classification.
///
/// `Date` is the only valued type; the six others are named types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    /// Date or other temporal expression
    Date,
    /// Role or title: general, president, pope...
    Function,
    /// Geographical or artificial place
    Location,
    /// Congress, conference, summit...
    Meeting,
    /// Institution, company, association...
    Organization,
    /// Real or fictional person, or group of persons
    Person,
    /// Human production: work, building, award...
    Production,
}

impl EntityType {
    /// All supported types, in canonical order.
    pub const ALL: [EntityType; 7] = [
        EntityType::Date,
        EntityType::Function,
        EntityType::Location,
        EntityType::Meeting,
        EntityType::Organization,
        EntityType::Person,
        EntityType::Production,
    ];

    /// The named types, in canonical order.
    pub const NAMED: [EntityType; 6] = [
        EntityType::Function,
        EntityType::Location,
        EntityType::Meeting,
        EntityType::Organization,
        EntityType::Person,
        EntityType::Production,
    ];

    /// Whether entities of this type are named (as opposed to valued).
    #[must_use]
    pub fn is_named(self) -> bool {
        !self.is_valued()
    }

    /// Whether entities of this type are valued.
    #[must_use]
    pub fn is_valued(self) -> bool {
        self == EntityType::Date
    }

    /// Convert to the canonical label string.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            EntityType::Date => "DATE",
            EntityType::Function => "FUNCTION",
            EntityType::Location => "LOCATION",
            EntityType::Meeting => "MEETING",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Person => "PERSON",
            EntityType::Production => "PRODUCTION",
        }
    }

    /// Parse from a label string.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_uppercase().as_str() {
            "DATE" => Some(EntityType::Date),
            "FUNCTION" => Some(EntityType::Function),
            "LOCATION" => Some(EntityType::Location),
            "MEETING" => Some(EntityType::Meeting),
            "ORGANIZATION" => Some(EntityType::Organization),
            "PERSON" => Some(EntityType::Person),
            "PRODUCTION" => Some(EntityType::Production),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Knowledge base used for entity linking, i.e. the namespace an external
/// identifier belongs to. The registry is open-ended: unknown namespaces are
/// kept verbatim under [`KnowledgeBase::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KnowledgeBase {
    /// DBpedia URIs
    DbPedia,
    /// Wikidata Q-ids
    Wikidata,
    /// Freebase mids
    Freebase,
    /// Any other identifier namespace
    Other(String),
}

impl KnowledgeBase {
    /// Convert to the canonical label string.
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            KnowledgeBase::DbPedia => "DBPEDIA",
            KnowledgeBase::Wikidata => "WIKIDATA",
            KnowledgeBase::Freebase => "FREEBASE",
            KnowledgeBase::Other(s) => s.as_str(),
        }
    }

    /// Parse from a label string.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_uppercase().as_str() {
            "DBPEDIA" | "DBPEDIA_URI" => KnowledgeBase::DbPedia,
            "WIKIDATA" | "WIKIDATA_ID" => KnowledgeBase::Wikidata,
            "FREEBASE" => KnowledgeBase::Freebase,
            other => KnowledgeBase::Other(other.to_string()),
        }
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Value carried by a valued entity. Currently only calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityValue {
    /// A calendar date
    Date(NaiveDate),
}

impl EntityValue {
    /// The entity type implied by this value.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityValue::Date(_) => EntityType::Date,
        }
    }

    /// Parse a value from its string form, given the expected type.
    pub fn parse(entity_type: EntityType, text: &str) -> Result<Self> {
        match entity_type {
            EntityType::Date => {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|e| Error::parse(format!("invalid date '{text}': {e}")))?;
                Ok(EntityValue::Date(date))
            }
            other => Err(Error::invalid_input(format!(
                "type {other} does not carry a value"
            ))),
        }
    }
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A named entity: a referent known under one or more surface forms,
/// optionally linked to external knowledge bases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedEntity {
    /// Unique id within the owning collection (negative until inserted)
    pub internal_id: i64,
    /// Entity type (one of the named types)
    pub entity_type: EntityType,
    /// Main string representation
    pub name: String,
    /// All strings under which this entity appears, including `name`
    pub surface_forms: BTreeSet<String>,
    /// External identifiers, one per knowledge base
    pub external_ids: BTreeMap<KnowledgeBase, String>,
}

impl NamedEntity {
    /// Create a new named entity with an unassigned id.
    ///
    /// Fails if `entity_type` is a valued type.
    pub fn new(entity_type: EntityType, name: impl Into<String>) -> Result<Self> {
        if !entity_type.is_named() {
            return Err(Error::invalid_input(format!(
                "type {entity_type} is not a named type"
            )));
        }
        let name = name.into();
        let mut surface_forms = BTreeSet::new();
        surface_forms.insert(name.clone());
        Ok(Self {
            internal_id: UNASSIGNED_ID,
            entity_type,
            name,
            surface_forms,
            external_ids: BTreeMap::new(),
        })
    }

    /// Register an additional surface form.
    pub fn add_surface_form(&mut self, form: impl Into<String>) {
        self.surface_forms.insert(form.into());
    }

    /// Register an external identifier. The first id registered for a
    /// knowledge base wins; later ones are ignored.
    pub fn add_external_id(&mut self, kb: KnowledgeBase, id: impl Into<String>) {
        self.external_ids.entry(kb).or_insert_with(|| id.into());
    }

    /// Absorb the surface forms and external ids of `other` into this entity.
    /// Conflicting knowledge-base entries keep the existing value.
    pub fn complete_with(&mut self, other: &NamedEntity) {
        for form in &other.surface_forms {
            self.surface_forms.insert(form.clone());
        }
        for (kb, id) in &other.external_ids {
            self.external_ids
                .entry(kb.clone())
                .or_insert_with(|| id.clone());
        }
    }

    /// Whether this entity and `other` share at least one (knowledge base,
    /// external id) pair.
    #[must_use]
    pub fn external_ids_intersect(&self, other: &NamedEntity) -> bool {
        self.external_ids
            .iter()
            .any(|(kb, id)| other.external_ids.get(kb) == Some(id))
    }
}

/// A valued entity: a referent identified by a single comparable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuedEntity {
    /// Unique id within the owning collection (negative until inserted)
    pub internal_id: i64,
    /// The identifying value
    pub value: EntityValue,
}

impl ValuedEntity {
    /// Create a new valued entity with an unassigned id.
    #[must_use]
    pub fn new(value: EntityValue) -> Self {
        Self {
            internal_id: UNASSIGNED_ID,
            value,
        }
    }
}

/// An entity, either named or valued.
///
/// Equality and ordering are defined by internal id alone: two entities are
/// the same entity iff they carry the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entity {
    /// Entity known under one or more names
    Named(NamedEntity),
    /// Entity identified by a value
    Valued(ValuedEntity),
}

impl Entity {
    /// Build a named entity of the given type, wrapped as [`Entity`].
    pub fn named(entity_type: EntityType, name: impl Into<String>) -> Result<Self> {
        Ok(Entity::Named(NamedEntity::new(entity_type, name)?))
    }

    /// Build a valued entity, wrapped as [`Entity`].
    #[must_use]
    pub fn valued(value: EntityValue) -> Self {
        Entity::Valued(ValuedEntity::new(value))
    }

    /// The internal id of this entity.
    #[must_use]
    pub fn internal_id(&self) -> i64 {
        match self {
            Entity::Named(e) => e.internal_id,
            Entity::Valued(e) => e.internal_id,
        }
    }

    pub(crate) fn set_internal_id(&mut self, id: i64) {
        match self {
            Entity::Named(e) => e.internal_id = id,
            Entity::Valued(e) => e.internal_id = id,
        }
    }

    /// The type of this entity.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Named(e) => e.entity_type,
            Entity::Valued(e) => e.value.entity_type(),
        }
    }

    /// Named payload, if this is a named entity.
    #[must_use]
    pub fn as_named(&self) -> Option<&NamedEntity> {
        match self {
            Entity::Named(e) => Some(e),
            Entity::Valued(_) => None,
        }
    }

    /// Valued payload, if this is a valued entity.
    #[must_use]
    pub fn as_valued(&self) -> Option<&ValuedEntity> {
        match self {
            Entity::Named(_) => None,
            Entity::Valued(e) => Some(e),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.internal_id() == other.internal_id()
    }
}

impl Eq for Entity {}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.internal_id().cmp(&other.internal_id())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Named(e) => write!(
                f,
                "{}(id={}, name=\"{}\")",
                e.entity_type, e.internal_id, e.name
            ),
            Entity::Valued(e) => write!(
                f,
                "{}(id={}, value=\"{}\")",
                e.value.entity_type(),
                e.internal_id,
                e.value
            ),
        }
    }
}
