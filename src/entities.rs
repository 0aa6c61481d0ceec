//! The `Entities` aggregate: a set of entities with secondary indices.
//!
//! The collection owns every index privately and keeps all of them consistent
//! on each insertion and removal: callers never mutate index keys (name,
//! surface forms, external ids, value) directly. Re-keying operations go
//! through [`Entities::merge_into`] and [`Entities::unify`], which unwind and
//! rebuild the affected index entries as a unit.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::entity::{Entity, EntityType, EntityValue, KnowledgeBase, NamedEntity, ValuedEntity};
use crate::error::{Error, Result};
use crate::mention::ProcessId;
use crate::mentions::Mentions;

/// A set of entities together with metadata on how they were obtained.
///
/// Four indices are maintained: by internal id, by (knowledge base, external
/// id) and type, by surface form, and by value. A given external id may
/// denote different entities of different types, but never two entities of
/// the same type; a given value identifies at most one valued entity.
#[derive(Debug, Clone)]
pub struct Entities {
    source: ProcessId,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    editor: Option<String>,
    next_internal_id: i64,
    by_id: BTreeMap<i64, Entity>,
    by_external: HashMap<(KnowledgeBase, String), BTreeMap<EntityType, i64>>,
    by_surface: HashMap<String, Vec<i64>>,
    by_value: BTreeMap<EntityValue, i64>,
}

impl Entities {
    /// Create an empty collection attributed to manual reference annotation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(ProcessId::reference())
    }

    /// Create an empty collection attributed to the given linker/resolver.
    #[must_use]
    pub fn with_source(source: ProcessId) -> Self {
        let now = Utc::now();
        Self {
            source,
            created: now,
            modified: now,
            editor: None,
            next_internal_id: 0,
            by_id: BTreeMap::new(),
            by_external: HashMap::new(),
            by_surface: HashMap::new(),
            by_value: BTreeMap::new(),
        }
    }

    /// Create a collection with explicit metadata, as read from a file.
    #[must_use]
    pub fn with_metadata(
        source: ProcessId,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        editor: Option<String>,
    ) -> Self {
        Self {
            source,
            created,
            modified,
            editor,
            next_internal_id: 0,
            by_id: BTreeMap::new(),
            by_external: HashMap::new(),
            by_surface: HashMap::new(),
            by_value: BTreeMap::new(),
        }
    }

    /// The process that produced this collection.
    #[must_use]
    pub fn source(&self) -> &ProcessId {
        &self.source
    }

    /// When this collection was first produced.
    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When this collection was last modified.
    #[must_use]
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Update the modification timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// The human annotator, when the source is manual reference annotation.
    #[must_use]
    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref()
    }

    /// Set the human annotator name.
    pub fn set_editor(&mut self, editor: impl Into<String>) {
        self.editor = Some(editor.into());
    }

    /// Number of entities in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over all entities, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.by_id.values()
    }

    /// The entity with the given internal id, if any.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Entity> {
        self.by_id.get(&id)
    }

    /// The named entity of the given type carrying the given external id.
    #[must_use]
    pub fn by_external_id(
        &self,
        kb: &KnowledgeBase,
        external_id: &str,
        entity_type: EntityType,
    ) -> Option<&NamedEntity> {
        let ids = self
            .by_external
            .get(&(kb.clone(), external_id.to_string()))?;
        let id = ids.get(&entity_type)?;
        self.by_id.get(id).and_then(Entity::as_named)
    }

    /// All named entities appearing under the given surface form.
    #[must_use]
    pub fn by_surface_form(&self, form: &str) -> Vec<&NamedEntity> {
        self.by_surface
            .get(form)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.by_id.get(id).and_then(Entity::as_named))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The valued entity carrying the given value, if any.
    #[must_use]
    pub fn by_value(&self, value: &EntityValue) -> Option<&ValuedEntity> {
        let id = self.by_value.get(value)?;
        self.by_id.get(id).and_then(Entity::as_valued)
    }

    /// Insert an entity.
    ///
    /// A negative internal id is replaced by the next value of the monotone
    /// counter; a non-negative id is kept but must not collide with an
    /// existing one. All index updates happen after validation, so a failed
    /// insertion leaves the collection untouched. Returns the assigned id.
    pub fn add(&mut self, mut entity: Entity) -> Result<i64> {
        // validate before touching any index
        let id = entity.internal_id();
        if id >= 0 && self.by_id.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        match &entity {
            Entity::Named(named) => {
                for (kb, ext) in &named.external_ids {
                    if let Some(ids) = self.by_external.get(&(kb.clone(), ext.clone())) {
                        if ids.contains_key(&named.entity_type) {
                            return Err(Error::DuplicateExternalId(format!(
                                "{kb}:{ext} ({})",
                                named.entity_type
                            )));
                        }
                    }
                }
            }
            Entity::Valued(valued) => {
                if self.by_value.contains_key(&valued.value) {
                    return Err(Error::DuplicateValue(valued.value.to_string()));
                }
            }
        }

        // assign the id and advance the counter past any explicit id
        let id = if id < 0 {
            let assigned = self.next_internal_id;
            self.next_internal_id += 1;
            entity.set_internal_id(assigned);
            assigned
        } else {
            self.next_internal_id = self.next_internal_id.max(id + 1);
            id
        };

        // commit to every index
        match &entity {
            Entity::Named(named) => {
                for (kb, ext) in &named.external_ids {
                    self.by_external
                        .entry((kb.clone(), ext.clone()))
                        .or_default()
                        .insert(named.entity_type, id);
                }
                for form in &named.surface_forms {
                    self.by_surface.entry(form.clone()).or_default().push(id);
                }
            }
            Entity::Valued(valued) => {
                self.by_value.insert(valued.value.clone(), id);
            }
        }
        self.by_id.insert(id, entity);
        self.touch();
        Ok(id)
    }

    /// Remove the entity with the given id, unwinding every index entry that
    /// pointed at it. Returns the removed entity.
    pub fn remove(&mut self, id: i64) -> Result<Entity> {
        let entity = self.by_id.remove(&id).ok_or(Error::UnknownEntity(id))?;
        match &entity {
            Entity::Named(named) => {
                for (kb, ext) in &named.external_ids {
                    let key = (kb.clone(), ext.clone());
                    if let Some(ids) = self.by_external.get_mut(&key) {
                        ids.retain(|_, v| *v != id);
                        if ids.is_empty() {
                            self.by_external.remove(&key);
                        }
                    }
                }
                for form in &named.surface_forms {
                    if let Some(ids) = self.by_surface.get_mut(form) {
                        ids.retain(|v| *v != id);
                        if ids.is_empty() {
                            self.by_surface.remove(form);
                        }
                    }
                }
            }
            Entity::Valued(valued) => {
                self.by_value.remove(&valued.value);
            }
        }
        self.touch();
        Ok(entity)
    }

    /// Register an additional surface form on an inserted named entity,
    /// keeping the surface index in step.
    pub fn add_surface_form(&mut self, id: i64, form: impl Into<String>) -> Result<()> {
        let form = form.into();
        let entity = self.by_id.get_mut(&id).ok_or(Error::UnknownEntity(id))?;
        let Entity::Named(named) = entity else {
            return Err(Error::invalid_input(format!(
                "entity {id} is not a named entity"
            )));
        };
        if named.surface_forms.insert(form.clone()) {
            self.by_surface.entry(form).or_default().push(id);
            self.touch();
        }
        Ok(())
    }

    /// Attach an external id to an inserted named entity, as linkers do after
    /// resolution.
    ///
    /// The index stays injective: if another entity of the same type already
    /// owns the (knowledge base, external id) binding, the id is recorded on
    /// this entity's payload only and a warning is logged. Such payload-level
    /// duplicates are what [`crate::resolve::merge_entities`] later folds.
    pub fn add_external_id(
        &mut self,
        id: i64,
        kb: KnowledgeBase,
        external_id: impl Into<String>,
    ) -> Result<()> {
        let external_id = external_id.into();
        let entity = self.by_id.get_mut(&id).ok_or(Error::UnknownEntity(id))?;
        let Entity::Named(named) = entity else {
            return Err(Error::invalid_input(format!(
                "entity {id} is not a named entity"
            )));
        };
        let entity_type = named.entity_type;
        if named.external_ids.contains_key(&kb) {
            return Ok(());
        }
        named.external_ids.insert(kb.clone(), external_id.clone());

        let bindings = self
            .by_external
            .entry((kb.clone(), external_id.clone()))
            .or_default();
        match bindings.get(&entity_type) {
            Some(owner) if *owner != id => {
                debug!(
                    owner = *owner,
                    id, "external id {kb}:{external_id} already bound, keeping first binding"
                );
            }
            _ => {
                bindings.insert(entity_type, id);
            }
        }
        self.touch();
        Ok(())
    }

    /// Fold the named entity `source_id` into the named entity `target_id`:
    /// the target absorbs the source's surface forms and external ids, the
    /// source is removed, and the target is re-indexed under its enlarged key
    /// set. Mention references are not rewritten here; see
    /// [`Mentions::switch_entity`].
    pub fn merge_into(&mut self, target_id: i64, source_id: i64) -> Result<()> {
        if target_id == source_id {
            return Ok(());
        }
        // validate both ends before touching any index, so a failed merge
        // leaves the collection untouched
        let (target_type, target_keys) = match self.by_id.get(&target_id) {
            Some(Entity::Named(named)) => (named.entity_type, named.external_ids.clone()),
            Some(Entity::Valued(_)) => {
                return Err(Error::invalid_input(format!(
                    "entity {target_id} is not a named entity"
                )))
            }
            None => return Err(Error::UnknownEntity(target_id)),
        };
        let source_keys = match self.by_id.get(&source_id) {
            Some(Entity::Named(named)) => named.external_ids.clone(),
            Some(Entity::Valued(_)) => {
                return Err(Error::invalid_input(format!(
                    "entity {source_id} is not a named entity"
                )))
            }
            None => return Err(Error::UnknownEntity(source_id)),
        };
        for (kb, ext) in target_keys.iter().chain(source_keys.iter()) {
            if let Some(owner) = self
                .by_external
                .get(&(kb.clone(), ext.clone()))
                .and_then(|ids| ids.get(&target_type))
            {
                if *owner != target_id && *owner != source_id {
                    return Err(Error::DuplicateExternalId(format!(
                        "{kb}:{ext} ({target_type})"
                    )));
                }
            }
        }

        let source = self.remove(source_id)?;
        let Entity::Named(source) = source else {
            unreachable!("validated above");
        };
        let mut target = self.remove(target_id)?;
        if let Entity::Named(ref mut named) = target {
            named.complete_with(&source);
        }
        self.add(target)?;
        Ok(())
    }

    /// Merge a freshly produced entity set into this one.
    ///
    /// For each incoming named entity, an existing entity sharing one of its
    /// external ids (same type) absorbs it; otherwise the entity is inserted
    /// with a freshly assigned id. Incoming valued entities reuse an existing
    /// entity with an equal value or are inserted likewise. Every mention of
    /// `mentions` pointing at an incoming entity is redirected in one pass.
    pub fn unify(&mut self, incoming: Entities, mentions: &mut Mentions) -> Result<()> {
        let mut remap: BTreeMap<i64, i64> = BTreeMap::new();

        for (old_id, entity) in incoming.by_id {
            let new_id = match entity {
                Entity::Named(named) => {
                    let existing = named.external_ids.iter().find_map(|(kb, ext)| {
                        self.by_external
                            .get(&(kb.clone(), ext.clone()))
                            .and_then(|ids| ids.get(&named.entity_type))
                            .copied()
                    });
                    match existing {
                        Some(target_id) => {
                            debug!(target_id, "unify: absorbing entity into existing one");
                            let mut target = self.remove(target_id)?;
                            match target {
                                Entity::Named(ref mut t) => t.complete_with(&named),
                                // the external-id index only holds named entities
                                Entity::Valued(_) => unreachable!(),
                            }
                            self.add(target)?
                        }
                        None => {
                            let mut fresh = named;
                            fresh.internal_id = crate::entity::UNASSIGNED_ID;
                            self.add(Entity::Named(fresh))?
                        }
                    }
                }
                Entity::Valued(valued) => match self.by_value.get(&valued.value).copied() {
                    Some(target_id) => target_id,
                    None => {
                        let mut fresh = valued;
                        fresh.internal_id = crate::entity::UNASSIGNED_ID;
                        self.add(Entity::Valued(fresh))?
                    }
                },
            };
            remap.insert(old_id, new_id);
        }

        mentions.remap_entities(&remap);
        Ok(())
    }
}

impl Default for Entities {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::UNASSIGNED_ID;
    use crate::mention::Mention;
    use chrono::NaiveDate;

    fn person(name: &str) -> Entity {
        Entity::named(EntityType::Person, name).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> EntityValue {
        EntityValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn auto_ids_are_unique_and_increasing() {
        let mut entities = Entities::new();
        let a = entities.add(person("A")).unwrap();
        let b = entities.add(person("B")).unwrap();
        let c = entities.add(person("C")).unwrap();
        assert!(a < b && b < c);
        assert_eq!(entities.len(), 3);
    }

    #[test]
    fn explicit_id_advances_counter() {
        let mut entities = Entities::new();
        let mut e = person("A");
        e.set_internal_id(10);
        assert_eq!(entities.add(e).unwrap(), 10);
        // the next auto id must not collide
        assert_eq!(entities.add(person("B")).unwrap(), 11);
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut entities = Entities::new();
        let mut a = person("A");
        a.set_internal_id(3);
        entities.add(a).unwrap();
        let mut b = person("B");
        b.set_internal_id(3);
        assert!(matches!(entities.add(b), Err(Error::DuplicateId(3))));
    }

    #[test]
    fn duplicate_external_id_rejected_but_types_may_share() {
        let mut entities = Entities::new();
        let mut a = NamedEntity::new(EntityType::Person, "Washington").unwrap();
        a.add_external_id(KnowledgeBase::DbPedia, "dbr:Washington");
        entities.add(Entity::Named(a)).unwrap();

        // same (kb, id, type): rejected
        let mut b = NamedEntity::new(EntityType::Person, "G. Washington").unwrap();
        b.add_external_id(KnowledgeBase::DbPedia, "dbr:Washington");
        assert!(matches!(
            entities.add(Entity::Named(b)),
            Err(Error::DuplicateExternalId(_))
        ));

        // same (kb, id), different type: allowed
        let mut c = NamedEntity::new(EntityType::Location, "Washington").unwrap();
        c.add_external_id(KnowledgeBase::DbPedia, "dbr:Washington");
        entities.add(Entity::Named(c)).unwrap();
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn failed_add_leaves_collection_untouched() {
        let mut entities = Entities::new();
        let mut a = NamedEntity::new(EntityType::Person, "A").unwrap();
        a.add_external_id(KnowledgeBase::Wikidata, "Q1");
        entities.add(Entity::Named(a)).unwrap();

        let mut b = NamedEntity::new(EntityType::Person, "B").unwrap();
        b.add_surface_form("Bee");
        b.add_external_id(KnowledgeBase::Wikidata, "Q1");
        assert!(entities.add(Entity::Named(b)).is_err());
        // the rejected entity's surface forms must not have leaked in
        assert!(entities.by_surface_form("Bee").is_empty());
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn duplicate_value_rejected() {
        let mut entities = Entities::new();
        entities.add(Entity::valued(date(2013, 6, 4))).unwrap();
        assert!(matches!(
            entities.add(Entity::valued(date(2013, 6, 4))),
            Err(Error::DuplicateValue(_))
        ));
        assert!(entities.add(Entity::valued(date(2013, 6, 5))).is_ok());
    }

    #[test]
    fn remove_then_readd_equivalent_entity() {
        let mut entities = Entities::new();
        let mut a = NamedEntity::new(EntityType::Person, "A").unwrap();
        a.add_external_id(KnowledgeBase::DbPedia, "dbr:A");
        let id = entities.add(Entity::Named(a.clone())).unwrap();

        entities.remove(id).unwrap();
        assert!(entities
            .by_external_id(&KnowledgeBase::DbPedia, "dbr:A", EntityType::Person)
            .is_none());
        assert!(entities.by_surface_form("A").is_empty());

        a.internal_id = UNASSIGNED_ID;
        let new_id = entities.add(Entity::Named(a)).unwrap();
        assert_ne!(new_id, id);
        assert!(entities
            .by_external_id(&KnowledgeBase::DbPedia, "dbr:A", EntityType::Person)
            .is_some());
    }

    #[test]
    fn surface_index_is_many_to_many() {
        let mut entities = Entities::new();
        let mut a = NamedEntity::new(EntityType::Person, "John Smith").unwrap();
        a.add_surface_form("Smith");
        let mut b = NamedEntity::new(EntityType::Person, "Will Smith").unwrap();
        b.add_surface_form("Smith");
        entities.add(Entity::Named(a)).unwrap();
        entities.add(Entity::Named(b)).unwrap();
        assert_eq!(entities.by_surface_form("Smith").len(), 2);
        assert_eq!(entities.by_surface_form("John Smith").len(), 1);
    }

    #[test]
    fn unify_absorbs_by_external_id_and_redirects_mentions() {
        let mut existing = Entities::new();
        let mut a = NamedEntity::new(EntityType::Person, "J. Smith").unwrap();
        a.add_external_id(KnowledgeBase::DbPedia, "dbr:John_Smith");
        let a_id = existing.add(Entity::Named(a)).unwrap();

        let mut fresh = Entities::with_source(ProcessId::new("linker"));
        let mut b = NamedEntity::new(EntityType::Person, "John Smith").unwrap();
        b.add_external_id(KnowledgeBase::DbPedia, "dbr:John_Smith");
        let b_id = fresh.add(Entity::Named(b)).unwrap();
        let c_id = fresh.add(person("Someone Else")).unwrap();

        let mut mentions = Mentions::new(ProcessId::new("linker"));
        let mut m1 = Mention::new(EntityType::Person, 0, 10, "John Smith", ProcessId::new("r"));
        m1.entity = Some(b_id);
        let mut m2 = Mention::new(EntityType::Person, 20, 32, "Someone Else", ProcessId::new("r"));
        m2.entity = Some(c_id);
        mentions.add(m1);
        mentions.add(m2);

        existing.unify(fresh, &mut mentions).unwrap();

        // B was absorbed into A: only A and the re-inserted C remain
        assert_eq!(existing.len(), 2);
        let a = existing.get(a_id).unwrap().as_named().unwrap();
        assert!(a.surface_forms.contains("John Smith"));
        assert_eq!(mentions.iter().next().unwrap().entity, Some(a_id));
        // the non-matching entity was re-inserted under a fresh id
        let m2_entity = mentions.iter().nth(1).unwrap().entity.unwrap();
        assert_ne!(m2_entity, a_id);
        assert!(existing.get(m2_entity).is_some());
    }

    #[test]
    fn merge_into_reindexes_target() {
        let mut entities = Entities::new();
        let mut a = NamedEntity::new(EntityType::Person, "A").unwrap();
        a.add_external_id(KnowledgeBase::DbPedia, "dbr:A");
        let a_id = entities.add(Entity::Named(a)).unwrap();
        let mut b = NamedEntity::new(EntityType::Person, "B").unwrap();
        b.add_external_id(KnowledgeBase::Wikidata, "Q2");
        let b_id = entities.add(Entity::Named(b)).unwrap();

        entities.merge_into(a_id, b_id).unwrap();
        assert_eq!(entities.len(), 1);
        // the target is now reachable through the absorbed keys
        let got = entities
            .by_external_id(&KnowledgeBase::Wikidata, "Q2", EntityType::Person)
            .unwrap();
        assert_eq!(got.internal_id, a_id);
        assert_eq!(entities.by_surface_form("B")[0].internal_id, a_id);
    }
}
