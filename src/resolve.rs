//! Mention-to-entity resolution and entity merging.

use tracing::{debug, warn};

use crate::entity::{Entity, EntityType};
use crate::error::Result;
use crate::mention::ProcessId;
use crate::{Entities, Mentions};

/// Assigns entities to mentions that lack one.
///
/// Named mentions are resolved against existing entities by exact surface
/// form when homonym resolution is enabled; valued mentions are resolved by
/// value equality. Unresolvable cases follow a deterministic fallback: create
/// a fresh entity, or (for a valued mention without a parsed value) leave the
/// mention unresolved.
#[derive(Debug, Clone)]
pub struct Resolver {
    source: ProcessId,
    resolve_homonyms: bool,
}

impl Resolver {
    /// Create a resolver producing entities attributed to `source`.
    #[must_use]
    pub fn new(source: ProcessId, resolve_homonyms: bool) -> Self {
        Self {
            source,
            resolve_homonyms,
        }
    }

    /// The process id this resolver stamps on produced entity sets.
    #[must_use]
    pub fn source(&self) -> &ProcessId {
        &self.source
    }

    /// Ensure every mention of `mentions` points to an entity of `entities`,
    /// creating entities as needed.
    ///
    /// A named mention matching several existing entities by surface form is
    /// ambiguous homonymy: it is logged and resolved to a fresh entity, never
    /// auto-attached to one of the candidates.
    pub fn complete(&self, mentions: &mut Mentions, entities: &mut Entities) -> Result<()> {
        for index in 0..mentions.len() {
            let mention = match mentions.get(index) {
                Some(m) if m.entity.is_none() => m.clone(),
                _ => continue,
            };

            if mention.entity_type.is_named() {
                let id = self.resolve_named(&mention.text, mention.entity_type, entities)?;
                mentions.set_entity(index, id);
            } else {
                match &mention.value {
                    Some(value) => {
                        let id = match entities.by_value(value) {
                            Some(existing) => existing.internal_id,
                            None => entities.add(Entity::valued(value.clone()))?,
                        };
                        mentions.set_entity(index, id);
                    }
                    None => {
                        warn!(mention = %mention, "valued mention without a value, left unresolved");
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_named(
        &self,
        surface: &str,
        entity_type: EntityType,
        entities: &mut Entities,
    ) -> Result<i64> {
        if self.resolve_homonyms {
            let candidates: Vec<i64> = entities
                .by_surface_form(surface)
                .into_iter()
                .filter(|e| e.entity_type == entity_type)
                .map(|e| e.internal_id)
                .collect();
            match candidates.as_slice() {
                [] => {}
                [single] => {
                    debug!(surface, id = single, "reusing homonym entity");
                    return Ok(*single);
                }
                several => {
                    warn!(
                        surface,
                        count = several.len(),
                        "ambiguous homonyms, creating a fresh entity"
                    );
                }
            }
        }
        entities.add(Entity::named(entity_type, surface)?)
    }
}

/// Merge duplicate entities sharing an external identifier.
///
/// For each named type, every pair of entities of that type is compared;
/// whenever their external-id sets intersect, the later entity is folded into
/// the earlier one and every mention referencing it is redirected. Re-running
/// on an already merged collection is a no-op.
pub fn merge_entities(entities: &mut Entities, mentions: &mut Mentions) -> Result<()> {
    for entity_type in EntityType::NAMED {
        let ids: Vec<i64> = entities
            .iter()
            .filter(|e| e.entity_type() == entity_type)
            .map(Entity::internal_id)
            .collect();

        let mut removed = vec![false; ids.len()];
        for i in 0..ids.len() {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..ids.len() {
                if removed[j] {
                    continue;
                }
                let intersect = match (entities.get(ids[i]), entities.get(ids[j])) {
                    (Some(Entity::Named(a)), Some(Entity::Named(b))) => {
                        a.external_ids_intersect(b)
                    }
                    _ => false,
                };
                if intersect {
                    debug!(target = ids[i], source = ids[j], "merging duplicate entities");
                    entities.merge_into(ids[i], ids[j])?;
                    mentions.switch_entity(ids[j], ids[i]);
                    removed[j] = true;
                }
            }
        }
    }
    Ok(())
}
