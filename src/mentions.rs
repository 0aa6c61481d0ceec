//! The `Mentions` aggregate: an ordered list of mentions plus metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::entity::EntityType;
use crate::mention::{Mention, ProcessId};

/// A list of mentions detected in one article by one process, with metadata
/// on how they were obtained.
#[derive(Debug, Clone)]
pub struct Mentions {
    source: ProcessId,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    editor: Option<String>,
    mentions: Vec<Mention>,
}

impl Mentions {
    /// Create an empty list attributed to the given recognizer/combiner.
    #[must_use]
    pub fn new(source: ProcessId) -> Self {
        let now = Utc::now();
        Self {
            source,
            created: now,
            modified: now,
            editor: None,
            mentions: Vec::new(),
        }
    }

    /// Create a list with explicit metadata, as read from a file.
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
            mentions: Vec::new(),
        }
    }

    /// The process that produced this list.
    #[must_use]
    pub fn source(&self) -> &ProcessId {
        &self.source
    }

    /// When this list was first produced.
    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When this list was last modified.
    #[must_use]
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
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

    /// Number of mentions in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    /// Iterate over the mentions in list order.
    pub fn iter(&self) -> impl Iterator<Item = &Mention> {
        self.mentions.iter()
    }

    /// The mention at the given list position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Mention> {
        self.mentions.get(index)
    }

    /// Append a mention. No redundancy check is performed.
    pub fn add(&mut self, mention: Mention) {
        self.mentions.push(mention);
        self.modified = Utc::now();
    }

    /// Append every mention of `other`.
    pub fn add_all(&mut self, other: &Mentions) {
        self.mentions.extend(other.mentions.iter().cloned());
        self.modified = Utc::now();
    }

    /// Remove the first mention equal to `mention`, if present.
    pub fn remove(&mut self, mention: &Mention) -> bool {
        if let Some(idx) = self.mentions.iter().position(|m| m == mention) {
            self.mentions.remove(idx);
            self.modified = Utc::now();
            true
        } else {
            false
        }
    }

    /// All mentions overlapping the character range `[start, end)`.
    #[must_use]
    pub fn mentions_in(&self, start: usize, end: usize) -> Vec<&Mention> {
        self.mentions
            .iter()
            .filter(|m| crate::position::overlaps(m.start, m.end, start, end))
            .collect()
    }

    /// All mentions of the given type, in list order.
    #[must_use]
    pub fn of_type(&self, entity_type: EntityType) -> Vec<&Mention> {
        self.mentions
            .iter()
            .filter(|m| m.entity_type == entity_type)
            .collect()
    }

    /// Drop every mention whose type is not in `types`.
    pub fn retain_types(&mut self, types: &[EntityType]) {
        self.mentions.retain(|m| types.contains(&m.entity_type));
    }

    /// Sort the mentions by text position (start, then end).
    pub fn sort_by_position(&mut self) {
        self.mentions.sort_by(Mention::position_cmp);
    }

    /// Whether `mention` spatially intersects one of the mentions in the list.
    #[must_use]
    pub fn overlaps_any(&self, mention: &Mention) -> bool {
        self.mentions.iter().any(|m| m.overlaps_with(mention))
    }

    /// Redirect every mention referencing entity `from` onto entity `to`.
    pub fn switch_entity(&mut self, from: i64, to: i64) {
        for m in &mut self.mentions {
            if m.entity == Some(from) {
                m.entity = Some(to);
            }
        }
        self.modified = Utc::now();
    }

    /// Redirect entity references according to `remap` in a single pass.
    /// References absent from the map are left untouched.
    pub fn remap_entities(&mut self, remap: &BTreeMap<i64, i64>) {
        for m in &mut self.mentions {
            if let Some(id) = m.entity {
                if let Some(new_id) = remap.get(&id) {
                    m.entity = Some(*new_id);
                }
            }
        }
        self.modified = Utc::now();
    }

    /// Set the resolved entity of the mention at `index`.
    pub(crate) fn set_entity(&mut self, index: usize, entity_id: i64) {
        if let Some(m) = self.mentions.get_mut(index) {
            m.entity = Some(entity_id);
        }
    }

    /// Shift right by `length` characters every mention located after
    /// position `start`, refreshing surface strings from `text`. Mentions
    /// whose span collapses are dropped.
    pub fn shift_right(&mut self, start: usize, length: usize, text: &str) {
        self.mentions.retain_mut(|m| {
            if start <= m.start {
                m.start = (m.start + length).min(text.len());
            }
            if start < m.end {
                m.end = (m.end + length).min(text.len());
            }
            if m.start < m.end {
                m.text = text[m.start..m.end].to_string();
                true
            } else {
                false
            }
        });
        self.modified = Utc::now();
    }

    /// Shift left by `length` characters every mention located after
    /// position `start`, refreshing surface strings from `text`. Mentions
    /// whose span collapses are dropped.
    pub fn shift_left(&mut self, start: usize, length: usize, text: &str) {
        self.mentions.retain_mut(|m| {
            if start <= m.start {
                m.start = m.start.saturating_sub(length).max(start);
            }
            if start < m.end {
                m.end = m.end.saturating_sub(length).max(start);
            }
            if m.start < m.end {
                m.text = text[m.start..m.end].to_string();
                true
            } else {
                false
            }
        });
        self.modified = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(t: EntityType, start: usize, end: usize, text: &str) -> Mention {
        Mention::new(t, start, end, text, ProcessId::new("test"))
    }

    #[test]
    fn range_query_uses_overlap() {
        let mut mentions = Mentions::new(ProcessId::new("test"));
        mentions.add(mention(EntityType::Person, 0, 5, "Alice"));
        mentions.add(mention(EntityType::Location, 10, 15, "Paris"));
        mentions.add(mention(EntityType::Person, 20, 25, "Carol"));

        let hits = mentions.mentions_in(3, 12);
        assert_eq!(hits.len(), 2);
        assert!(mentions.mentions_in(5, 10).is_empty());
    }

    #[test]
    fn switch_entity_rewrites_all_references() {
        let mut mentions = Mentions::new(ProcessId::new("test"));
        let mut a = mention(EntityType::Person, 0, 5, "Alice");
        a.entity = Some(3);
        let mut b = mention(EntityType::Person, 10, 15, "Alice");
        b.entity = Some(3);
        let mut c = mention(EntityType::Person, 20, 25, "Bob");
        c.entity = Some(4);
        mentions.add(a);
        mentions.add(b);
        mentions.add(c);

        mentions.switch_entity(3, 7);
        let ids: Vec<_> = mentions.iter().map(|m| m.entity).collect();
        assert_eq!(ids, vec![Some(7), Some(7), Some(4)]);
    }

    #[test]
    fn sort_by_position_orders_by_start_then_end() {
        let mut mentions = Mentions::new(ProcessId::new("test"));
        mentions.add(mention(EntityType::Person, 10, 15, "b"));
        mentions.add(mention(EntityType::Person, 0, 8, "a"));
        mentions.add(mention(EntityType::Person, 0, 5, "a"));
        mentions.sort_by_position();
        let spans: Vec<_> = mentions.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans, vec![(0, 5), (0, 8), (10, 15)]);
    }

    #[test]
    fn shift_right_moves_and_refreshes_text() {
        //           0123456789012345
        let before = "Alice in Paris";
        let after = "Alice was in Paris";
        let mut mentions = Mentions::new(ProcessId::new("test"));
        mentions.add(mention(EntityType::Person, 0, 5, "Alice"));
        mentions.add(mention(EntityType::Location, 9, 14, "Paris"));
        assert_eq!(&before[9..14], "Paris");

        // insertion of "was " (4 chars) at position 6
        mentions.shift_right(6, 4, after);
        let m: Vec<_> = mentions.iter().collect();
        assert_eq!((m[0].start, m[0].end), (0, 5));
        assert_eq!((m[1].start, m[1].end), (13, 18));
        assert_eq!(m[1].text, "Paris");
    }

    #[test]
    fn shift_left_drops_collapsed_mentions() {
        let after = "in Paris";
        let mut mentions = Mentions::new(ProcessId::new("test"));
        mentions.add(mention(EntityType::Person, 0, 5, "Alice"));
        mentions.add(mention(EntityType::Location, 9, 14, "Paris"));

        // deletion of 6 chars starting at 0: "Alice " removed
        mentions.shift_left(0, 6, after);
        assert_eq!(mentions.len(), 1);
        let m = mentions.iter().next().unwrap();
        assert_eq!((m.start, m.end), (3, 8));
        assert_eq!(m.text, "Paris");
    }

    #[test]
    fn overlaps_any_detects_intersections() {
        let mut mentions = Mentions::new(ProcessId::new("test"));
        mentions.add(mention(EntityType::Person, 5, 10, "x"));
        assert!(mentions.overlaps_any(&mention(EntityType::Person, 8, 12, "y")));
        assert!(!mentions.overlaps_any(&mention(EntityType::Person, 10, 12, "y")));
    }
}
