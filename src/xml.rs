//! XML persistence for entity/mention collections.
//!
//! A processing run is stored as a file pair: an entities file and a mentions
//! file whose mention records reference entities by internal id. Reading the
//! pair back reconstructs an equivalent [`Entities`]/[`Mentions`] pair, ids
//! included, so the secondary indices rebuild deterministically.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::entity::{Entity, EntityType, EntityValue, KnowledgeBase, NamedEntity, ValuedEntity};
use crate::error::{Error, Result};
use crate::mention::{Mention, ProcessId};
use crate::{Entities, Mentions};

const ELT_ENTITIES: &str = "entities";
const ELT_ENTITY: &str = "entity";
const ELT_SURFACE_FORM: &str = "surface-form";
const ELT_EXTERNAL_ID: &str = "external-id";
const ELT_MENTIONS: &str = "mentions";
const ELT_MENTION: &str = "mention";

const ATT_SOURCE: &str = "source";
const ATT_CREATION: &str = "creation";
const ATT_MODIFICATION: &str = "modification";
const ATT_EDITOR: &str = "editor";
const ATT_TYPE: &str = "type";
const ATT_ID: &str = "id";
const ATT_NAME: &str = "name";
const ATT_VALUE: &str = "value";
const ATT_KNOWLEDGE_BASE: &str = "knowledge-base";
const ATT_START: &str = "start";
const ATT_END: &str = "end";
const ATT_ENTITY_ID: &str = "entity-id";

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::parse(format!("xml: {e}"))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::parse(format!("invalid timestamp '{value}': {e}")))
}

/// Write an entity collection to the given XML file.
pub fn write_entities(entities: &Entities, path: &Path) -> Result<()> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new(ELT_ENTITIES);
    root.push_attribute((ATT_SOURCE, entities.source().as_str()));
    root.push_attribute((ATT_CREATION, entities.created().to_rfc3339().as_str()));
    root.push_attribute((ATT_MODIFICATION, entities.modified().to_rfc3339().as_str()));
    if let Some(editor) = entities.editor() {
        root.push_attribute((ATT_EDITOR, editor));
    }
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for entity in entities.iter() {
        write_entity(&mut writer, entity)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ELT_ENTITIES)))
        .map_err(xml_err)?;
    fs::write(path, writer.into_inner())?;
    Ok(())
}

fn write_entity(writer: &mut Writer<Vec<u8>>, entity: &Entity) -> Result<()> {
    let mut elem = BytesStart::new(ELT_ENTITY);
    elem.push_attribute((ATT_TYPE, entity.entity_type().as_label()));
    elem.push_attribute((ATT_ID, entity.internal_id().to_string().as_str()));
    match entity {
        Entity::Named(named) => {
            elem.push_attribute((ATT_NAME, named.name.as_str()));
            writer.write_event(Event::Start(elem)).map_err(xml_err)?;
            for form in &named.surface_forms {
                writer
                    .write_event(Event::Start(BytesStart::new(ELT_SURFACE_FORM)))
                    .map_err(xml_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(form)))
                    .map_err(xml_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new(ELT_SURFACE_FORM)))
                    .map_err(xml_err)?;
            }
            for (kb, ext) in &named.external_ids {
                let mut id_elem = BytesStart::new(ELT_EXTERNAL_ID);
                id_elem.push_attribute((ATT_KNOWLEDGE_BASE, kb.as_label()));
                writer.write_event(Event::Start(id_elem)).map_err(xml_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(ext)))
                    .map_err(xml_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new(ELT_EXTERNAL_ID)))
                    .map_err(xml_err)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(ELT_ENTITY)))
                .map_err(xml_err)?;
        }
        Entity::Valued(valued) => {
            elem.push_attribute((ATT_VALUE, valued.value.to_string().as_str()));
            writer.write_event(Event::Empty(elem)).map_err(xml_err)?;
        }
    }
    Ok(())
}

/// Read an entity collection from the given XML file.
pub fn read_entities(path: &Path) -> Result<Entities> {
    let content = fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut entities: Option<Entities> = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == ELT_ENTITIES.as_bytes() => {
                entities = Some(read_entities_root(&e)?);
            }
            Event::Start(e) if e.name().as_ref() == ELT_ENTITY.as_bytes() => {
                let target = entities
                    .as_mut()
                    .ok_or_else(|| Error::parse("entity element outside entities root"))?;
                let entity = read_named_entity(&mut reader, &e)?;
                target.add(entity)?;
            }
            Event::Empty(e) if e.name().as_ref() == ELT_ENTITY.as_bytes() => {
                let target = entities
                    .as_mut()
                    .ok_or_else(|| Error::parse("entity element outside entities root"))?;
                let entity = read_valued_entity(&e)?;
                target.add(entity)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    entities.ok_or_else(|| Error::parse("missing entities root element"))
}

struct Attrs {
    pairs: Vec<(String, String)>,
}

impl Attrs {
    fn of(elem: &BytesStart<'_>) -> Result<Self> {
        let mut pairs = Vec::new();
        for attr in elem.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(xml_err)?.to_string();
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::parse(format!("missing attribute '{key}'")))
    }
}

fn read_entities_root(elem: &BytesStart<'_>) -> Result<Entities> {
    let attrs = Attrs::of(elem)?;
    let source = ProcessId::new(attrs.require(ATT_SOURCE)?);
    let created = parse_time(attrs.require(ATT_CREATION)?)?;
    let modified = parse_time(attrs.require(ATT_MODIFICATION)?)?;
    let editor = attrs.get(ATT_EDITOR).map(str::to_string);
    Ok(Entities::with_metadata(source, created, modified, editor))
}

fn parse_entity_type(attrs: &Attrs) -> Result<EntityType> {
    let label = attrs.require(ATT_TYPE)?;
    EntityType::from_label(label)
        .ok_or_else(|| Error::parse(format!("unknown entity type '{label}'")))
}

fn parse_id(attrs: &Attrs) -> Result<i64> {
    let raw = attrs.require(ATT_ID)?;
    raw.parse::<i64>()
        .map_err(|e| Error::parse(format!("invalid id '{raw}': {e}")))
}

fn read_named_entity(reader: &mut Reader<&[u8]>, elem: &BytesStart<'_>) -> Result<Entity> {
    let attrs = Attrs::of(elem)?;
    let entity_type = parse_entity_type(&attrs)?;
    let id = parse_id(&attrs)?;
    let name = attrs.require(ATT_NAME)?;

    let mut named = NamedEntity::new(entity_type, name)?;
    named.internal_id = id;

    // nested surface forms and external ids, until the closing entity tag
    let mut pending_kb: Option<KnowledgeBase> = None;
    let mut in_surface_form = false;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == ELT_SURFACE_FORM.as_bytes() => {
                in_surface_form = true;
            }
            Event::Start(e) if e.name().as_ref() == ELT_EXTERNAL_ID.as_bytes() => {
                let attrs = Attrs::of(&e)?;
                let kb = KnowledgeBase::from_label(attrs.require(ATT_KNOWLEDGE_BASE)?);
                pending_kb = Some(kb);
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?.to_string();
                if in_surface_form {
                    named.add_surface_form(text);
                } else if let Some(kb) = pending_kb.clone() {
                    named.add_external_id(kb, text);
                }
            }
            Event::End(e) if e.name().as_ref() == ELT_SURFACE_FORM.as_bytes() => {
                in_surface_form = false;
            }
            Event::End(e) if e.name().as_ref() == ELT_EXTERNAL_ID.as_bytes() => {
                pending_kb = None;
            }
            Event::End(e) if e.name().as_ref() == ELT_ENTITY.as_bytes() => break,
            Event::Eof => return Err(Error::parse("unexpected end of entities file")),
            _ => {}
        }
    }
    Ok(Entity::Named(named))
}

fn read_valued_entity(elem: &BytesStart<'_>) -> Result<Entity> {
    let attrs = Attrs::of(elem)?;
    let entity_type = parse_entity_type(&attrs)?;
    let id = parse_id(&attrs)?;
    let value = EntityValue::parse(entity_type, attrs.require(ATT_VALUE)?)?;
    let mut valued = ValuedEntity::new(value);
    valued.internal_id = id;
    Ok(Entity::Valued(valued))
}

/// Write a mention list to the given XML file, validating that every resolved
/// mention references an entity of the companion collection.
pub fn write_mentions(mentions: &Mentions, entities: &Entities, path: &Path) -> Result<()> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new(ELT_MENTIONS);
    root.push_attribute((ATT_SOURCE, mentions.source().as_str()));
    root.push_attribute((ATT_CREATION, mentions.created().to_rfc3339().as_str()));
    root.push_attribute((ATT_MODIFICATION, mentions.modified().to_rfc3339().as_str()));
    if let Some(editor) = mentions.editor() {
        root.push_attribute((ATT_EDITOR, editor));
    }
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for mention in mentions.iter() {
        if let Some(id) = mention.entity {
            if entities.get(id).is_none() {
                return Err(Error::UnknownEntity(id));
            }
        }
        let mut elem = BytesStart::new(ELT_MENTION);
        elem.push_attribute((ATT_TYPE, mention.entity_type.as_label()));
        elem.push_attribute((ATT_START, mention.start.to_string().as_str()));
        elem.push_attribute((ATT_END, mention.end.to_string().as_str()));
        elem.push_attribute((ATT_SOURCE, mention.source.as_str()));
        if let Some(id) = mention.entity {
            elem.push_attribute((ATT_ENTITY_ID, id.to_string().as_str()));
        }
        if let Some(value) = &mention.value {
            elem.push_attribute((ATT_VALUE, value.to_string().as_str()));
        }
        writer.write_event(Event::Start(elem)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(&mention.text)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new(ELT_MENTION)))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ELT_MENTIONS)))
        .map_err(xml_err)?;
    fs::write(path, writer.into_inner())?;
    Ok(())
}

/// Read a mention list from the given XML file, resolving entity references
/// against the companion collection. An unknown reference is a hard error.
pub fn read_mentions(path: &Path, entities: &Entities) -> Result<Mentions> {
    let content = fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut mentions: Option<Mentions> = None;
    let mut pending: Option<Mention> = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == ELT_MENTIONS.as_bytes() => {
                let attrs = Attrs::of(&e)?;
                let source = ProcessId::new(attrs.require(ATT_SOURCE)?);
                let created = parse_time(attrs.require(ATT_CREATION)?)?;
                let modified = parse_time(attrs.require(ATT_MODIFICATION)?)?;
                let editor = attrs.get(ATT_EDITOR).map(str::to_string);
                mentions = Some(Mentions::with_metadata(source, created, modified, editor));
            }
            Event::Start(e) if e.name().as_ref() == ELT_MENTION.as_bytes() => {
                pending = Some(read_mention(&e, entities)?);
            }
            Event::Text(t) => {
                if let Some(m) = pending.as_mut() {
                    m.text = t.unescape().map_err(xml_err)?.to_string();
                }
            }
            Event::End(e) if e.name().as_ref() == ELT_MENTION.as_bytes() => {
                let target = mentions
                    .as_mut()
                    .ok_or_else(|| Error::parse("mention element outside mentions root"))?;
                let m = pending
                    .take()
                    .ok_or_else(|| Error::parse("unbalanced mention element"))?;
                target.add(m);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    mentions.ok_or_else(|| Error::parse("missing mentions root element"))
}

fn read_mention(elem: &BytesStart<'_>, entities: &Entities) -> Result<Mention> {
    let attrs = Attrs::of(elem)?;
    let entity_type = parse_entity_type(&attrs)?;
    let start = attrs
        .require(ATT_START)?
        .parse::<usize>()
        .map_err(|e| Error::parse(format!("invalid start: {e}")))?;
    let end = attrs
        .require(ATT_END)?
        .parse::<usize>()
        .map_err(|e| Error::parse(format!("invalid end: {e}")))?;
    let source = ProcessId::new(attrs.require(ATT_SOURCE)?);

    let mut mention = Mention::new(entity_type, start, end, "", source);
    if let Some(raw) = attrs.get(ATT_ENTITY_ID) {
        let id = raw
            .parse::<i64>()
            .map_err(|e| Error::parse(format!("invalid entity id '{raw}': {e}")))?;
        if entities.get(id).is_none() {
            return Err(Error::parse(format!(
                "mention references unknown entity {id}"
            )));
        }
        mention.entity = Some(id);
    }
    if let Some(raw) = attrs.get(ATT_VALUE) {
        mention.value = Some(EntityValue::parse(entity_type, raw)?);
    }
    Ok(mention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_pair() -> (Entities, Mentions) {
        let mut entities = Entities::with_source(ProcessId::new("linker"));
        let mut named = NamedEntity::new(EntityType::Person, "John Smith").unwrap();
        named.add_surface_form("Smith");
        named.add_external_id(KnowledgeBase::DbPedia, "dbr:John_Smith");
        named.add_external_id(KnowledgeBase::Wikidata, "Q42");
        let person_id = entities.add(Entity::Named(named)).unwrap();
        let date = EntityValue::Date(NaiveDate::from_ymd_opt(2013, 6, 4).unwrap());
        let date_id = entities.add(Entity::valued(date.clone())).unwrap();

        let mut mentions = Mentions::new(ProcessId::new("combiner"));
        let mut m1 = Mention::new(
            EntityType::Person,
            0,
            10,
            "John Smith",
            ProcessId::new("stanford"),
        );
        m1.entity = Some(person_id);
        mentions.add(m1);
        let mut m2 = Mention::new(
            EntityType::Date,
            20,
            32,
            "June 4, 2013",
            ProcessId::new("heideltime"),
        )
        .with_value(date);
        m2.entity = Some(date_id);
        mentions.add(m2);
        (entities, mentions)
    }

    #[test]
    fn entities_roundtrip() {
        let (entities, _) = sample_pair();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.xml");
        write_entities(&entities, &path).unwrap();

        let reread = read_entities(&path).unwrap();
        assert_eq!(reread.source(), entities.source());
        assert_eq!(reread.len(), entities.len());
        for entity in entities.iter() {
            let got = reread.get(entity.internal_id()).unwrap();
            assert_eq!(got.entity_type(), entity.entity_type());
            if let (Some(a), Some(b)) = (entity.as_named(), got.as_named()) {
                assert_eq!(a.name, b.name);
                assert_eq!(a.surface_forms, b.surface_forms);
                assert_eq!(a.external_ids, b.external_ids);
            }
            if let (Some(a), Some(b)) = (entity.as_valued(), got.as_valued()) {
                assert_eq!(a.value, b.value);
            }
        }
    }

    #[test]
    fn mentions_roundtrip_preserves_spans_and_references() {
        let (entities, mentions) = sample_pair();
        let dir = tempfile::tempdir().unwrap();
        let epath = dir.path().join("entities.xml");
        let mpath = dir.path().join("mentions.xml");
        write_entities(&entities, &epath).unwrap();
        write_mentions(&mentions, &entities, &mpath).unwrap();

        let entities2 = read_entities(&epath).unwrap();
        let reread = read_mentions(&mpath, &entities2).unwrap();
        assert_eq!(reread.len(), mentions.len());
        for (a, b) in mentions.iter().zip(reread.iter()) {
            assert_eq!((a.start, a.end), (b.start, b.end));
            assert_eq!(a.entity_type, b.entity_type);
            assert_eq!(a.text, b.text);
            assert_eq!(a.entity, b.entity);
            assert_eq!(a.value, b.value);
            assert_eq!(a.source, b.source);
        }
    }

    #[test]
    fn unknown_entity_reference_is_rejected() {
        let (entities, mut mentions) = sample_pair();
        let mut bad = Mention::new(EntityType::Person, 0, 1, "x", ProcessId::new("r"));
        bad.entity = Some(999);
        mentions.add(bad);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mentions.xml");
        assert!(write_mentions(&mentions, &entities, &path).is_err());
    }

    #[test]
    fn malformed_file_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.xml");
        fs::write(&path, "<entities><entity type=\"PERSON\"").unwrap();
        assert!(read_entities(&path).is_err());
    }
}
