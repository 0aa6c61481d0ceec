//! End-to-end pipeline: recognizers -> combination -> resolution -> scoring.

use nerfuse::combine::{apply_recognizers, VoteCombiner};
use nerfuse::eval::{lille, muc, LilleMeasure, MucMeasure};
use nerfuse::{
    merge_entities, Article, Entities, EntityType, KnowledgeBase, Mention, Mentions,
    MockRecognizer, ProcessId, Recognizer, Resolver,
};

const TYPES: [EntityType; 3] = [
    EntityType::Location,
    EntityType::Organization,
    EntityType::Person,
];

fn mention(name: &str, t: EntityType, start: usize, end: usize, text: &str) -> Mention {
    Mention::new(t, start, end, text, ProcessId::new(name))
}

#[test]
fn recognize_combine_resolve_and_score() {
    //             0123456789012345678901234567890
    let article = Article::new("test", "John Smith works in London today");

    // three recognizers agreeing on the person, two on the location
    let r1 = MockRecognizer::new("alpha").with_mentions(vec![
        mention("alpha", EntityType::Person, 0, 10, "John Smith"),
        mention("alpha", EntityType::Location, 20, 26, "London"),
    ]);
    let r2 = MockRecognizer::new("beta").with_mentions(vec![
        mention("beta", EntityType::Person, 0, 10, "John Smith"),
        mention("beta", EntityType::Location, 20, 26, "London"),
    ]);
    let r3 = MockRecognizer::new("gamma").with_mentions(vec![
        mention("gamma", EntityType::Person, 0, 4, "John"),
        mention("gamma", EntityType::Organization, 20, 26, "London"),
    ]);

    let recognizers: Vec<&dyn Recognizer> = vec![&r1, &r2, &r3];
    let outputs = apply_recognizers(&recognizers, &article, &TYPES).unwrap();
    assert_eq!(outputs.len(), 3);

    let combiner = VoteCombiner::uniform(
        ProcessId::new("vote-combiner"),
        vec![r1.id(), r2.id(), r3.id()],
        TYPES.to_vec(),
        false,
    );
    let mut consensus = combiner.combine(&article, &outputs).unwrap();
    assert_eq!(consensus.len(), 2);
    let person = consensus.get(0).unwrap();
    assert_eq!(person.entity_type, EntityType::Person);
    assert_eq!((person.start, person.end), (0, 10));
    let location = consensus.get(1).unwrap();
    assert_eq!(location.entity_type, EntityType::Location);
    assert_eq!(location.text, "London");

    // resolution gives every consensus mention an entity
    let mut entities = Entities::new();
    let resolver = Resolver::new(ProcessId::new("naive"), true);
    resolver.complete(&mut consensus, &mut entities).unwrap();
    assert_eq!(entities.len(), 2);
    assert!(consensus.iter().all(|m| m.entity.is_some()));

    // scoring against a hand-written reference
    let reference_id = ProcessId::reference();
    let mut reference = Mentions::new(reference_id.clone());
    reference.add(Mention::new(
        EntityType::Person,
        0,
        10,
        "John Smith",
        reference_id.clone(),
    ));
    reference.add(Mention::new(
        EntityType::Location,
        20,
        26,
        "London",
        reference_id,
    ));

    let muc_measure = MucMeasure::evaluate(&TYPES, &reference, &consensus, &[]);
    let scores = muc_measure.scores().unwrap();
    assert!((scores.all(muc::PRECISION).unwrap() - 1.0).abs() < 1e-6);
    assert!((scores.all(muc::RECALL).unwrap() - 1.0).abs() < 1e-6);

    let lille_measure = LilleMeasure::evaluate(&TYPES, &reference, &consensus, &[]);
    assert_eq!(lille_measure.count(lille::FULL_MATCHES), 2);
    assert_eq!(lille_measure.count(lille::COMPLETE_MISSES), 0);
}

#[test]
fn linker_merge_collapses_coreferent_entities() {
    let source = ProcessId::new("combiner");
    let mut mentions = Mentions::new(source.clone());
    mentions.add(Mention::new(
        EntityType::Person,
        0,
        8,
        "Napoleon",
        source.clone(),
    ));
    mentions.add(Mention::new(
        EntityType::Person,
        30,
        39,
        "Bonaparte",
        source,
    ));

    let mut entities = Entities::new();
    let resolver = Resolver::new(ProcessId::new("naive"), true);
    resolver.complete(&mut mentions, &mut entities).unwrap();
    assert_eq!(entities.len(), 2);

    // a linker binds both surface forms to the same knowledge-base entry
    let ids: Vec<i64> = mentions.iter().filter_map(|m| m.entity).collect();
    entities
        .add_external_id(ids[0], KnowledgeBase::DbPedia, "dbr:Napoleon")
        .unwrap();
    entities
        .add_external_id(ids[1], KnowledgeBase::DbPedia, "dbr:Napoleon")
        .unwrap();

    merge_entities(&mut entities, &mut mentions).unwrap();
    assert_eq!(entities.len(), 1);
    let merged: Vec<i64> = mentions.iter().filter_map(|m| m.entity).collect();
    assert_eq!(merged[0], merged[1]);
    let entity = entities.get(merged[0]).unwrap().as_named().unwrap();
    assert!(entity.surface_forms.contains("Napoleon"));
    assert!(entity.surface_forms.contains("Bonaparte"));
}
