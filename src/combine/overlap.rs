//! Overlap-group identification across recognizer outputs.
//!
//! An overlap group is a maximal set of mentions, at most one per recognizer,
//! whose spans mutually intersect the earliest mention of the group. Groups
//! are produced by a linear sweep over the recognizers' position-sorted
//! mention streams, advancing only the streams that contributed to the
//! current group.

use std::collections::{BTreeMap, VecDeque};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::article::Article;
use crate::mention::{Mention, ProcessId};
use crate::position::PositionRelation;
use crate::Mentions;

/// Group spatially overlapping mentions across recognizers.
///
/// Each map in the result holds the mentions the different recognizers
/// produced for what is considered one and the same mention. A recognizer
/// absent from a map proposed nothing at that text position. The earliest
/// candidate in text order seeds each group; overlap is tested against that
/// seed only (first-match policy, not transitive closure).
#[must_use]
pub fn overlap_groups(
    outputs: &BTreeMap<ProcessId, Mentions>,
) -> Vec<BTreeMap<ProcessId, Mention>> {
    let mut result = Vec::new();

    // position-sorted stream per recognizer, empty streams dropped
    let mut streams: BTreeMap<ProcessId, VecDeque<Mention>> = BTreeMap::new();
    for (recognizer, mentions) in outputs {
        let mut sorted: Vec<Mention> = mentions.iter().cloned().collect();
        sorted.sort_by(Mention::position_cmp);
        if !sorted.is_empty() {
            streams.insert(recognizer.clone(), sorted.into());
        }
    }

    while streams.len() > 1 {
        // seed: the earliest current mention across all streams
        let seed = streams
            .iter()
            .map(|(_, stream)| stream[0].clone())
            .min_by(|a, b| a.position_cmp(b))
            .expect("streams is non-empty");

        // collect the overlapping currents, advancing their streams
        let mut group = BTreeMap::new();
        let mut exhausted = Vec::new();
        for (recognizer, stream) in &mut streams {
            if stream[0].overlaps_with(&seed) {
                let mention = stream.pop_front().expect("stream is non-empty");
                group.insert(recognizer.clone(), mention);
                if stream.is_empty() {
                    exhausted.push(recognizer.clone());
                }
            }
        }
        for recognizer in exhausted {
            streams.remove(&recognizer);
        }
        // a degenerate (empty-span) seed overlaps nothing, itself included;
        // drop it to guarantee progress
        if group.is_empty() {
            for stream in streams.values_mut() {
                if stream[0] == seed {
                    stream.pop_front();
                    break;
                }
            }
            streams.retain(|_, stream| !stream.is_empty());
            continue;
        }
        result.push(group);
    }

    // a single remaining stream: every leftover mention is its own group
    if let Some((recognizer, stream)) = streams.into_iter().next() {
        for mention in stream {
            let mut group = BTreeMap::new();
            group.insert(recognizer.clone(), mention);
            result.push(group);
        }
    }

    result
}

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{P}\p{Z}\s]+").expect("valid word pattern"));

/// Split a text into word spans, where words are maximal runs of characters
/// that are neither punctuation nor whitespace.
#[must_use]
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    WORD_RE
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// A word of the article together with the mention some recognizer proposed
/// over it.
#[derive(Debug, Clone)]
pub struct WordMention {
    /// Start position of the word in the article text
    pub start: usize,
    /// End position of the word in the article text
    pub end: usize,
    /// Whether the word sits at the beginning of the mention
    pub beginning: bool,
    /// The overlapping mention
    pub mention: Mention,
}

/// For each word of the article, collect the mention each recognizer proposed
/// over that word, if any.
///
/// Words overlapping no mention at all yield an empty map (an Outside word
/// for the BIO decoder). Once every recognizer's stream is exhausted the walk
/// stops; trailing words produce no map.
#[must_use]
pub fn word_groups(
    article: &Article,
    outputs: &BTreeMap<ProcessId, Mentions>,
) -> Vec<BTreeMap<ProcessId, WordMention>> {
    let mut result = Vec::new();

    let mut streams: BTreeMap<ProcessId, VecDeque<Mention>> = BTreeMap::new();
    for (recognizer, mentions) in outputs {
        let mut sorted: Vec<Mention> = mentions.iter().cloned().collect();
        sorted.sort_by(Mention::position_cmp);
        if !sorted.is_empty() {
            streams.insert(recognizer.clone(), sorted.into());
        }
    }

    for (word_start, word_end) in word_spans(&article.text) {
        if streams.is_empty() {
            break;
        }
        let mut group = BTreeMap::new();
        let mut exhausted = Vec::new();
        for (recognizer, stream) in &mut streams {
            // skip mentions that end before this word
            let relation = loop {
                let relation = PositionRelation::of(
                    stream[0].start,
                    stream[0].end,
                    word_start,
                    word_end,
                );
                if relation == PositionRelation::CompletePrecedes && stream.len() > 1 {
                    stream.pop_front();
                } else {
                    break relation;
                }
            };

            match relation {
                PositionRelation::CompletePrecedes => {
                    exhausted.push(recognizer.clone());
                }
                PositionRelation::CompleteSucceeds => {}
                _ => {
                    let mention = stream[0].clone();
                    group.insert(
                        recognizer.clone(),
                        WordMention {
                            start: word_start,
                            end: word_end,
                            beginning: word_start <= mention.start,
                            mention,
                        },
                    );
                }
            }
        }
        for recognizer in exhausted {
            streams.remove(&recognizer);
        }
        result.push(group);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

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

    #[test]
    fn groups_cluster_overlapping_mentions() {
        let outputs = outputs(&[
            (
                "a",
                &[(EntityType::Person, 0, 10), (EntityType::Location, 20, 30)],
            ),
            (
                "b",
                &[(EntityType::Person, 5, 12), (EntityType::Location, 22, 28)],
            ),
        ]);
        let groups = overlap_groups(&outputs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][&ProcessId::new("a")].start, 0);
        assert_eq!(groups[0][&ProcessId::new("b")].start, 5);
        assert_eq!(groups[1].len(), 2);
    }

    #[test]
    fn disjoint_mentions_form_singleton_groups() {
        let outputs = outputs(&[
            ("a", &[(EntityType::Person, 0, 5)]),
            ("b", &[(EntityType::Person, 10, 15)]),
        ]);
        let groups = overlap_groups(&outputs);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn leftover_stream_produces_singletons() {
        let outputs = outputs(&[
            ("a", &[(EntityType::Person, 0, 5)]),
            (
                "b",
                &[
                    (EntityType::Person, 2, 6),
                    (EntityType::Person, 10, 15),
                    (EntityType::Person, 20, 25),
                ],
            ),
        ]);
        let groups = overlap_groups(&outputs);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[2].len(), 1);
    }

    #[test]
    fn word_spans_split_on_punctuation_and_space() {
        let spans = word_spans("John Smith, who lives in Paris.");
        let words: Vec<&str> = spans
            .iter()
            .map(|(s, e)| &"John Smith, who lives in Paris."[*s..*e])
            .collect();
        assert_eq!(words, vec!["John", "Smith", "who", "lives", "in", "Paris"]);
    }

    #[test]
    fn word_groups_tag_beginning_and_inside() {
        //            0123456789012345
        let article = Article::new("t", "John Smith here");
        let outputs = outputs(&[("a", &[(EntityType::Person, 0, 10)])]);
        let groups = word_groups(&article, &outputs);
        // one map per word while the stream lasts
        assert_eq!(groups.len(), 3);
        let a = ProcessId::new("a");
        assert!(groups[0][&a].beginning);
        assert!(!groups[1][&a].beginning);
        // "here" overlaps nothing
        assert!(groups[2].is_empty());
    }
}
