//! Shared machinery for recognition measures.
//!
//! Every measure keeps two kinds of numeric values: counts (integers such as
//! true positives) and scores (floats derived from the counts, such as
//! F-measure). Both exist in three breakdowns: overall, by entity type, and
//! by article category. Counts aggregate additively across a corpus; scores
//! are recomputed from the aggregated counts.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::article::ArticleCategory;
use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::mention::Mention;
use crate::Mentions;

/// Count tallies for one measure, in the three breakdowns.
#[derive(Debug, Clone)]
pub(crate) struct Breakdown {
    names: &'static [&'static str],
    types: Vec<EntityType>,
    all: BTreeMap<&'static str, i64>,
    by_type: BTreeMap<&'static str, BTreeMap<EntityType, i64>>,
    by_category: BTreeMap<&'static str, BTreeMap<ArticleCategory, i64>>,
}

impl Breakdown {
    pub(crate) fn new(names: &'static [&'static str], types: &[EntityType]) -> Self {
        let mut all = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        for name in names {
            all.insert(*name, 0);
            let per_type: BTreeMap<EntityType, i64> = types.iter().map(|t| (*t, 0)).collect();
            by_type.insert(*name, per_type);
            by_category.insert(*name, BTreeMap::new());
        }
        Self {
            names,
            types: types.to_vec(),
            all,
            by_type,
            by_category,
        }
    }

    pub(crate) fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub(crate) fn types(&self) -> &[EntityType] {
        &self.types
    }

    /// Categories represented in this breakdown, in canonical order.
    pub(crate) fn categories(&self) -> Vec<ArticleCategory> {
        let mut set = BTreeSet::new();
        for per_category in self.by_category.values() {
            set.extend(per_category.keys().copied());
        }
        set.into_iter().collect()
    }

    /// Count one item under `name`, for the given type and categories.
    pub(crate) fn add(
        &mut self,
        name: &'static str,
        entity_type: EntityType,
        categories: &[ArticleCategory],
    ) {
        self.add_dual(name, entity_type, entity_type, categories);
    }

    /// Count one item under `name`, attributing it to both types in the
    /// by-type breakdown when they differ. The overall tally moves by one
    /// either way.
    pub(crate) fn add_dual(
        &mut self,
        name: &'static str,
        type1: EntityType,
        type2: EntityType,
        categories: &[ArticleCategory],
    ) {
        *self.all.entry(name).or_insert(0) += 1;
        let per_type = self.by_type.entry(name).or_default();
        *per_type.entry(type1).or_insert(0) += 1;
        if type1 != type2 {
            *per_type.entry(type2).or_insert(0) += 1;
        }
        let per_category = self.by_category.entry(name).or_default();
        for category in categories {
            *per_category.entry(*category).or_insert(0) += 1;
        }
    }

    pub(crate) fn count(&self, name: &str) -> i64 {
        self.all.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn count_by_type(&self, name: &str, entity_type: EntityType) -> i64 {
        self.by_type
            .get(name)
            .and_then(|m| m.get(&entity_type))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn count_by_category(&self, name: &str, category: ArticleCategory) -> i64 {
        self.by_category
            .get(name)
            .and_then(|m| m.get(&category))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn set_count(&mut self, name: &'static str, value: i64) {
        self.all.insert(name, value);
    }

    pub(crate) fn set_count_by_type(
        &mut self,
        name: &'static str,
        entity_type: EntityType,
        value: i64,
    ) {
        self.by_type
            .entry(name)
            .or_default()
            .insert(entity_type, value);
    }

    pub(crate) fn set_count_by_category(
        &mut self,
        name: &'static str,
        category: ArticleCategory,
        value: i64,
    ) {
        self.by_category
            .entry(name)
            .or_default()
            .insert(category, value);
    }

    /// Add another breakdown's counts into this one (corpus aggregation).
    /// Both must carry the same count names and type list.
    pub(crate) fn merge(&mut self, other: &Breakdown) -> Result<()> {
        if self.names != other.names || self.types != other.types {
            return Err(Error::evaluation(
                "cannot aggregate measures with different counts or types",
            ));
        }
        for name in self.names {
            *self.all.entry(name).or_insert(0) += other.count(name);
            for entity_type in &other.types {
                *self
                    .by_type
                    .entry(name)
                    .or_default()
                    .entry(*entity_type)
                    .or_insert(0) += other.count_by_type(name, *entity_type);
            }
            for category in other.categories() {
                *self
                    .by_category
                    .entry(name)
                    .or_default()
                    .entry(category)
                    .or_insert(0) += other.count_by_category(name, category);
            }
        }
        Ok(())
    }
}

/// Score values for one measure, in the three breakdowns.
#[derive(Debug, Clone)]
pub struct Scores {
    pub(crate) names: &'static [&'static str],
    pub(crate) all: BTreeMap<&'static str, f32>,
    pub(crate) by_type: BTreeMap<&'static str, BTreeMap<EntityType, f32>>,
    pub(crate) by_category: BTreeMap<&'static str, BTreeMap<ArticleCategory, f32>>,
}

impl Scores {
    /// The overall value of the given score.
    #[must_use]
    pub fn all(&self, name: &str) -> Option<f32> {
        self.all.get(name).copied()
    }

    /// The value of the given score restricted to one entity type.
    #[must_use]
    pub fn by_type(&self, name: &str, entity_type: EntityType) -> Option<f32> {
        self.by_type.get(name).and_then(|m| m.get(&entity_type)).copied()
    }

    /// The value of the given score restricted to one article category.
    #[must_use]
    pub fn by_category(&self, name: &str, category: ArticleCategory) -> Option<f32> {
        self.by_category.get(name).and_then(|m| m.get(&category)).copied()
    }
}

/// Compute the three score breakdowns from a count breakdown, using the
/// measure-specific formula `compute` (counts lookup in, named scores out).
pub(crate) fn compute_scores(
    counts: &Breakdown,
    score_names: &'static [&'static str],
    compute: &dyn Fn(&dyn Fn(&str) -> i64) -> Result<Vec<(&'static str, f32)>>,
) -> Result<Scores> {
    let mut scores = Scores {
        names: score_names,
        all: BTreeMap::new(),
        by_type: BTreeMap::new(),
        by_category: BTreeMap::new(),
    };

    for (name, value) in compute(&|count| counts.count(count))? {
        scores.all.insert(name, value);
    }
    for entity_type in counts.types() {
        let values = compute(&|count| counts.count_by_type(count, *entity_type))?;
        for (name, value) in values {
            scores
                .by_type
                .entry(name)
                .or_default()
                .insert(*entity_type, value);
        }
    }
    for category in counts.categories() {
        let values = compute(&|count| counts.count_by_category(count, category))?;
        for (name, value) in values {
            scores
                .by_category
                .entry(name)
                .or_default()
                .insert(category, value);
        }
    }
    Ok(scores)
}

/// Harmonic mean of precision and recall, 0 when both are 0.
pub(crate) fn f_measure(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Ratio helper returning 0 for an empty denominator.
pub(crate) fn ratio(numerator: i64, denominator: i64) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

/// Copy a mention list, keeping only the evaluated types.
pub(crate) fn clean_mentions(mentions: &Mentions, types: &[EntityType]) -> Vec<Mention> {
    mentions
        .iter()
        .filter(|m| types.contains(&m.entity_type))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tabular text persistence
// ---------------------------------------------------------------------------

const OVERALL: &str = "Overall";
const COUNTS: &str = "Counts";
const SCORES: &str = "Scores";

/// Write the measure's counts and scores to a tab-separated text file with a
/// commented header block.
pub(crate) fn write_table(
    path: &Path,
    tool: &str,
    dataset: &str,
    measure_name: &str,
    counts: &Breakdown,
    scores: &Scores,
) -> Result<()> {
    let mut out = String::new();
    out.push_str(&format!("# tool evaluated: {tool}\n"));
    out.push_str(&format!("# evaluation data: {dataset}\n"));
    out.push_str(&format!(
        "# date of evaluation: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("# evaluation measure: {measure_name}\n"));
    out.push('\n');

    write_section(
        &mut out,
        COUNTS,
        counts.names(),
        counts.types(),
        &counts.categories(),
        &|name| counts.count(name).to_string(),
        &|name, t| counts.count_by_type(name, t).to_string(),
        &|name, c| counts.count_by_category(name, c).to_string(),
    );
    out.push('\n');
    write_section(
        &mut out,
        SCORES,
        scores.names,
        counts.types(),
        &counts.categories(),
        &|name| scores.all(name).unwrap_or(0.0).to_string(),
        &|name, t| scores.by_type(name, t).unwrap_or(0.0).to_string(),
        &|name, c| scores.by_category(name, c).unwrap_or(0.0).to_string(),
    );

    fs::write(path, out)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_section(
    out: &mut String,
    header: &str,
    names: &[&'static str],
    types: &[EntityType],
    categories: &[ArticleCategory],
    all: &dyn Fn(&str) -> String,
    by_type: &dyn Fn(&str, EntityType) -> String,
    by_category: &dyn Fn(&str, ArticleCategory) -> String,
) {
    let mut title = header.to_string();
    for name in names {
        title.push('\t');
        title.push_str(name);
    }
    out.push_str(&title);
    out.push('\n');

    out.push_str(&format!("# Overall {header} ##########\n"));
    let mut line = OVERALL.to_string();
    for name in names {
        line.push('\t');
        line.push_str(&all(name));
    }
    out.push_str(&line);
    out.push('\n');

    out.push_str(&format!("# {header} by type ##########\n"));
    for entity_type in types {
        let mut line = entity_type.as_label().to_string();
        for name in names {
            line.push('\t');
            line.push_str(&by_type(name, *entity_type));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!("# {header} by category ######\n"));
    for category in categories {
        let mut line = category.as_label().to_string();
        for name in names {
            line.push('\t');
            line.push_str(&by_category(name, *category));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("# {header} done #############\n"));
}

/// One parsed section: overall values plus by-type and by-category rows,
/// everything still in string form.
struct RawSection {
    overall: Vec<String>,
    by_type: Vec<(EntityType, Vec<String>)>,
    by_category: Vec<(ArticleCategory, Vec<String>)>,
}

/// Read back a measure file written by [`write_table`].
pub(crate) fn read_table(
    path: &Path,
    count_names: &'static [&'static str],
    score_names: &'static [&'static str],
) -> Result<(Breakdown, Scores)> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines().peekable();

    // header comment block
    for _ in 0..4 {
        let line = lines
            .next()
            .ok_or_else(|| Error::parse("truncated measure file header"))?;
        if !line.starts_with('#') {
            return Err(Error::parse("malformed measure file header"));
        }
    }
    expect_blank(&mut lines)?;

    let counts_section = read_section(&mut lines, COUNTS, count_names)?;
    expect_blank(&mut lines)?;
    let scores_section = read_section(&mut lines, SCORES, score_names)?;

    // rebuild the count breakdown
    let types: Vec<EntityType> = counts_section.by_type.iter().map(|(t, _)| *t).collect();
    let mut counts = Breakdown::new(count_names, &types);
    for (index, name) in count_names.iter().enumerate() {
        counts.set_count(name, parse_count(&counts_section.overall[index])?);
        for (entity_type, values) in &counts_section.by_type {
            counts.set_count_by_type(name, *entity_type, parse_count(&values[index])?);
        }
        for (category, values) in &counts_section.by_category {
            counts.set_count_by_category(name, *category, parse_count(&values[index])?);
        }
    }

    // rebuild the scores
    let mut scores = Scores {
        names: score_names,
        all: BTreeMap::new(),
        by_type: BTreeMap::new(),
        by_category: BTreeMap::new(),
    };
    for (index, name) in score_names.iter().enumerate() {
        scores.all.insert(name, parse_score(&scores_section.overall[index])?);
        for (entity_type, values) in &scores_section.by_type {
            scores
                .by_type
                .entry(name)
                .or_default()
                .insert(*entity_type, parse_score(&values[index])?);
        }
        for (category, values) in &scores_section.by_category {
            scores
                .by_category
                .entry(name)
                .or_default()
                .insert(*category, parse_score(&values[index])?);
        }
    }

    Ok((counts, scores))
}

fn parse_count(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|e| Error::parse(format!("invalid count '{raw}': {e}")))
}

fn parse_score(raw: &str) -> Result<f32> {
    raw.parse()
        .map_err(|e| Error::parse(format!("invalid score '{raw}': {e}")))
}

fn expect_blank<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Result<()> {
    match lines.next() {
        Some("") => Ok(()),
        _ => Err(Error::parse("expected blank separator line")),
    }
}

fn split_values(line: &str, expected: usize, what: &str) -> Result<(String, Vec<String>)> {
    let mut fields = line.split('\t').map(str::to_string);
    let label = fields
        .next()
        .ok_or_else(|| Error::parse(format!("empty {what} row")))?;
    let values: Vec<String> = fields.collect();
    if values.len() != expected {
        return Err(Error::parse(format!(
            "{what} row '{label}' has {} values, expected {expected}",
            values.len()
        )));
    }
    Ok((label, values))
}

fn read_section<'a>(
    lines: &mut std::iter::Peekable<impl Iterator<Item = &'a str>>,
    header: &str,
    names: &'static [&'static str],
) -> Result<RawSection> {
    // section title row: the header word followed by the value names
    let title = lines
        .next()
        .ok_or_else(|| Error::parse(format!("missing {header} section")))?;
    let (label, title_names) = split_values(title, names.len(), "section title")?;
    if label != header {
        return Err(Error::parse(format!(
            "expected {header} section, found '{label}'"
        )));
    }
    for (found, expected) in title_names.iter().zip(names) {
        if found != expected {
            return Err(Error::parse(format!(
                "unexpected column '{found}', expected '{expected}'"
            )));
        }
    }

    expect_comment(lines, header)?;
    let overall_line = lines
        .next()
        .ok_or_else(|| Error::parse("missing Overall row"))?;
    let (label, overall) = split_values(overall_line, names.len(), "Overall")?;
    if label != OVERALL {
        return Err(Error::parse(format!(
            "expected Overall row, found '{label}'"
        )));
    }

    expect_comment(lines, header)?;
    let mut by_type = Vec::new();
    while lines.peek().is_some_and(|l| !l.starts_with('#')) {
        let line = lines.next().expect("peeked");
        let (label, values) = split_values(line, names.len(), "type")?;
        let entity_type = EntityType::from_label(&label)
            .ok_or_else(|| Error::parse(format!("unknown entity type '{label}'")))?;
        by_type.push((entity_type, values));
    }

    expect_comment(lines, header)?;
    let mut by_category = Vec::new();
    while lines.peek().is_some_and(|l| !l.starts_with('#')) {
        let line = lines.next().expect("peeked");
        let (label, values) = split_values(line, names.len(), "category")?;
        let category = ArticleCategory::from_label(&label)
            .ok_or_else(|| Error::parse(format!("unknown category '{label}'")))?;
        by_category.push((category, values));
    }
    expect_comment(lines, header)?;

    Ok(RawSection {
        overall,
        by_type,
        by_category,
    })
}

fn expect_comment<'a>(lines: &mut impl Iterator<Item = &'a str>, header: &str) -> Result<()> {
    match lines.next() {
        Some(line) if line.starts_with('#') => Ok(()),
        _ => Err(Error::parse(format!(
            "malformed {header} section: missing comment row"
        ))),
    }
}
