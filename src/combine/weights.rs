//! Vote weights and article-category proportions for weighted combination.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::article::{Article, ArticleCategory};
use crate::error::{Error, Result};
use crate::mention::ProcessId;

/// Per-recognizer voting weights, kept per score name and article category.
///
/// Weights are produced by evaluating each recognizer on a training corpus
/// (the score values of a [`LilleMeasure`](crate::eval::LilleMeasure) run) and
/// persisted next to the combiner model; uniform weights serve as the
/// fallback when no evaluation data exists.
#[derive(Debug, Clone)]
pub struct VoteWeights {
    recognizers: Vec<ProcessId>,
    data: BTreeMap<ProcessId, BTreeMap<String, BTreeMap<ArticleCategory, f32>>>,
}

impl VoteWeights {
    /// Score name under which uniform weights are stored.
    pub const UNIFORM: &'static str = "Uniform";

    /// Build uniform weights (1.0 everywhere) for the given recognizers.
    #[must_use]
    pub fn uniform(recognizers: &[ProcessId]) -> Self {
        let mut data = BTreeMap::new();
        for recognizer in recognizers {
            let mut scores = BTreeMap::new();
            let per_category: BTreeMap<ArticleCategory, f32> =
                ArticleCategory::ALL.iter().map(|c| (*c, 1.0)).collect();
            scores.insert(Self::UNIFORM.to_string(), per_category);
            data.insert(recognizer.clone(), scores);
        }
        Self {
            recognizers: recognizers.to_vec(),
            data,
        }
    }

    /// The recognizers these weights describe, in their original order.
    #[must_use]
    pub fn recognizers(&self) -> &[ProcessId] {
        &self.recognizers
    }

    /// Record a weight for (recognizer, score name, category).
    pub fn set(
        &mut self,
        recognizer: &ProcessId,
        score: impl Into<String>,
        category: ArticleCategory,
        weight: f32,
    ) {
        if !self.recognizers.contains(recognizer) {
            self.recognizers.push(recognizer.clone());
        }
        self.data
            .entry(recognizer.clone())
            .or_default()
            .entry(score.into())
            .or_default()
            .insert(category, weight);
    }

    /// Record the same weight for (recognizer, score name) across all
    /// categories, for overall (non-category) scores.
    pub fn set_overall(&mut self, recognizer: &ProcessId, score: impl Into<String>, weight: f32) {
        let score = score.into();
        for category in ArticleCategory::ALL {
            self.set(recognizer, score.clone(), category, weight);
        }
    }

    /// The voting weight of `recognizer` for the given score name on
    /// `article`: the stored per-category weights modulated by the article's
    /// normalized category weights and summed over the article's categories.
    #[must_use]
    pub fn voting_weight(
        &self,
        article: &Article,
        recognizer: &ProcessId,
        score: &str,
        category_weights: &BTreeMap<ArticleCategory, f32>,
    ) -> f32 {
        let Some(per_score) = self.data.get(recognizer) else {
            warn!(%recognizer, "no vote weights for recognizer, using 0");
            return 0.0;
        };
        let Some(per_category) = per_score.get(score) else {
            warn!(%recognizer, score, "no vote weights for score, using 0");
            return 0.0;
        };
        article
            .categories
            .iter()
            .map(|category| {
                let modifier = category_weights.get(category).copied().unwrap_or(0.0);
                let base = per_category.get(category).copied().unwrap_or(0.0);
                modifier * base
            })
            .sum()
    }

    /// Write the weights to a tab-separated text file, one line per
    /// (recognizer, score, category) triple.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for recognizer in &self.recognizers {
            if let Some(per_score) = self.data.get(recognizer) {
                for (score, per_category) in per_score {
                    for (category, weight) in per_category {
                        out.push_str(&format!("{recognizer}\t{score}\t{category}\t{weight}\n"));
                    }
                }
            }
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Read weights from a tab-separated text file, validating that the
    /// described recognizers match the expected ones.
    pub fn read_from(path: &Path, recognizers: &[ProcessId]) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut result = Self {
            recognizers: recognizers.to_vec(),
            data: BTreeMap::new(),
        };
        for (number, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let [recognizer, score, category, weight] = fields.as_slice() else {
                return Err(Error::parse(format!(
                    "weights line {}: expected 4 fields, got {}",
                    number + 1,
                    fields.len()
                )));
            };
            let recognizer = ProcessId::new(*recognizer);
            if !recognizers.contains(&recognizer) {
                return Err(Error::parse(format!(
                    "weights line {}: unexpected recognizer '{recognizer}'",
                    number + 1
                )));
            }
            let category = ArticleCategory::from_label(category).ok_or_else(|| {
                Error::parse(format!("weights line {}: unknown category", number + 1))
            })?;
            let weight: f32 = weight.parse().map_err(|e| {
                Error::parse(format!("weights line {}: invalid weight: {e}", number + 1))
            })?;
            result
                .data
                .entry(recognizer)
                .or_default()
                .entry((*score).to_string())
                .or_default()
                .insert(category, weight);
        }
        Ok(result)
    }
}

/// How often each article category appears in the training corpus, among all
/// assigned categories. Categories are not mutually exclusive; the total over
/// all categories is 1.
#[derive(Debug, Clone)]
pub struct CategoryProportions {
    proportions: BTreeMap<ArticleCategory, f32>,
}

impl CategoryProportions {
    /// Uniform proportions over all categories.
    #[must_use]
    pub fn uniform() -> Self {
        let n = ArticleCategory::ALL.len() as f32;
        Self {
            proportions: ArticleCategory::ALL.iter().map(|c| (*c, 1.0 / n)).collect(),
        }
    }

    /// Proportions counted from a corpus of category assignments.
    #[must_use]
    pub fn from_corpus<'a>(articles: impl IntoIterator<Item = &'a Article>) -> Self {
        let mut counts: BTreeMap<ArticleCategory, u32> = BTreeMap::new();
        let mut total = 0u32;
        for article in articles {
            for category in &article.categories {
                *counts.entry(*category).or_insert(0) += 1;
                total += 1;
            }
        }
        let proportions = ArticleCategory::ALL
            .iter()
            .map(|c| {
                let count = counts.get(c).copied().unwrap_or(0);
                let p = if total == 0 {
                    0.0
                } else {
                    count as f32 / total as f32
                };
                (*c, p)
            })
            .collect();
        Self { proportions }
    }

    /// The stored proportion for a category.
    #[must_use]
    pub fn get(&self, category: ArticleCategory) -> f32 {
        self.proportions.get(&category).copied().unwrap_or(0.0)
    }

    /// The relative weight of each category of `article`, normalized so the
    /// article's categories sum to 1.
    #[must_use]
    pub fn category_weights(&self, article: &Article) -> BTreeMap<ArticleCategory, f32> {
        let total: f32 = article.categories.iter().map(|c| self.get(*c)).sum();
        article
            .categories
            .iter()
            .map(|c| {
                let weight = if total == 0.0 {
                    0.0
                } else {
                    self.get(*c) / total
                };
                (*c, weight)
            })
            .collect()
    }

    /// Write the proportions to a tab-separated text file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for (category, proportion) in &self.proportions {
            out.push_str(&format!("{category}\t{proportion}\n"));
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Read proportions from a tab-separated text file.
    pub fn read_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut proportions = BTreeMap::new();
        for (number, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (category, proportion) = line.split_once('\t').ok_or_else(|| {
                Error::parse(format!("proportions line {}: expected 2 fields", number + 1))
            })?;
            let category = ArticleCategory::from_label(category).ok_or_else(|| {
                Error::parse(format!("proportions line {}: unknown category", number + 1))
            })?;
            let proportion: f32 = proportion.parse().map_err(|e| {
                Error::parse(format!(
                    "proportions line {}: invalid proportion: {e}",
                    number + 1
                ))
            })?;
            proportions.insert(category, proportion);
        }
        Ok(Self { proportions })
    }
}
