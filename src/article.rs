//! Articles: the documents processed by recognizers and combiners.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Thematic category of an article. Weighted combiners use categories to
/// modulate per-recognizer vote weights; the set is closed so that category
/// one-hot blocks in feature vectors have a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArticleCategory {
    /// Academia and education
    Academia,
    /// Architecture
    Architecture,
    /// Arts
    Art,
    /// Business and economy
    Business,
    /// Law and justice
    Law,
    /// Medicine
    Medicine,
    /// Press and media
    Media,
    /// Military
    Military,
    /// Politics
    Politics,
    /// Religion
    Religion,
    /// Sport
    Sport,
    /// Anything else
    Other,
}

impl ArticleCategory {
    /// All categories, in canonical order.
    pub const ALL: [ArticleCategory; 12] = [
        ArticleCategory::Academia,
        ArticleCategory::Architecture,
        ArticleCategory::Art,
        ArticleCategory::Business,
        ArticleCategory::Law,
        ArticleCategory::Medicine,
        ArticleCategory::Media,
        ArticleCategory::Military,
        ArticleCategory::Politics,
        ArticleCategory::Religion,
        ArticleCategory::Sport,
        ArticleCategory::Other,
    ];

    /// Convert to the canonical label string.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            ArticleCategory::Academia => "ACADEMIA",
            ArticleCategory::Architecture => "ARCHITECTURE",
            ArticleCategory::Art => "ART",
            ArticleCategory::Business => "BUSINESS",
            ArticleCategory::Law => "LAW",
            ArticleCategory::Medicine => "MEDICINE",
            ArticleCategory::Media => "MEDIA",
            ArticleCategory::Military => "MILITARY",
            ArticleCategory::Politics => "POLITICS",
            ArticleCategory::Religion => "RELIGION",
            ArticleCategory::Sport => "SPORT",
            ArticleCategory::Other => "OTHER",
        }
    }

    /// Parse from a label string.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_uppercase().as_str() {
            "ACADEMIA" => Some(ArticleCategory::Academia),
            "ARCHITECTURE" => Some(ArticleCategory::Architecture),
            "ART" => Some(ArticleCategory::Art),
            "BUSINESS" => Some(ArticleCategory::Business),
            "LAW" => Some(ArticleCategory::Law),
            "MEDICINE" => Some(ArticleCategory::Medicine),
            "MEDIA" => Some(ArticleCategory::Media),
            "MILITARY" => Some(ArticleCategory::Military),
            "POLITICS" => Some(ArticleCategory::Politics),
            "RELIGION" => Some(ArticleCategory::Religion),
            "SPORT" => Some(ArticleCategory::Sport),
            "OTHER" => Some(ArticleCategory::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// A document to process: raw text plus the metadata the engines consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Stable article name (also the result folder name)
    pub name: String,
    /// Raw text content
    pub text: String,
    /// Language hint (ISO 639-1 code, e.g. "en"), if known
    pub language: Option<String>,
    /// Thematic categories (not mutually exclusive)
    pub categories: Vec<ArticleCategory>,
}

impl Article {
    /// Create an article with no language hint and no categories.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            language: None,
            categories: Vec::new(),
        }
    }

    /// Set the language hint (builder style).
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the categories (builder style).
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<ArticleCategory>) -> Self {
        self.categories = categories;
        self
    }
}
