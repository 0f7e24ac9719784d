use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic bucket for a fragment, used for scoring priors and output ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Title,
    Price,
    Description,
    Reviews,
    Features,
    Specs,
    StructuredData,
    Meta,
    Semantic,
    General,
}

impl Category {
    /// Categories targeted by the site-pattern strategy
    pub const SITE_PATTERNS: [Category; 6] = [
        Category::Title,
        Category::Price,
        Category::Description,
        Category::Reviews,
        Category::Features,
        Category::Specs,
    ];

    /// Order in which category blocks appear in packed output
    pub const OUTPUT_ORDER: [Category; 10] = [
        Category::Title,
        Category::Price,
        Category::Description,
        Category::Features,
        Category::Reviews,
        Category::Specs,
        Category::StructuredData,
        Category::Meta,
        Category::Semantic,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Title => "title",
            Category::Price => "price",
            Category::Description => "description",
            Category::Reviews => "reviews",
            Category::Features => "features",
            Category::Specs => "specs",
            Category::StructuredData => "structured-data",
            Category::Meta => "meta",
            Category::Semantic => "semantic",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of extracted page text with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFragment {
    pub text: String,
    pub category: Category,
    /// Provenance label, e.g. `site:price` or `meta:og:title`
    pub source: String,
    /// Lowercase tag name of the source element, if any
    pub element: Option<String>,
    /// Strategy-intrinsic prior in [0, 1], fixed at creation
    pub confidence: f64,
}

impl ContentFragment {
    pub fn new(
        text: impl Into<String>,
        category: Category,
        source: impl Into<String>,
        element: Option<String>,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            category,
            source: source.into(),
            element,
            confidence,
        }
    }
}

/// A fragment plus its relevance score (may exceed 1.0 after boosts)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFragment {
    #[serde(flatten)]
    pub fragment: ContentFragment,
    pub score: f64,
}
