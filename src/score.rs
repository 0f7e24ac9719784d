//! Relevance scoring
//!
//! A fragment's score starts from its confidence and is multiplied through a
//! fixed sequence of steps. The order is pinned so results are reproducible
//! down to floating-point rounding.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{ExtractionConfig, KeywordBoosts};
use crate::fragment::{ContentFragment, ScoredFragment};
use crate::normalize::char_len;

/// Keyword families that hint at product-relevant text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordFamily {
    Price,
    Product,
    Review,
    Feature,
    Shipping,
    Availability,
    Warranty,
}

impl KeywordFamily {
    pub const ALL: [KeywordFamily; 7] = [
        KeywordFamily::Price,
        KeywordFamily::Product,
        KeywordFamily::Review,
        KeywordFamily::Feature,
        KeywordFamily::Shipping,
        KeywordFamily::Availability,
        KeywordFamily::Warranty,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            KeywordFamily::Price => &PRICE_RE,
            KeywordFamily::Product => &PRODUCT_RE,
            KeywordFamily::Review => &REVIEW_RE,
            KeywordFamily::Feature => &FEATURE_RE,
            KeywordFamily::Shipping => &SHIPPING_RE,
            KeywordFamily::Availability => &AVAILABILITY_RE,
            KeywordFamily::Warranty => &WARRANTY_RE,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex().is_match(text)
    }

    pub fn boost(&self, boosts: &KeywordBoosts) -> f64 {
        match self {
            KeywordFamily::Price => boosts.price,
            KeywordFamily::Product => boosts.product,
            KeywordFamily::Review => boosts.review,
            KeywordFamily::Feature => boosts.feature,
            KeywordFamily::Shipping => boosts.shipping,
            KeywordFamily::Availability => boosts.availability,
            KeywordFamily::Warranty => boosts.warranty,
        }
    }
}

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[$€£¥₹]\s*\d|\d+[.,]\d{2}\b|\bprice\b").expect("Invalid price keyword regex")
});

static PRODUCT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(product|model|brand|item|sku)\b").expect("Invalid product keyword regex")
});

static REVIEW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(reviews?|ratings?|stars?|rated)\b").expect("Invalid review keyword regex")
});

static FEATURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(features?|includes?|specifications?|dimensions|materials?)\b")
        .expect("Invalid feature keyword regex")
});

static SHIPPING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(shipping|delivery|ships|dispatch)\b").expect("Invalid shipping keyword regex")
});

static AVAILABILITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(in stock|out of stock|available|availability|sold out)\b")
        .expect("Invalid availability keyword regex")
});

static WARRANTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(warranty|guarantee|returns?)\b").expect("Invalid warranty keyword regex")
});

/// Navigation, footer, legal and cart-count text that carries no product information
static BOILERPLATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^\s*(home|cart|login|log in|sign in|sign up|register|account|my account|menu|search|wishlist|checkout)\s*$",
        r"(?i)^\W*((footer|main|site|navigation|nav|breadcrumbs?|skip to (main )?content)\W*)+$",
        r"(?i)\b(privacy policy|terms of (service|use)|cookie policy|all rights reserved)\b|copyright\s*©|©\s*\d{4}",
        r"(?i)\b\d+\s+items?\s+in\s+(your\s+)?(cart|bag|basket)\b|\bcart\s*\(\s*\d+\s*\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid boilerplate regex"))
    .collect()
});

/// Check whether text looks like site chrome rather than product content
pub fn is_boilerplate(text: &str) -> bool {
    BOILERPLATE_RES.iter().any(|re| re.is_match(text))
}

/// One multiplicative transform over the score accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStep {
    CategoryPrior,
    Keywords,
    ElementBoost,
    LengthPenalty,
    Boilerplate,
}

impl ScoreStep {
    /// Steps in the order they are applied
    pub const PIPELINE: [ScoreStep; 5] = [
        ScoreStep::CategoryPrior,
        ScoreStep::Keywords,
        ScoreStep::ElementBoost,
        ScoreStep::LengthPenalty,
        ScoreStep::Boilerplate,
    ];

    pub fn apply(&self, fragment: &ContentFragment, config: &ExtractionConfig, score: f64) -> f64 {
        match self {
            ScoreStep::CategoryPrior => {
                score * config.category_priors.for_category(fragment.category)
            }
            ScoreStep::Keywords => KeywordFamily::ALL
                .iter()
                .filter(|family| family.matches(&fragment.text))
                .fold(score, |acc, family| acc * family.boost(&config.keyword_boosts)),
            ScoreStep::ElementBoost => {
                let boost = fragment
                    .element
                    .as_ref()
                    .and_then(|tag| config.element_boosts.get(tag))
                    .copied()
                    .unwrap_or(1.0);
                score * boost
            }
            ScoreStep::LengthPenalty => {
                let len = char_len(&fragment.text);
                let mut score = score;
                // Independent checks: both fire if the thresholds ever overlap
                if len < config.short_text_threshold {
                    score *= config.short_text_penalty;
                }
                if len > config.long_text_threshold {
                    score *= config.long_text_penalty;
                }
                score
            }
            ScoreStep::Boilerplate => {
                if is_boilerplate(&fragment.text) {
                    score * config.boilerplate_penalty
                } else {
                    score
                }
            }
        }
    }
}

/// Score a single fragment
pub fn score_fragment(fragment: &ContentFragment, config: &ExtractionConfig) -> f64 {
    ScoreStep::PIPELINE
        .iter()
        .fold(fragment.confidence, |score, step| step.apply(fragment, config, score))
}

/// Score every fragment; a pure map
pub fn score_fragments(
    fragments: Vec<ContentFragment>,
    config: &ExtractionConfig,
) -> Vec<ScoredFragment> {
    fragments
        .into_iter()
        .map(|fragment| {
            let score = score_fragment(&fragment, config);
            ScoredFragment { fragment, score }
        })
        .collect()
}
