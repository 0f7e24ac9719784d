//! Candidate fragment extraction
//!
//! Three independent strategies run over the same parsed page and their
//! results are concatenated. Order carries no priority; the scorer decides
//! what matters.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::config::ExtractionConfig;
use crate::fragment::{Category, ContentFragment};
use crate::jsonld;
use crate::normalize::{char_len, normalize_text, take_chars};
use crate::page::{element_text, tag_name, Page};

/// Confidence of fragments matched by site-specific product selectors
pub const SITE_PATTERN_CONFIDENCE: f64 = 0.9;
/// Confidence of synthesized JSON-LD Product blocks
pub const JSON_LD_CONFIDENCE: f64 = 0.95;
/// Confidence of og:/twitter:/description meta content
pub const META_CONFIDENCE: f64 = 0.7;
/// Confidence of semantic container text
pub const SEMANTIC_CONFIDENCE: f64 = 0.6;
/// Confidence of generic fallback text
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Meta content must be longer than this to be kept
const MIN_META_LENGTH: usize = 20;
/// Semantic container text must fall strictly inside these bounds
const SEMANTIC_MIN_LENGTH: usize = 50;
const SEMANTIC_MAX_LENGTH: usize = 2000;
/// Fallback text must be longer than this
const FALLBACK_MIN_LENGTH: usize = 20;
/// Prefix length used by the fallback containment check
const FALLBACK_PREFIX_LENGTH: usize = 50;

const SEMANTIC_SELECTORS: &str =
    r#"article, main, section[class*="product"], div[class*="product-detail"]"#;
const FALLBACK_SELECTORS: &str = "p, h1, h2, h3, h4, h5, h6, li, td, span";

/// Common e-commerce markup conventions per category
pub fn site_selectors(category: Category) -> &'static [&'static str] {
    match category {
        Category::Title => &[
            r#"[class*="product-title"]"#,
            r#"[class*="product-name"]"#,
            r#"[class*="productTitle"]"#,
            r#"[id*="productTitle"]"#,
            r#"[data-testid*="title"]"#,
            r#"[itemprop="name"]"#,
            r#"h1[class*="title"]"#,
        ],
        Category::Price => &[
            r#"[class*="price"]"#,
            r#"[id*="price"]"#,
            r#"[itemprop="price"]"#,
            r#"[data-testid*="price"]"#,
            r#"[class*="cost"]"#,
        ],
        Category::Description => &[
            r#"[class*="description"]"#,
            r#"[id*="description"]"#,
            r#"[itemprop="description"]"#,
            r#"[class*="product-details"]"#,
            r#"[class*="product-info"]"#,
        ],
        Category::Reviews => &[
            r#"[class*="review"]"#,
            r#"[id*="review"]"#,
            r#"[class*="rating"]"#,
            r#"[itemprop="aggregateRating"]"#,
            r#"[data-testid*="review"]"#,
        ],
        Category::Features => &[
            r#"[class*="feature"]"#,
            r#"[id*="feature"]"#,
            r#"[class*="highlight"]"#,
            r#"[class*="benefit"]"#,
            r#"[class*="bullet"]"#,
        ],
        Category::Specs => &[
            r#"[class*="spec"]"#,
            r#"[id*="spec"]"#,
            r#"[class*="technical"]"#,
            r#"[class*="attribute"]"#,
            r#"table[class*="detail"]"#,
        ],
        _ => &[],
    }
}

/// Run every extraction strategy over a page
pub fn extract_fragments(page: &Page, config: &ExtractionConfig) -> Vec<ContentFragment> {
    let mut fragments = extract_site_patterns(page, config);
    fragments.extend(extract_structured(page));

    let fallback = extract_fallback(page, config, &fragments);
    fragments.extend(fallback);

    debug!(url = page.url(), count = fragments.len(), "extracted candidate fragments");
    fragments
}

/// Site-pattern strategy: fixed selector lists per product category
pub fn extract_site_patterns(page: &Page, config: &ExtractionConfig) -> Vec<ContentFragment> {
    let mut fragments = Vec::new();

    for category in Category::SITE_PATTERNS {
        // An element matched by several selectors counts once per category
        let mut seen = HashSet::new();

        for selector in site_selectors(category) {
            for element in page.select(selector) {
                if !seen.insert(element.id()) {
                    continue;
                }

                let text = element_text(element);
                if char_len(&text) > config.min_fragment_length {
                    fragments.push(ContentFragment::new(
                        text,
                        category,
                        format!("site:{}", category),
                        Some(tag_name(element)),
                        SITE_PATTERN_CONFIDENCE,
                    ));
                }
            }
        }
    }

    fragments
}

/// Structured-data strategy: JSON-LD products, meta tags, semantic containers
pub fn extract_structured(page: &Page) -> Vec<ContentFragment> {
    let mut fragments = extract_json_ld(page);
    fragments.extend(extract_meta(page));
    fragments.extend(extract_semantic(page));
    fragments
}

fn extract_json_ld(page: &Page) -> Vec<ContentFragment> {
    page.json_ld_scripts()
        .iter()
        .filter_map(|raw| jsonld::parse_script(raw))
        .flat_map(|json| {
            jsonld::product_nodes(&json)
                .into_iter()
                .filter_map(format_product_block)
                .collect::<Vec<_>>()
        })
        .map(|block| {
            ContentFragment::new(
                block,
                Category::StructuredData,
                "json-ld:product",
                Some("script".to_string()),
                JSON_LD_CONFIDENCE,
            )
        })
        .collect()
}

/// Assemble a multi-line text block from a JSON-LD Product, one line per present field
pub fn format_product_block(product: &Value) -> Option<String> {
    let mut lines = Vec::new();

    if let Some(name) = product.get("name").and_then(jsonld::scalar_text) {
        lines.push(format!("Product: {}", normalize_text(&name)));
    }

    if let Some(desc) = product.get("description").and_then(jsonld::scalar_text) {
        lines.push(format!("Description: {}", normalize_text(&desc)));
    }

    if let Some(offer) = jsonld::first_offer(product) {
        let price = offer
            .get("price")
            .or_else(|| offer.get("lowPrice"))
            .and_then(jsonld::scalar_text);
        if let Some(price) = price {
            match offer.get("priceCurrency").and_then(|c| c.as_str()) {
                Some(currency) => lines.push(format!("Price: {} {}", price, currency)),
                None => lines.push(format!("Price: {}", price)),
            }
        }
    }

    if let Some(brand) = jsonld::nested_name(product, "brand") {
        lines.push(format!("Brand: {}", brand));
    }

    if let Some(rating) = product.get("aggregateRating") {
        if let Some(value) = rating.get("ratingValue").and_then(jsonld::scalar_text) {
            lines.push(format!("Rating: {}/5", value));
        }
        let count = rating
            .get("reviewCount")
            .or_else(|| rating.get("ratingCount"))
            .and_then(jsonld::scalar_text);
        if let Some(count) = count {
            lines.push(format!("Reviews: {}", count));
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn extract_meta(page: &Page) -> Vec<ContentFragment> {
    page.meta_tags()
        .into_iter()
        .filter(|tag| {
            let key = tag.key.to_ascii_lowercase();
            key.starts_with("og:") || key.starts_with("twitter:") || key == "description"
        })
        .filter_map(|tag| {
            let content = normalize_text(&tag.content);
            (char_len(&content) > MIN_META_LENGTH).then(|| {
                ContentFragment::new(
                    content,
                    Category::Meta,
                    format!("meta:{}", tag.key),
                    Some("meta".to_string()),
                    META_CONFIDENCE,
                )
            })
        })
        .collect()
}

fn extract_semantic(page: &Page) -> Vec<ContentFragment> {
    page.select(SEMANTIC_SELECTORS)
        .into_iter()
        .filter_map(|element| {
            let text = element_text(element);
            let len = char_len(&text);
            (len > SEMANTIC_MIN_LENGTH && len < SEMANTIC_MAX_LENGTH).then(|| {
                ContentFragment::new(
                    text,
                    Category::Semantic,
                    "semantic",
                    Some(tag_name(element)),
                    SEMANTIC_CONFIDENCE,
                )
            })
        })
        .collect()
}

/// Fallback strategy: generic text elements not already covered by `collected`
pub fn extract_fallback(
    page: &Page,
    config: &ExtractionConfig,
    collected: &[ContentFragment],
) -> Vec<ContentFragment> {
    let mut fragments: Vec<ContentFragment> = Vec::new();

    for element in page.select(FALLBACK_SELECTORS) {
        let text = element_text(element);
        let len = char_len(&text);
        if len <= FALLBACK_MIN_LENGTH || len >= config.fallback_max_length {
            continue;
        }

        let prefix = take_chars(&text, FALLBACK_PREFIX_LENGTH);
        let duplicate = collected
            .iter()
            .chain(fragments.iter())
            .any(|existing| existing.text == text || existing.text.contains(prefix));
        if duplicate {
            continue;
        }

        fragments.push(ContentFragment::new(
            text,
            Category::General,
            "fallback",
            Some(tag_name(element)),
            FALLBACK_CONFIDENCE,
        ));
    }

    fragments
}
