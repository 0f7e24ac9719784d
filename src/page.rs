//! Page - a queryable view over a parsed product page
//!
//! Every extraction strategy reads the page through this type: element
//! selection by CSS selector, rendered text, tag names, JSON-LD scripts and
//! meta tags. Invalid selectors match nothing.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::normalize::normalize_text;

/// Elements whose text never reaches the rendered page
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A `<meta>` tag reduced to its key (`name` or `property`) and content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub key: String,
    pub content: String,
}

/// Parsed HTML document plus the URL it was loaded from
pub struct Page {
    url: String,
    document: Html,
}

impl Page {
    /// Parse an HTML document
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Select elements by CSS selector. An invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(e) => {
                debug!(selector = css, error = ?e, "skipping invalid selector");
                Vec::new()
            }
        }
    }

    /// First element matching a selector
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        self.select(css).into_iter().next()
    }

    /// Whole-document visible text, whitespace-normalized
    pub fn body_text(&self) -> String {
        let root = self
            .select_first("body")
            .unwrap_or_else(|| self.document.root_element());
        element_text(root)
    }

    /// Raw contents of every `application/ld+json` script
    pub fn json_ld_scripts(&self) -> Vec<String> {
        self.select(r#"script[type="application/ld+json"]"#)
            .into_iter()
            .map(|el| el.text().collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .collect()
    }

    /// All meta tags that carry a key and content
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        self.select("meta[name], meta[property]")
            .into_iter()
            .filter_map(|el| {
                let key = el
                    .value()
                    .attr("property")
                    .or_else(|| el.value().attr("name"))?;
                let content = el.value().attr("content")?;
                Some(MetaTag {
                    key: key.trim().to_string(),
                    content: content.to_string(),
                })
            })
            .collect()
    }

    /// Content of the first meta tag with the given key (case-insensitive)
    pub fn meta_content(&self, key: &str) -> Option<String> {
        self.meta_tags()
            .into_iter()
            .find(|tag| tag.key.eq_ignore_ascii_case(key))
            .map(|tag| normalize_text(&tag.content))
            .filter(|content| !content.is_empty())
    }

    /// Document `<title>`
    pub fn title(&self) -> Option<String> {
        self.select_first("title")
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }
}

/// Rendered text of an element, skipping script/style descendants, normalized
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| HIDDEN_TAGS.contains(&el.name()))
                    .unwrap_or(false)
            });
            if !hidden {
                parts.push(text);
            }
        }
    }
    normalize_text(&parts.join(" "))
}

/// Lowercase tag name of an element
pub fn tag_name(element: ElementRef<'_>) -> String {
    element.value().name().to_ascii_lowercase()
}

/// Value of an element's `content` attribute (microdata), falling back to its text
pub fn content_or_text(element: ElementRef<'_>) -> String {
    element
        .value()
        .attr("content")
        .map(normalize_text)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| element_text(element))
}
