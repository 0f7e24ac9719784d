//! Structured product fields: title, price, currency, rating, review count
//!
//! Each field is read through the same fallback chain: JSON-LD Product data,
//! then (title only) `og:title`, then common CSS selectors, then a regex scan
//! of the visible page text. A field nobody can find is `None`, never an error.

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jsonld;
use crate::page::{content_or_text, Page};

/// Currency used when nothing on the page names one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Prices must be strictly between zero and this
const MAX_PRICE: f64 = 10_000_000.0;
const MAX_RATING: f64 = 5.0;

const TITLE_SELECTORS: &[&str] = &[
    r#"h1[class*="title"]"#,
    r#"[class*="product-title"]"#,
    r#"[class*="product-name"]"#,
    "#productTitle",
    r#"[itemprop="name"]"#,
    "h1",
];

const PRICE_SELECTORS: &[&str] = &[
    r#"[itemprop="price"]"#,
    ".a-price .a-offscreen",
    "#priceblock_ourprice",
    "[data-price]",
    ".price",
    r#"[class*="price"]"#,
];

const CURRENCY_SELECTORS: &[&str] = &[r#"[itemprop="priceCurrency"]"#];

const CURRENCY_META_KEYS: &[&str] = &["product:price:currency", "og:price:currency"];

const RATING_SELECTORS: &[&str] = &[
    r#"[itemprop="ratingValue"]"#,
    r#"[class*="rating-value"]"#,
    r#"[class*="average-rating"]"#,
    "[data-rating]",
    r#"[class*="rating"]"#,
];

const REVIEW_COUNT_SELECTORS: &[&str] = &[
    r#"[itemprop="reviewCount"]"#,
    r#"[itemprop="ratingCount"]"#,
    r#"[class*="review-count"]"#,
    r#"[class*="reviews-count"]"#,
    r#"[class*="ratings-count"]"#,
    r#"[class*="review-total"]"#,
];

/// Currency symbols in detection priority order
const CURRENCY_SYMBOLS: &[(char, &str)] = &[
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
    ('₹', "INR"),
];

// Number with optional thousands separators and decimals
const NUM: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

static PRICE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"[$€£¥₹]\s?{}", NUM),
        format!(r"{}\s?(?:[$€£¥₹]|USD|EUR|GBP|JPY|INR)", NUM),
        format!(r"(?i)(?:price|cost)\s*:?\s*[$€£¥₹]?\s*{}", NUM),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid price regex"))
    .collect()
});

static RATING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+(?:\.\d+)?)\s*out\s+of\s+5\b",
        r"(?i)(\d+(?:\.\d+)?)\s*stars?\b",
        r"(?i)rating\s*:?\s*(\d+(?:\.\d+)?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid rating regex"))
    .collect()
});

static REVIEW_COUNT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\((\d[\d,]*)\s*(?:reviews?|ratings?)\)",
        r"(?i)(\d[\d,]*)\s+(?:customer\s+)?(?:reviews?|ratings?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid review count regex"))
    .collect()
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(NUM).expect("Invalid number regex"));

/// Snapshot of a product page's key fields, produced once per extraction pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub url: String,
    pub title: String,
    pub price: Option<f64>,
    /// 0–5 scale
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    /// ISO 4217-like code
    pub currency: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ProductRecord {
    /// Price formatted with its currency, e.g. "129.00 USD"
    pub fn price_label(&self) -> Option<String> {
        self.price.map(|p| format!("{:.2} {}", p, self.currency))
    }
}

/// Lazily shared inputs for the field extractors
struct Sources<'a> {
    page: &'a Page,
    json_ld: Vec<Value>,
    body: OnceCell<String>,
}

impl<'a> Sources<'a> {
    fn new(page: &'a Page) -> Self {
        let json_ld = page
            .json_ld_scripts()
            .iter()
            .filter_map(|raw| jsonld::parse_script(raw))
            .collect();
        Self {
            page,
            json_ld,
            body: OnceCell::new(),
        }
    }

    fn body(&self) -> &str {
        self.body.get_or_init(|| self.page.body_text())
    }

    /// First value `read` yields from any JSON-LD Product, scripts in page order
    fn from_products<T>(&self, read: impl Fn(&Value) -> Option<T>) -> Option<T> {
        self.json_ld
            .iter()
            .flat_map(jsonld::product_nodes)
            .find_map(read)
    }

    /// First value `read` yields from any element matching the selectors, in order
    fn from_selectors<T>(&self, selectors: &[&str], read: impl Fn(&str) -> Option<T>) -> Option<T> {
        selectors.iter().find_map(|selector| {
            self.page
                .select(selector)
                .into_iter()
                .next()
                .and_then(|el| read(&content_or_text(el)))
        })
    }
}

/// Derive the full product record for a page
pub fn parse_product(page: &Page, timestamp: i64) -> ProductRecord {
    let sources = Sources::new(page);
    ProductRecord {
        url: page.url().to_string(),
        title: title_from(&sources).unwrap_or_else(|| "Unknown Product".to_string()),
        price: price_from(&sources),
        rating: rating_from(&sources),
        review_count: review_count_from(&sources),
        currency: currency_from(&sources),
        timestamp,
    }
}

pub fn extract_title(page: &Page) -> Option<String> {
    title_from(&Sources::new(page))
}

pub fn extract_price(page: &Page) -> Option<f64> {
    price_from(&Sources::new(page))
}

pub fn extract_currency(page: &Page) -> String {
    currency_from(&Sources::new(page))
}

pub fn extract_rating(page: &Page) -> Option<f64> {
    rating_from(&Sources::new(page))
}

pub fn extract_review_count(page: &Page) -> Option<u64> {
    review_count_from(&Sources::new(page))
}

fn title_from(sources: &Sources) -> Option<String> {
    sources
        .from_products(|product| product.get("name").and_then(jsonld::scalar_text))
        .or_else(|| sources.page.meta_content("og:title"))
        .or_else(|| {
            sources.from_selectors(TITLE_SELECTORS, |text| {
                (!text.is_empty()).then(|| text.to_string())
            })
        })
        .or_else(|| sources.page.title())
}

fn price_from(sources: &Sources) -> Option<f64> {
    sources
        .from_products(|product| {
            let offer = jsonld::first_offer(product)?;
            offer
                .get("price")
                .or_else(|| offer.get("lowPrice"))
                .and_then(jsonld::scalar_f64)
                .filter(|p| valid_price(*p))
        })
        .or_else(|| sources.from_selectors(PRICE_SELECTORS, parse_price_value))
        .or_else(|| parse_price(sources.body()))
}

fn currency_from(sources: &Sources) -> String {
    sources
        .from_products(|product| {
            jsonld::first_offer(product)?
                .get("priceCurrency")
                .and_then(|c| c.as_str())
                .and_then(currency_code)
        })
        .or_else(|| sources.from_selectors(CURRENCY_SELECTORS, currency_code))
        .or_else(|| {
            CURRENCY_META_KEYS
                .iter()
                .find_map(|key| sources.page.meta_content(key).as_deref().and_then(currency_code))
        })
        .or_else(|| detect_currency(sources.body()).map(String::from))
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

fn rating_from(sources: &Sources) -> Option<f64> {
    sources
        .from_products(|product| {
            let aggregate = product.get("aggregateRating")?;
            let value = aggregate.get("ratingValue").and_then(jsonld::scalar_f64)?;
            let best = aggregate.get("bestRating").and_then(jsonld::scalar_f64);
            let rating = match best {
                Some(best) if best > 0.0 && (best - MAX_RATING).abs() > f64::EPSILON => {
                    value * MAX_RATING / best
                }
                _ => value,
            };
            valid_rating(rating).then_some(rating)
        })
        .or_else(|| {
            sources.from_selectors(RATING_SELECTORS, |text| {
                parse_rating(text).or_else(|| first_number(text).filter(|r| valid_rating(*r)))
            })
        })
        .or_else(|| parse_rating(sources.body()))
}

fn review_count_from(sources: &Sources) -> Option<u64> {
    sources
        .from_products(|product| {
            let aggregate = product.get("aggregateRating")?;
            aggregate
                .get("reviewCount")
                .or_else(|| aggregate.get("ratingCount"))
                .and_then(jsonld::scalar_u64)
        })
        .or_else(|| {
            sources.from_selectors(REVIEW_COUNT_SELECTORS, |text| {
                parse_review_count(text)
                    .or_else(|| first_number(text).map(|n| n as u64).filter(|n| *n > 0))
            })
        })
        .or_else(|| parse_review_count(sources.body()))
}

fn valid_price(price: f64) -> bool {
    price > 0.0 && price < MAX_PRICE
}

fn valid_rating(rating: f64) -> bool {
    (0.0..=MAX_RATING).contains(&rating)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// First plain number in text, thousands separators stripped
fn first_number(text: &str) -> Option<f64> {
    NUMBER_RE.find(text).and_then(|m| parse_number(m.as_str()))
}

/// Price from an element known to hold a price; a bare number is accepted
fn parse_price_value(text: &str) -> Option<f64> {
    parse_price(text).or_else(|| first_number(text).filter(|p| valid_price(*p)))
}

/// Scan free text for a price: symbol-prefixed, symbol-suffixed, or "price:"/"cost:"
/// labelled. The first match in range (0, 10,000,000) wins.
pub fn parse_price(text: &str) -> Option<f64> {
    PRICE_RES.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1).and_then(|m| parse_number(m.as_str())))
            .find(|p| valid_price(*p))
    })
}

/// Scan free text for "X out of 5", "X stars" or "rating: X", accepting [0, 5]
pub fn parse_rating(text: &str) -> Option<f64> {
    RATING_RES.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()))
            .find(|r| valid_rating(*r))
    })
}

/// Scan free text for "(N reviews)" or "N reviews/ratings", accepting positive counts
pub fn parse_review_count(text: &str) -> Option<u64> {
    REVIEW_COUNT_RES.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok()))
            .find(|n| *n > 0)
    })
}

/// Currency implied by the first symbol present, checked $ → € → £ → ¥ → ₹
pub fn detect_currency(text: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(symbol, _)| text.contains(*symbol))
        .map(|(_, code)| *code)
}

/// Normalize a three-letter currency code
fn currency_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| code.to_ascii_uppercase())
}
