//! Per-product analysis and the multi-product comparison loop
//!
//! Products are handled one at a time. A failure on one product (load,
//! summary) becomes a warning on the report; the rest still run.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, ExtractionConfig};
use crate::error::Result;
use crate::extract::extract_fragments;
use crate::fetch::{self, PageContent};
use crate::pack::{pack_fragments, PackedContent};
use crate::page::Page;
use crate::price_history::{PriceAlert, PriceHistoryTracker, PriceStore};
use crate::product::{parse_product, ProductRecord};
use crate::score::score_fragments;
use crate::summarize::{ProductSummary, Summarizer, DEFAULT_COMPARE_INSTRUCTIONS};
use crate::value::{value_rating, ValueLabel};

/// Everything derived from one page without touching storage or the network
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAnalysis {
    pub record: ProductRecord,
    pub packed: PackedContent,
    /// `packed` rendered to bounded text
    pub content: String,
    pub value_score: Option<f64>,
    pub value_label: Option<ValueLabel>,
    /// Fragments extracted before deduplication and packing
    pub fragment_count: usize,
}

pub fn analyze_page(content: &PageContent, config: &ExtractionConfig) -> ProductAnalysis {
    analyze_page_at(content, config, chrono::Utc::now().timestamp_millis())
}

/// Analyze with an explicit record timestamp (epoch ms)
pub fn analyze_page_at(content: &PageContent, config: &ExtractionConfig, now_ms: i64) -> ProductAnalysis {
    let page = Page::parse(&content.url, &content.html);

    let fragments = extract_fragments(&page, config);
    let fragment_count = fragments.len();
    let packed = pack_fragments(score_fragments(fragments, config), config);

    let record = parse_product(&page, now_ms);
    let rating = value_rating(Some(&record));

    ProductAnalysis {
        content: packed.render(),
        record,
        packed,
        value_score: rating.map(|(score, _)| score),
        value_label: rating.map(|(_, label)| label),
        fragment_count,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReport {
    /// Source as given (URL or file path)
    pub source: String,
    pub analysis: ProductAnalysis,
    pub price_alert: Option<PriceAlert>,
    pub summary: Option<String>,
}

impl ProductReport {
    fn to_summary(&self) -> Option<ProductSummary> {
        let summary = self.summary.clone()?;
        let record = &self.analysis.record;
        Some(ProductSummary {
            title: record.title.clone(),
            url: record.url.clone(),
            price: record.price_label(),
            rating: record.rating,
            review_count: record.review_count,
            value_score: self.analysis.value_score,
            summary,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonReport {
    pub products: Vec<ProductReport>,
    pub warnings: Vec<String>,
    pub comparison: Option<String>,
}

impl ComparisonReport {
    /// Best value product, ties going to the earlier source
    pub fn best_value(&self) -> Option<&ProductReport> {
        self.products
            .iter()
            .filter(|p| p.analysis.value_score.is_some())
            .fold(None, |best: Option<&ProductReport>, p| match best {
                Some(b) if b.analysis.value_score >= p.analysis.value_score => Some(b),
                _ => Some(p),
            })
    }
}

/// Sequential analyze → track → summarize loop over several sources
pub struct ComparisonRun<'a, S: PriceStore> {
    config: &'a Config,
    tracker: PriceHistoryTracker<S>,
    summarizer: Option<&'a dyn Summarizer>,
    on_chunk: Option<&'a dyn Fn(&str, &str)>,
    instructions: String,
}

impl<'a, S: PriceStore> ComparisonRun<'a, S> {
    pub fn new(config: &'a Config, store: S) -> Self {
        Self {
            config,
            tracker: PriceHistoryTracker::new(store, config.price_history.clone()),
            summarizer: None,
            on_chunk: None,
            instructions: DEFAULT_COMPARE_INSTRUCTIONS.to_string(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: &'a dyn Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Receive summary text as it streams in, tagged with its source
    pub fn with_chunk_handler(mut self, handler: &'a dyn Fn(&str, &str)) -> Self {
        self.on_chunk = Some(handler);
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Run over URLs or saved pages, loading each with [`fetch::load`]
    pub fn run(&self, sources: &[String]) -> ComparisonReport {
        self.run_with(sources, fetch::load)
    }

    /// Run with a custom page loader
    pub fn run_with<F>(&self, sources: &[String], load: F) -> ComparisonReport
    where
        F: Fn(&str) -> Result<PageContent>,
    {
        let mut report = ComparisonReport::default();

        for (i, source) in sources.iter().enumerate() {
            info!(source = %source, index = i + 1, total = sources.len(), "analyzing product");

            let content = match load(source) {
                Ok(content) => content,
                Err(e) => {
                    warn!(source = %source, error = %e, "could not load product page");
                    report.warnings.push(format!("{}: {}", source, e));
                    continue;
                }
            };

            let analysis = analyze_page(&content, &self.config.extraction);
            let price_alert = self.tracker.track(&analysis.record);

            let summary = self.summarizer.and_then(|summarizer| {
                let mut forward = |chunk: &str| {
                    if let Some(handler) = self.on_chunk {
                        handler(source, chunk);
                    }
                };
                match summarizer.summarize_streaming(&analysis.content, &mut forward) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        warn!(source = %source, error = %e, "could not summarize product");
                        report.warnings.push(format!("{}: {}", source, e));
                        None
                    }
                }
            });

            report.products.push(ProductReport {
                source: source.clone(),
                analysis,
                price_alert,
                summary,
            });
        }

        let comparison = self.compare(&mut report);
        report.comparison = comparison;
        report
    }

    fn compare(&self, report: &mut ComparisonReport) -> Option<String> {
        let summarizer = self.summarizer?;
        let summaries: Vec<ProductSummary> =
            report.products.iter().filter_map(ProductReport::to_summary).collect();
        if summaries.len() < 2 {
            return None;
        }

        match summarizer.compare(&summaries, &self.instructions) {
            Ok(comparison) => Some(comparison),
            Err(e) => {
                warn!(error = %e, "comparison failed");
                report.warnings.push(format!("comparison: {}", e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShoplensError;
    use crate::price_history::MemoryStore;
    use std::cell::RefCell;

    fn product_html(name: &str, price: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">
            {{"@type":"Product","name":"{}","offers":{{"price":"{}","priceCurrency":"USD"}},
              "aggregateRating":{{"ratingValue":"4.5","reviewCount":"200"}}}}
            </script></head><body>
            <h1 class="product-title">{}</h1>
            <p>A dependable everyday product with a two year warranty and free shipping.</p>
            </body></html>"#,
            name, price, name
        )
    }

    fn loader(source: &str) -> Result<PageContent> {
        match source {
            "kettle" => Ok(PageContent {
                url: "https://shop.example/kettle".into(),
                html: product_html("Kettle", "40.00"),
            }),
            "toaster" => Ok(PageContent {
                url: "https://shop.example/toaster".into(),
                html: product_html("Toaster", "900.00"),
            }),
            other => Err(ShoplensError::FetchError(format!("no such page: {}", other))),
        }
    }

    struct FakeSummarizer {
        fail_on: Option<&'static str>,
        compared: RefCell<Vec<String>>,
    }

    impl FakeSummarizer {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                fail_on,
                compared: RefCell::new(Vec::new()),
            }
        }
    }

    impl Summarizer for FakeSummarizer {
        fn summarize(&self, text: &str) -> Result<String> {
            match self.fail_on {
                Some(marker) if text.contains(marker) => {
                    Err(ShoplensError::SummarizerFailed("model busy".into()))
                }
                _ => Ok(format!("* {}", text.lines().next().unwrap_or_default())),
            }
        }

        fn compare(&self, products: &[ProductSummary], instructions: &str) -> Result<String> {
            self.compared
                .borrow_mut()
                .extend(products.iter().map(|p| p.title.clone()));
            Ok(format!("{} / {}", instructions, products.len()))
        }
    }

    #[test]
    fn test_analyze_page() {
        let content = loader("kettle").unwrap();
        let analysis = analyze_page_at(&content, &ExtractionConfig::default(), 42);

        assert_eq!(analysis.record.title, "Kettle");
        assert_eq!(analysis.record.price, Some(40.0));
        assert_eq!(analysis.record.timestamp, 42);
        assert!(analysis.fragment_count > 0);
        assert!(analysis.content.contains("Kettle"));
        assert_eq!(analysis.value_label, Some(ValueLabel::Excellent));
    }

    #[test]
    fn test_run_without_summarizer() {
        let config = Config::default();
        let run = ComparisonRun::new(&config, MemoryStore::new());
        let sources = vec!["kettle".to_string(), "missing".to_string(), "toaster".to_string()];

        let report = run.run_with(&sources, loader);
        assert_eq!(report.products.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("missing:"));
        assert!(report.comparison.is_none());
        assert_eq!(report.best_value().unwrap().analysis.record.title, "Kettle");
    }

    #[test]
    fn test_run_with_summarizer_compares() {
        let config = Config::default();
        let summarizer = FakeSummarizer::new(None);
        let run = ComparisonRun::new(&config, MemoryStore::new())
            .with_summarizer(&summarizer)
            .with_instructions("Pick one");
        let sources = vec!["kettle".to_string(), "toaster".to_string()];

        let report = run.run_with(&sources, loader);
        assert!(report.warnings.is_empty());
        assert!(report.products.iter().all(|p| p.summary.is_some()));
        assert_eq!(report.comparison.as_deref(), Some("Pick one / 2"));
        assert_eq!(*summarizer.compared.borrow(), vec!["Kettle", "Toaster"]);
    }

    #[test]
    fn test_summary_chunks_reach_handler() {
        let config = Config::default();
        let summarizer = FakeSummarizer::new(Some("Toaster"));
        let seen = RefCell::new(Vec::new());
        let handler = |source: &str, chunk: &str| {
            seen.borrow_mut().push((source.to_string(), chunk.to_string()));
        };
        let run = ComparisonRun::new(&config, MemoryStore::new())
            .with_summarizer(&summarizer)
            .with_chunk_handler(&handler);
        let sources = vec!["kettle".to_string(), "toaster".to_string()];

        let report = run.run_with(&sources, loader);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "kettle");
        assert_eq!(Some(&seen[0].1), report.products[0].summary.as_ref());
    }

    #[test]
    fn test_summary_failure_is_isolated() {
        let config = Config::default();
        let summarizer = FakeSummarizer::new(Some("Kettle"));
        let run = ComparisonRun::new(&config, MemoryStore::new()).with_summarizer(&summarizer);
        let sources = vec!["kettle".to_string(), "toaster".to_string()];

        let report = run.run_with(&sources, loader);
        assert_eq!(report.products.len(), 2);
        assert!(report.products[0].summary.is_none());
        assert!(report.products[1].summary.is_some());
        assert_eq!(report.warnings.len(), 1);
        // only one summary, nothing to compare
        assert!(report.comparison.is_none());
    }

    #[test]
    fn test_repeat_run_tracks_price() {
        let config = Config::default();
        let store = MemoryStore::new();
        let sources = vec!["kettle".to_string()];

        let first = ComparisonRun::new(&config, &store).run_with(&sources, loader);
        assert!(first.products[0].price_alert.is_none());

        let cheaper = |_: &str| -> Result<PageContent> {
            Ok(PageContent {
                url: "https://shop.example/kettle".into(),
                html: product_html("Kettle", "30.00"),
            })
        };
        let second = ComparisonRun::new(&config, &store).run_with(&sources, cheaper);
        let alert = second.products[0].price_alert.as_ref().unwrap();
        assert_eq!(alert.percent_label(), "25.0%");
    }
}
