use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, ShoplensError};
use crate::fragment::Category;

/// Global shoplens configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size limits and scoring policy for content extraction
    pub extraction: ExtractionConfig,

    /// Price alert thresholds and retention
    pub price_history: PriceHistoryConfig,

    /// External summarization service
    pub summarizer: SummarizerConfig,
}

/// Extraction, scoring and packing policy.
///
/// Loaded once and passed by reference into every core function; nothing
/// mutates it after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Budget for the packed output, in characters
    pub max_content_length: usize,
    /// Maximum length of a single packed section
    pub max_section_length: usize,
    /// Site-pattern fragments must be longer than this
    pub min_fragment_length: usize,
    /// Fallback fragments must be shorter than this
    pub fallback_max_length: usize,
    /// Cut at the last sentence end when truncating, if it is late enough
    pub prefer_sentence_boundary: bool,
    /// A sentence cut must land after this fraction of the section limit
    pub sentence_cut_ratio: f64,
    /// A word cut must land after this fraction of the section limit
    pub word_cut_ratio: f64,
    /// Minimum remaining budget for a trailing partial section
    pub min_tail_budget: usize,
    /// Prefix length of the near-duplicate key
    pub dedup_key_length: usize,

    pub category_priors: CategoryPriors,
    pub keyword_boosts: KeywordBoosts,
    /// Multiplier per source tag name (h1, h2, ...)
    pub element_boosts: HashMap<String, f64>,

    pub short_text_threshold: usize,
    pub short_text_penalty: f64,
    pub long_text_threshold: usize,
    pub long_text_penalty: f64,
    pub boilerplate_penalty: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let element_boosts = [("h1", 1.3), ("h2", 1.2), ("h3", 1.1)]
            .into_iter()
            .map(|(tag, boost)| (tag.to_string(), boost))
            .collect();

        Self {
            max_content_length: 8000,
            max_section_length: 1500,
            min_fragment_length: 10,
            fallback_max_length: 500,
            prefer_sentence_boundary: true,
            sentence_cut_ratio: 0.7,
            word_cut_ratio: 0.8,
            min_tail_budget: 100,
            dedup_key_length: 100,
            category_priors: CategoryPriors::default(),
            keyword_boosts: KeywordBoosts::default(),
            element_boosts,
            short_text_threshold: 30,
            short_text_penalty: 0.5,
            long_text_threshold: 1000,
            long_text_penalty: 0.7,
            boilerplate_penalty: 0.3,
        }
    }
}

/// Score multiplier per category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPriors {
    pub title: f64,
    pub price: f64,
    pub structured_data: f64,
    pub description: f64,
    pub reviews: f64,
    pub features: f64,
    pub meta: f64,
    pub specs: f64,
    pub semantic: f64,
    pub general: f64,
}

impl Default for CategoryPriors {
    fn default() -> Self {
        Self {
            title: 3.0,
            price: 2.5,
            structured_data: 2.2,
            description: 2.0,
            reviews: 1.8,
            features: 1.5,
            meta: 1.4,
            specs: 1.3,
            semantic: 1.1,
            general: 1.0,
        }
    }
}

impl CategoryPriors {
    pub fn for_category(&self, category: Category) -> f64 {
        match category {
            Category::Title => self.title,
            Category::Price => self.price,
            Category::StructuredData => self.structured_data,
            Category::Description => self.description,
            Category::Reviews => self.reviews,
            Category::Features => self.features,
            Category::Meta => self.meta,
            Category::Specs => self.specs,
            Category::Semantic => self.semantic,
            Category::General => self.general,
        }
    }
}

/// Score multiplier per keyword family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordBoosts {
    pub price: f64,
    pub product: f64,
    pub review: f64,
    pub feature: f64,
    pub shipping: f64,
    pub availability: f64,
    pub warranty: f64,
}

impl Default for KeywordBoosts {
    fn default() -> Self {
        Self {
            price: 1.2,
            product: 1.2,
            review: 1.2,
            feature: 1.2,
            shipping: 1.2,
            availability: 1.2,
            warranty: 1.2,
        }
    }
}

/// Price change detection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceHistoryConfig {
    /// Relative change (in percent) that triggers a drop or increase alert
    pub alert_threshold_percent: f64,
    /// Observations older than this are pruned on every write
    pub retention_days: i64,
}

impl Default for PriceHistoryConfig {
    fn default() -> Self {
        Self {
            alert_threshold_percent: 10.0,
            retention_days: 30,
        }
    }
}

/// External summarization service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub enabled: bool,
    /// Executable invoked for summaries
    pub command: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "claude".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ShoplensError::ConfigError(e.to_string()))
    }

    /// Get the config file path
    ///
    /// Supports SHOPLENS_CONFIG environment variable
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SHOPLENS_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "shoplens").ok_or_else(|| {
            ShoplensError::ConfigError("Could not determine config directory".into())
        })?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "shoplens").ok_or_else(|| {
            ShoplensError::ConfigError("Could not determine data directory".into())
        })?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the database path
    ///
    /// Supports SHOPLENS_DB environment variable for test isolation
    pub fn db_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SHOPLENS_DB") {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::data_dir()?.join("shoplens.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.extraction.max_content_length, 8000);
        assert_eq!(config.extraction.max_section_length, 1500);
        assert_eq!(config.extraction.element_boosts.get("h1"), Some(&1.3));
        assert_eq!(config.price_history.retention_days, 30);
        assert!(config.summarizer.enabled);
    }

    #[test]
    fn test_category_priors() {
        let priors = CategoryPriors::default();
        assert_eq!(priors.for_category(Category::Title), 3.0);
        assert_eq!(priors.for_category(Category::StructuredData), 2.2);
        assert_eq!(priors.for_category(Category::General), 1.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [extraction]
            max_content_length = 4000

            [extraction.category_priors]
            title = 5.0

            [summarizer]
            enabled = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.extraction.max_content_length, 4000);
        assert_eq!(config.extraction.max_section_length, 1500);
        assert_eq!(config.extraction.category_priors.title, 5.0);
        assert_eq!(config.extraction.category_priors.price, 2.5);
        assert_eq!(config.extraction.keyword_boosts.warranty, 1.2);
        assert!(!config.summarizer.enabled);
        assert_eq!(config.summarizer.command, "claude");
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.extraction.dedup_key_length, 100);
    }
}
