use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShoplensError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] refinery::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Could not load page: {0}")]
    FetchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Summarizer not installed: {0}")]
    SummarizerNotInstalled(String),

    #[error("Summarizer failed: {0}")]
    SummarizerFailed(String),

    #[error("No products could be analyzed")]
    NoProducts,
}

impl ShoplensError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ShoplensError::HttpError(_) | ShoplensError::FetchError(_) => Some(
                "Check the URL and your connection, or save the page and pass the HTML file:\n  shoplens extract ./product.html"
            ),
            ShoplensError::SummarizerNotInstalled(_) => Some(
                "Install Claude CLI: curl -fsSL https://claude.ai/install.sh | bash\nOr skip summaries: shoplens compare <sources>... --no-ai"
            ),
            ShoplensError::SummarizerFailed(_) => Some(
                "Retry, or run without summaries: shoplens compare <sources>... --no-ai"
            ),
            ShoplensError::ConfigError(_) | ShoplensError::TomlError(_) => Some(
                "Check your configuration with `shoplens config`"
            ),
            ShoplensError::DatabaseError(_) | ShoplensError::StorageError(_) => Some(
                "Use --no-save to skip price history, or point SHOPLENS_DB at a writable file"
            ),
            ShoplensError::NoProducts => Some(
                "Make sure each source is a product page; run with --verbose to see why pages failed"
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShoplensError>;
