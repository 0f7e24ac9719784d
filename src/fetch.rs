use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info};
use ureq::ResponseExt;

use crate::error::{Result, ShoplensError};

/// Default HTTP request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; shoplens/0.1; product page analysis)";

/// Shared HTTP agent for connection pooling
static HTTP_AGENT: Lazy<ureq::Agent> = Lazy::new(|| {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
        .build()
        .into()
});

/// Where a product page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// http(s) URLs are fetched; `file://` URLs and anything else are read from disk
    pub fn parse(input: &str) -> Self {
        match url::Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Source::Url(url.to_string()),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Source::File(path),
                Err(_) => Source::File(PathBuf::from(input)),
            },
            _ => Source::File(PathBuf::from(input)),
        }
    }
}

/// Raw page ready for analysis
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Final URL after redirects, or the page's canonical URL for saved files
    pub url: String,
    /// Raw HTML content
    pub html: String,
}

/// Load a page from a URL or a saved HTML file
pub fn load(input: &str) -> Result<PageContent> {
    match Source::parse(input) {
        Source::Url(url) => fetch_http(&url),
        Source::File(path) => read_file(&path),
    }
}

/// Fetch using HTTP (ureq)
pub fn fetch_http(url: &str) -> Result<PageContent> {
    info!(url, "fetching page");
    let response = HTTP_AGENT.get(url).header("User-Agent", USER_AGENT).call()?;
    let final_url = response.get_uri().to_string();
    let html = response.into_body().read_to_string()?;
    debug!(url = %final_url, bytes = html.len(), "page fetched");

    Ok(PageContent {
        url: final_url,
        html,
    })
}

/// Read a saved HTML page. The URL is the page's canonical link when it has
/// one, so history for a saved copy lines up with the live page.
pub fn read_file(path: &Path) -> Result<PageContent> {
    let html = std::fs::read_to_string(path)
        .map_err(|e| ShoplensError::FetchError(format!("{}: {}", path.display(), e)))?;

    let url = match canonical_url(&html) {
        Some(url) => url,
        None => file_url(path)?,
    };
    debug!(path = %path.display(), url = %url, "page read from file");

    Ok(PageContent { url, html })
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    url::Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .map_err(|_| ShoplensError::FetchError(format!("invalid path: {}", path.display())))
}

/// `<link rel="canonical">` or `og:url`, when absolute http(s)
pub fn canonical_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let candidates = [
        (r#"link[rel="canonical"]"#, "href"),
        (r#"meta[property="og:url"]"#, "content"),
    ];

    candidates.iter().find_map(|(css, attr)| {
        let selector = Selector::parse(css).ok()?;
        let href = document.select(&selector).next()?.value().attr(attr)?;
        let url = url::Url::parse(href.trim()).ok()?;
        matches!(url.scheme(), "http" | "https").then(|| url.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://shop.example/item?id=3"),
            Source::Url("https://shop.example/item?id=3".to_string())
        );
        assert_eq!(
            Source::parse("./saved/page.html"),
            Source::File(PathBuf::from("./saved/page.html"))
        );
        assert_eq!(
            Source::parse("file:///tmp/page.html"),
            Source::File(PathBuf::from("/tmp/page.html"))
        );
    }

    #[test]
    fn test_canonical_url() {
        let html = r#"<html><head>
            <link rel="canonical" href="https://shop.example/kettle">
            <meta property="og:url" content="https://shop.example/other">
        </head></html>"#;
        assert_eq!(canonical_url(html), Some("https://shop.example/kettle".to_string()));

        let og_only = r#"<html><head><meta property="og:url" content="https://shop.example/og"></head></html>"#;
        assert_eq!(canonical_url(og_only), Some("https://shop.example/og".to_string()));

        let relative = r#"<html><head><link rel="canonical" href="/kettle"></head></html>"#;
        assert_eq!(canonical_url(relative), None);
    }

    #[test]
    fn test_read_file() {
        let path = std::env::temp_dir().join(format!("shoplens-fetch-{}.html", std::process::id()));
        std::fs::write(&path, "<html><body><h1>Saved</h1></body></html>").unwrap();

        let page = read_file(&path).unwrap();
        assert!(page.url.starts_with("file://"));
        assert!(page.html.contains("Saved"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_file(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(err, ShoplensError::FetchError(_)));
    }
}
