use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SummarizerConfig;
use crate::error::{Result, ShoplensError};

/// Shared context given to the summarizer for every request
pub const SHOPPING_ASSISTANT_CONTEXT: &str = "You are an e-commerce shopping assistant. You write complete and concise summaries of products, their reviews and pricing. Your goal is to guide users to the products that give them the most value for their money. Be efficient and professional. Do not make things up.";

/// Instructions used when the user gives none
pub const DEFAULT_COMPARE_INSTRUCTIONS: &str = "Compare these products and recommend the one that gives the most value for the money. Briefly explain the trade-offs between them.";

const SUMMARY_PROMPT: &str = r#"Summarize this product page for a shopper.

Cover what the product is, its key features, its price, and what reviewers say.
Reply with 3 to 6 short bullet points, one per line, each starting with "* ".

=== PAGE CONTENT ===
{{content}}
"#;

const COMPARE_PROMPT: &str = r#"{{instructions}}

=== PRODUCTS ({{count}}) ===
{{products}}
"#;

static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[*\-•]+\s*").expect("Invalid bullet regex"));

/// Per-product input to a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub title: String,
    pub url: String,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub value_score: Option<f64>,
    pub summary: String,
}

/// Text summarization and comparison service
pub trait Summarizer {
    /// Summarize packed page content
    fn summarize(&self, text: &str) -> Result<String>;

    /// Summarize, handing text to `on_chunk` as it arrives. Returns the full summary.
    fn summarize_streaming(&self, text: &str, on_chunk: &mut dyn FnMut(&str)) -> Result<String> {
        let summary = self.summarize(text)?;
        on_chunk(&summary);
        Ok(summary)
    }

    /// Write a comparison narrative across several summarized products
    fn compare(&self, products: &[ProductSummary], instructions: &str) -> Result<String>;
}

/// Summarizer backed by the Claude CLI
#[derive(Debug, Clone)]
pub struct ClaudeSummarizer {
    command: String,
}

impl Default for ClaudeSummarizer {
    fn default() -> Self {
        Self::from_config(&SummarizerConfig::default())
    }
}

impl ClaudeSummarizer {
    pub fn from_config(config: &SummarizerConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }

    /// Check that the CLI is installed and runs
    pub fn check_available(&self) -> Result<()> {
        let output = Command::new(&self.command).arg("--version").output();

        match output {
            Ok(o) if o.status.success() => Ok(()),
            _ => Err(ShoplensError::SummarizerNotInstalled(format!(
                "`{}` was not found or failed to run",
                self.command
            ))),
        }
    }

    /// CLI version string, if available
    pub fn version(&self) -> Option<String> {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    }

    fn run(&self, prompt: &str) -> Result<String> {
        debug!(command = %self.command, prompt_chars = prompt.chars().count(), "calling summarizer");

        let output = Command::new(&self.command)
            .args([
                "-p",
                "--output-format", "json",
                "--max-turns", "1",
                "--system-prompt", SHOPPING_ASSISTANT_CONTEXT,
                prompt,
            ])
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ShoplensError::SummarizerNotInstalled(format!("`{}` not found", self.command))
                }
                _ => ShoplensError::IoError(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShoplensError::SummarizerFailed(stderr.trim().to_string()));
        }

        parse_cli_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Summarizer for ClaudeSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        self.run(&build_summary_prompt(text))
    }

    fn compare(&self, products: &[ProductSummary], instructions: &str) -> Result<String> {
        self.run(&build_compare_prompt(products, instructions)?)
    }
}

/// Pull the `result` text out of the CLI's JSON envelope
pub fn parse_cli_output(stdout: &str) -> Result<String> {
    let response: serde_json::Value = serde_json::from_str(stdout.trim())?;
    response["result"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ShoplensError::SummarizerFailed("No result in response".into()))
}

pub fn build_summary_prompt(content: &str) -> String {
    SUMMARY_PROMPT.replace("{{content}}", content)
}

pub fn build_compare_prompt(products: &[ProductSummary], instructions: &str) -> Result<String> {
    let instructions = if instructions.trim().is_empty() {
        DEFAULT_COMPARE_INSTRUCTIONS
    } else {
        instructions.trim()
    };
    let products_json = serde_json::to_string_pretty(products)?;

    Ok(COMPARE_PROMPT
        .replace("{{instructions}}", instructions)
        .replace("{{count}}", &products.len().to_string())
        .replace("{{products}}", &products_json))
}

/// Split a summary into display lines, dropping list markers and blanks
pub fn summary_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| BULLET_RE.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str) -> ProductSummary {
        ProductSummary {
            title: title.to_string(),
            url: format!("https://shop.example/{}", title.to_lowercase()),
            price: Some("49.00 USD".to_string()),
            rating: Some(4.5),
            review_count: Some(120),
            value_score: Some(8.1),
            summary: "* Solid build".to_string(),
        }
    }

    #[test]
    fn test_parse_cli_output() {
        let out = r#"{"type":"result","result":"  * Light\n* Cheap  "}"#;
        assert_eq!(parse_cli_output(out).unwrap(), "* Light\n* Cheap");

        let err = parse_cli_output(r#"{"type":"result"}"#).unwrap_err();
        assert!(matches!(err, ShoplensError::SummarizerFailed(_)));

        assert!(matches!(parse_cli_output("not json"), Err(ShoplensError::JsonError(_))));
    }

    #[test]
    fn test_summary_prompt_includes_content() {
        let prompt = build_summary_prompt("Trail Runner 3\n\nPrice: 129.00 USD");
        assert!(prompt.contains("Trail Runner 3"));
        assert!(!prompt.contains("{{content}}"));
    }

    #[test]
    fn test_compare_prompt() {
        let products = vec![summary("Kettle"), summary("Toaster")];
        let prompt = build_compare_prompt(&products, "  Which is quieter?  ").unwrap();
        assert!(prompt.starts_with("Which is quieter?"));
        assert!(prompt.contains("=== PRODUCTS (2) ==="));
        assert!(prompt.contains("\"valueScore\": 8.1"));

        let default = build_compare_prompt(&products, "").unwrap();
        assert!(default.starts_with(DEFAULT_COMPARE_INSTRUCTIONS));
    }

    #[test]
    fn test_summary_lines() {
        let text = "* Light frame\n-  Waterproof\n\n• Two-year warranty\nPlain line";
        assert_eq!(
            summary_lines(text),
            vec!["Light frame", "Waterproof", "Two-year warranty", "Plain line"]
        );
    }

    #[test]
    fn test_streaming_default_emits_once() {
        struct Echo;
        impl Summarizer for Echo {
            fn summarize(&self, text: &str) -> Result<String> {
                Ok(format!("summary of {}", text))
            }
            fn compare(&self, _products: &[ProductSummary], _instructions: &str) -> Result<String> {
                Ok(String::new())
            }
        }

        let mut chunks = Vec::new();
        let full = Echo
            .summarize_streaming("page", &mut |chunk| chunks.push(chunk.to_string()))
            .unwrap();
        assert_eq!(full, "summary of page");
        assert_eq!(chunks, vec!["summary of page"]);
    }

    #[test]
    fn test_missing_binary() {
        let summarizer = ClaudeSummarizer::from_config(&SummarizerConfig {
            enabled: true,
            command: "shoplens-no-such-binary".to_string(),
        });
        assert!(matches!(
            summarizer.check_available(),
            Err(ShoplensError::SummarizerNotInstalled(_))
        ));
        assert!(matches!(
            summarizer.summarize("x"),
            Err(ShoplensError::SummarizerNotInstalled(_))
        ));
    }
}
