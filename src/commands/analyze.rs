//! Page analysis commands: extract, compare

use std::cell::RefCell;
use std::io::Write;

use colored::{ColoredString, Colorize};
use tracing::debug;

use shoplens::compare::{analyze_page, ComparisonReport, ComparisonRun, ProductReport};
use shoplens::config::Config;
use shoplens::db::Database;
use shoplens::error::{Result, ShoplensError};
use shoplens::fetch;
use shoplens::price_history::{AlertKind, MemoryStore, PriceAlert, PriceHistoryTracker, PriceStore};
use shoplens::summarize::{summary_lines, ClaudeSummarizer, Summarizer};
use shoplens::value::ValueLabel;

use crate::utils::{format_rating, truncate_str};

/// Analyze a single product page
pub fn cmd_extract(config: &Config, source: &str, json: bool, no_save: bool) -> Result<()> {
    let content = fetch::load(source)?;
    let analysis = analyze_page(&content, &config.extraction);

    let price_alert = if no_save {
        None
    } else {
        let db = Database::open()?;
        PriceHistoryTracker::new(db, config.price_history.clone()).track(&analysis.record)
    };

    let report = ProductReport {
        source: source.to_string(),
        analysis,
        price_alert,
        summary: None,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_product(None, &report);
    println!("\n{}", "─".repeat(60).dimmed());
    println!("{}", report.analysis.content);
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "{}",
        format!(
            "{} fragments packed into {} characters (budget {})",
            report.analysis.fragment_count,
            report.analysis.content.chars().count(),
            config.extraction.max_content_length
        )
        .dimmed()
    );
    Ok(())
}

/// Analyze several product pages, then summarize and compare them
pub fn cmd_compare(
    config: &Config,
    sources: &[String],
    no_ai: bool,
    no_save: bool,
    json: bool,
    instructions: Option<String>,
) -> Result<()> {
    let summarizer = if no_ai || !config.summarizer.enabled {
        None
    } else {
        let summarizer = ClaudeSummarizer::from_config(&config.summarizer);
        summarizer.check_available()?;
        Some(summarizer)
    };
    let summarizer = summarizer.as_ref().map(|s| s as &dyn Summarizer);

    if !json {
        println!("\n{} {} products...", "Analyzing".cyan().bold(), sources.len());
    }

    // Text output streams each summary as it is written
    let streamed = !json && summarizer.is_some();
    let printer = SummaryPrinter::default();
    let handler = |source: &str, chunk: &str| printer.print(source, chunk);
    let on_chunk = streamed.then_some(&handler as &dyn Fn(&str, &str));

    let report = if no_save {
        run_comparison(config, MemoryStore::new(), summarizer, on_chunk, instructions.as_deref(), sources)
    } else {
        run_comparison(config, Database::open()?, summarizer, on_chunk, instructions.as_deref(), sources)
    };

    if report.products.is_empty() {
        print_warnings(&report.warnings);
        return Err(ShoplensError::NoProducts);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report, streamed);
    Ok(())
}

/// Prints streamed summary chunks under a heading per source
#[derive(Default)]
struct SummaryPrinter {
    current: RefCell<Option<String>>,
}

impl SummaryPrinter {
    fn print(&self, source: &str, chunk: &str) {
        let mut current = self.current.borrow_mut();
        if current.as_deref() != Some(source) {
            println!("\n{} {}", "Summary:".cyan().bold(), truncate_str(source, 70).dimmed());
            *current = Some(source.to_string());
        }
        print!("{}", chunk);
        let _ = std::io::stdout().flush();
    }
}

fn run_comparison<'a, S: PriceStore>(
    config: &'a Config,
    store: S,
    summarizer: Option<&'a dyn Summarizer>,
    on_chunk: Option<&'a dyn Fn(&str, &str)>,
    instructions: Option<&str>,
    sources: &[String],
) -> ComparisonReport {
    let mut run = ComparisonRun::new(config, store);
    if let Some(summarizer) = summarizer {
        run = run.with_summarizer(summarizer);
    }
    if let Some(handler) = on_chunk {
        run = run.with_chunk_handler(handler);
    }
    if let Some(instructions) = instructions {
        run = run.with_instructions(instructions);
    }
    let report = run.run(sources);
    debug!(
        products = report.products.len(),
        warnings = report.warnings.len(),
        "comparison finished"
    );
    report
}

fn print_report(report: &ComparisonReport, streamed: bool) {
    if streamed {
        println!();
    }
    for (i, product) in report.products.iter().enumerate() {
        print_product(Some(i + 1), product);
        if let Some(summary) = product.summary.as_ref().filter(|_| !streamed) {
            for line in summary_lines(summary) {
                println!("    • {}", line);
            }
        }
    }

    print_warnings(&report.warnings);

    if let Some(comparison) = &report.comparison {
        println!("\n{}", "Comparison".bold());
        println!("{}", comparison);
    }

    if let Some(best) = report.best_value() {
        if report.products.len() > 1 {
            println!(
                "\n{} {} ({:.1}/10)",
                "Best value:".green().bold(),
                best.analysis.record.title,
                best.analysis.value_score.unwrap_or_default()
            );
        }
    }
    println!();
}

fn print_product(index: Option<usize>, report: &ProductReport) {
    let record = &report.analysis.record;
    let title = truncate_str(&record.title, 70);
    let heading = match index {
        Some(i) => format!("{}. {}", i, title),
        None => title,
    };

    println!("\n{}", heading.bold());
    println!("  {}", record.url.dimmed());
    match record.price_label() {
        Some(price) => println!("  Price:  {}", price.green()),
        None => println!("  Price:  {}", "unknown".dimmed()),
    }
    if let Some(rating) = format_rating(record.rating, record.review_count) {
        println!("  Rating: {}", rating);
    }
    if let (Some(score), Some(label)) = (report.analysis.value_score, report.analysis.value_label) {
        println!("  Value:  {:.1}/10 ({})", score, label_color(label));
    }
    if let Some(alert) = &report.price_alert {
        println!("  {}", alert_color(alert));
    }
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Warnings:".yellow().bold());
    for warning in warnings {
        println!("  {}", warning.yellow());
    }
}

fn label_color(label: ValueLabel) -> ColoredString {
    match label {
        ValueLabel::Excellent => label.as_str().green().bold(),
        ValueLabel::Good => label.as_str().green(),
        ValueLabel::Fair => label.as_str().yellow(),
        ValueLabel::Poor => label.as_str().red(),
    }
}

fn alert_color(alert: &PriceAlert) -> ColoredString {
    match alert.kind {
        AlertKind::Drop => alert.message().green().bold(),
        AlertKind::Increase => alert.message().yellow().bold(),
    }
}
