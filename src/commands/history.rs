//! Price history command

use colored::Colorize;

use shoplens::config::Config;
use shoplens::db::Database;
use shoplens::error::Result;
use shoplens::price_history::{url_from_key, PriceHistoryTracker, KEY_PREFIX};

use crate::utils::format_timestamp_ms;

/// Show stored prices for a URL, or list tracked URLs
pub fn cmd_history(config: &Config, url: Option<&str>, json: bool) -> Result<()> {
    let db = Database::open()?;

    let Some(url) = url else {
        let urls: Vec<String> = db
            .keys_with_prefix(KEY_PREFIX)?
            .iter()
            .filter_map(|key| url_from_key(key).map(String::from))
            .collect();

        if json {
            println!("{}", serde_json::to_string_pretty(&urls)?);
        } else if urls.is_empty() {
            println!("No products tracked yet. Run `shoplens extract <URL>` to start.");
        } else {
            println!("\nTracked products:\n");
            for url in urls {
                println!("  {}", url);
            }
            println!();
        }
        return Ok(());
    };

    let tracker = PriceHistoryTracker::new(&db, config.price_history.clone());
    let entry = tracker.history(url)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    let Some(entry) = entry.filter(|e| !e.prices.is_empty()) else {
        println!("No price history for '{}'.", url);
        return Ok(());
    };

    println!("\nPrice history for {}:\n", url.bold());
    for point in &entry.prices {
        println!(
            "  {} | {:.2} {}",
            format_timestamp_ms(point.timestamp).dimmed(),
            point.price,
            point.currency
        );
    }

    if let (Some(low), Some(high)) = (entry.lowest(), entry.highest()) {
        println!(
            "\n  Lowest: {}  Highest: {}",
            format!("{:.2} {}", low.price, low.currency).green(),
            format!("{:.2} {}", high.price, high.currency).red()
        );
    }
    println!(
        "  Keeping {} days of observations\n",
        config.price_history.retention_days
    );
    Ok(())
}
