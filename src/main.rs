//! shoplens - product page extraction, scoring and comparison CLI

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shoplens::cli::{Cli, Commands};
use shoplens::config::Config;
use shoplens::error::Result;

mod commands;
mod utils;

/// Environment variable holding the log filter
const LOG_ENV: &str = "SHOPLENS_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shoplens=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Extract { source, json, no_save } => {
            commands::cmd_extract(&config, &source, json, no_save)
        }
        Commands::Compare {
            sources,
            no_ai,
            no_save,
            json,
            instructions,
        } => commands::cmd_compare(&config, &sources, no_ai, no_save, json, instructions),
        Commands::History { url, json } => commands::cmd_history(&config, url.as_deref(), json),
        Commands::Config { path } => commands::cmd_config(&config, path),
        Commands::Doctor => commands::cmd_doctor(&config),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
