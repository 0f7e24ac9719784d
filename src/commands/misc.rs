//! Miscellaneous commands: config, doctor, completions

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;

use shoplens::cli::{Cli, CompletionShell};
use shoplens::config::Config;
use shoplens::db::Database;
use shoplens::error::Result;
use shoplens::summarize::ClaudeSummarizer;

/// Show the effective configuration
pub fn cmd_config(config: &Config, path_only: bool) -> Result<()> {
    let path = Config::config_path()?;
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let source = if path.exists() { "loaded" } else { "defaults, file not found" };
    println!("{}", format!("# {} ({})", path.display(), source).dimmed());
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Check dependencies and storage
pub fn cmd_doctor(config: &Config) -> Result<()> {
    println!("\nshoplens doctor\n");

    println!("  shoplens binary: v{}", env!("CARGO_PKG_VERSION"));

    let summarizer = ClaudeSummarizer::from_config(&config.summarizer);
    match summarizer.version() {
        Some(v) => println!("  Summarizer ({}): {} (installed)", config.summarizer.command, v),
        None => println!(
            "  Summarizer ({}): {}",
            config.summarizer.command,
            "NOT INSTALLED (use --no-ai)".yellow()
        ),
    }
    if !config.summarizer.enabled {
        println!("  Summaries: disabled in config");
    }

    println!("  Config: {}", Config::config_path()?.display());

    match Database::open() {
        Ok(_) => println!("  Database: OK ({})", Config::db_path()?.display()),
        Err(e) => println!("  Database: {} - {}", "ERROR".red(), e),
    }

    println!();
    Ok(())
}

/// Generate shell completions
pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "shoplens", &mut io::stdout());
    Ok(())
}
