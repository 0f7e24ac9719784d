use clap::{Parser, Subcommand, ValueEnum};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "shoplens")]
#[command(author, version, about = "Extract, score and compare product pages", long_about = None)]
#[command(after_help = r#"Examples:
  shoplens extract https://shop.example/kettle          Analyze one product page
  shoplens extract ./saved/kettle.html --json           Analyze a saved page as JSON
  shoplens compare URL1 URL2 URL3                       Summarize and compare products
  shoplens compare URL1 URL2 --no-ai                    Compare without summaries
  shoplens history https://shop.example/kettle          Show tracked prices
"#)]
pub struct Cli {
    /// Show debug logs on stderr (or set SHOPLENS_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a single product page
    #[command(after_help = r#"Examples:
  shoplens extract https://shop.example/kettle
  shoplens extract ./kettle.html --no-save     # Don't record the price
  shoplens extract https://shop.example/kettle --json
"#)]
    Extract {
        /// Product page URL or saved HTML file
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Don't record the price in history
        #[arg(long)]
        no_save: bool,
    },

    /// Analyze several product pages and compare them
    #[command(after_help = r#"Examples:
  shoplens compare https://a.example/p https://b.example/p
  shoplens compare a.html b.html --instructions "Which is quieter?"
  shoplens compare https://a.example/p https://b.example/p --no-ai --json
"#)]
    Compare {
        /// Product page URLs or saved HTML files
        #[arg(value_name = "SOURCES", required = true, num_args = 1..)]
        sources: Vec<String>,

        /// Skip AI summaries and comparison
        #[arg(long)]
        no_ai: bool,

        /// Don't record prices in history
        #[arg(long)]
        no_save: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// What to focus on when comparing
        #[arg(long)]
        instructions: Option<String>,
    },

    /// Show tracked price history for a product URL
    History {
        /// Product URL (omit to list tracked products)
        url: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,
    },

    /// Check dependencies and storage
    Doctor,

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  shoplens completions bash > ~/.local/share/bash-completion/completions/shoplens
  shoplens completions zsh > ~/.zfunc/_shoplens
  shoplens completions fish > ~/.config/fish/completions/shoplens.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from(["shoplens", "-v", "compare", "a.html", "b.html", "--no-ai"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Compare { sources, no_ai, no_save, .. } => {
                assert_eq!(sources, vec!["a.html", "b.html"]);
                assert!(no_ai);
                assert!(!no_save);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_compare_requires_source() {
        assert!(Cli::try_parse_from(["shoplens", "compare"]).is_err());
    }
}
