//! Iconsight CLI - accessibility labels for page icons.
//!
//! Iconsight renders each icon found on a page, classifies it with two
//! cooperating image classifiers and attaches the merged class names as the
//! icon's accessibility label.
//!
//! # Usage
//!
//! ```bash
//! # Label the icons listed in a page manifest
//! iconsight label page.json
//!
//! # Stream results as JSON Lines into a file
//! iconsight label page.json --format jsonl --output labels.jsonl
//!
//! # View configuration
//! iconsight config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Iconsight - accessibility labels for page icons.
#[derive(Parser, Debug)]
#[command(name = "iconsight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Label the icons in a page manifest
    Label(cli::label::LabelArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match iconsight_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `iconsight config path`."
            );
            iconsight_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Iconsight v{}", iconsight_core::VERSION);

    match cli.command {
        Commands::Label(args) => cli::label::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
