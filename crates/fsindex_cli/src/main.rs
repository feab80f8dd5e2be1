//! fsindex CLI
//!
//! Command-line tools for inspecting filesystem indexes.
//!
//! # Commands
//!
//! - `inspect` - List index roots with value and entry counts
//! - `lookup` - Resolve a value to its primary keys
//! - `search` - Match values against a glob pattern
//! - `verify` - Report dangling entries and empty value containers

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// fsindex command-line index tools.
#[derive(Parser)]
#[command(name = "fsindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Entity files directory (defaults to <path>/files)
    #[arg(global = true, long)]
    files: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List index roots with value and entry counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Resolve a value to its primary keys
    Lookup {
        /// Index root name, e.g. non_unique.pets.Pet.Color
        root: String,

        /// Value to look up
        value: String,
    },

    /// List entity files whose value matches a glob pattern
    Search {
        /// Index root name, e.g. unique.pets.Pet.Name
        root: String,

        /// Glob pattern over values
        pattern: String,
    },

    /// Verify index consistency against the entity files
    Verify {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Data path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Lookup { root, value } => {
            let path = cli.path.ok_or("Data path required for lookup")?;
            commands::lookup::run(&path, cli.files.as_deref(), &root, &value)?;
        }
        Commands::Search { root, pattern } => {
            let path = cli.path.ok_or("Data path required for search")?;
            commands::search::run(&path, cli.files.as_deref(), &root, &pattern)?;
        }
        Commands::Verify { format } => {
            let path = cli.path.ok_or("Data path required for verify")?;
            commands::verify::run(&path, &format)?;
        }
        Commands::Version => {
            println!("fsindex CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("fsindex core v{}", fsindex_core::VERSION);
        }
    }

    Ok(())
}
