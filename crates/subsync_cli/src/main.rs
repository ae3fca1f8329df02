//! subsync CLI
//!
//! Copies a declared subset of collections from a source document store to
//! a destination store, in dependency order.
//!
//! # Commands
//!
//! - `run` - execute a sync run from a descriptor file
//! - `check` - validate a descriptor file and print its schedule
//! - `version` - show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dependency-ordered partial document-store synchronization.
#[derive(Parser)]
#[command(name = "subsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the descriptor set's collections from source to destination
    Run {
        /// Path to the YAML descriptor set
        descriptors: PathBuf,

        /// Source store URI (defaults to the SOURCE_URI environment variable)
        #[arg(short, long)]
        source: Option<String>,

        /// Destination store URI (defaults to the DESTINATION_URI environment variable)
        #[arg(short, long)]
        dest: Option<String>,

        /// Parent identifiers per join batch
        #[arg(long, default_value_t = subsync_core::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Policy for pre-existing destination data (fail, replace, append)
        #[arg(long, default_value = "fail")]
        existing: String,
    },

    /// Validate a descriptor set and print its dependency schedule
    Check {
        /// Path to the YAML descriptor set
        descriptors: PathBuf,
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
        Commands::Run {
            descriptors,
            source,
            dest,
            batch_size,
            existing,
        } => {
            commands::run::run(&descriptors, source, dest, batch_size, &existing)?;
        }
        Commands::Check { descriptors } => {
            commands::check::run(&descriptors)?;
        }
        Commands::Version => {
            println!("subsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("subsync core v{}", subsync_core::VERSION);
        }
    }

    Ok(())
}
