//! bsonedit CLI
//!
//! Command-line tools for viewing and converting BSON files.
//!
//! # Commands
//!
//! - `view` - Print the editable text form of a BSON file
//! - `check` - Validate that a file parses as a BSON record stream
//! - `to-json` - Convert a BSON file to JSON text
//! - `from-json` - Convert JSON text to a BSON file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// BSON viewing and conversion tools.
#[derive(Parser)]
#[command(name = "bsonedit")]
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
    /// Print the editable text form of a BSON file
    View {
        /// File to view
        file: PathBuf,
    },

    /// Validate that a file parses as a BSON record stream
    Check {
        /// File to check
        file: PathBuf,
    },

    /// Convert a BSON file to JSON text
    ToJson {
        /// BSON input file
        file: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert JSON text to a BSON file
    FromJson {
        /// JSON input file
        file: PathBuf,

        /// BSON output file
        #[arg(short, long)]
        output: PathBuf,
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
        Commands::View { file } => commands::view::run(&file)?,
        Commands::Check { file } => commands::check::run(&file)?,
        Commands::ToJson { file, output } => commands::convert::to_json(&file, output.as_deref())?,
        Commands::FromJson { file, output } => commands::convert::from_json(&file, &output)?,
        Commands::Version => {
            println!("bsonedit CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("bsonedit core v{}", bsonedit_core::VERSION);
        }
    }

    Ok(())
}
