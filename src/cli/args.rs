//! CLI argument definitions using clap
//!
//! Commands:
//! - aeromodel compile --models <dir>
//! - aeromodel check --models <dir> --model <name> --document <path>
//! - aeromodel schema --models <dir> --model <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeromodel - A strict, deterministic model validation engine
#[derive(Parser, Debug)]
#[command(name = "aeromodel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile every model declaration in a directory and report
    Compile {
        /// Directory of model declaration files (*.json)
        #[arg(long)]
        models: PathBuf,

        /// Path to an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a JSON document against a registered model
    Check {
        /// Directory of model declaration files (*.json)
        #[arg(long)]
        models: PathBuf,

        /// Model name to validate against
        #[arg(long)]
        model: String,

        /// Path to the JSON document
        #[arg(long)]
        document: PathBuf,

        /// Path to an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force the interpreted path
        #[arg(long)]
        interpreted: bool,
    },

    /// Print a model's structural schema description
    Schema {
        /// Directory of model declaration files (*.json)
        #[arg(long)]
        models: PathBuf,

        /// Model name to describe
        #[arg(long)]
        model: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
