use clap::{Parser, Subcommand};
use rifs_core::ResolvePolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rifs")]
#[command(author, version, about = "Resolve render-farm operations into ordered jobs and submit them")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build, resolve, and submit every job in a batch manifest
    Submit {
        /// Batch manifest (JSON)
        #[arg(required = true)]
        manifest: PathBuf,

        /// What to do with jobs whose dependencies cannot be resolved
        /// (strict or force; defaults to the config value)
        #[arg(long)]
        policy: Option<ResolvePolicy>,

        /// Show what would be submitted without launching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Build and resolve a batch manifest and print the submission order
    Plan {
        /// Batch manifest (JSON)
        #[arg(required = true)]
        manifest: PathBuf,

        /// What to do with jobs whose dependencies cannot be resolved
        #[arg(long)]
        policy: Option<ResolvePolicy>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a materialized script rebuilds
    Inspect {
        /// Generated script
        #[arg(required = true)]
        script: PathBuf,
    },

    /// Check that the interpreter and render tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}
