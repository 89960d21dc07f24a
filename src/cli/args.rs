//! CLI argument definitions using clap
//!
//! Commands:
//! - leadscore init --config <path>
//! - leadscore serve --config <path>
//! - leadscore import --config <path> --tenant <id> --file <path>
//! - leadscore train --config <path> --tenant <id>
//! - leadscore stats --config <path> --tenant <id>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Leadscore - per-tenant lead scoring with a retraining feedback loop
#[derive(Parser, Debug)]
#[command(name = "leadscore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration (if missing) and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./leadscore.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./leadscore.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Bulk-load historical leads from a JSON array, then retrain
    Import {
        /// Path to configuration file
        #[arg(long, default_value = "./leadscore.json")]
        config: PathBuf,

        /// Tenant to import into
        #[arg(long)]
        tenant: String,

        /// JSON file holding an array of lead records
        #[arg(long)]
        file: PathBuf,
    },

    /// Run one training pass for a tenant
    Train {
        /// Path to configuration file
        #[arg(long, default_value = "./leadscore.json")]
        config: PathBuf,

        /// Tenant to train
        #[arg(long)]
        tenant: String,
    },

    /// Print a tenant's dashboard summary
    Stats {
        /// Path to configuration file
        #[arg(long, default_value = "./leadscore.json")]
        config: PathBuf,

        /// Tenant to summarize
        #[arg(long)]
        tenant: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
