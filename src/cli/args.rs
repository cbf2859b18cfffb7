//! CLI argument definitions using clap
//!
//! Commands:
//! - lms-query serve --config <path> [--port <port>]
//! - lms-query query --config <path> --entity <name> [--relations a,b.c]
//! - lms-query search --config <path> --entity <name> [--relations a,b.c]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query engine for the learning-management back office
#[derive(Parser, Debug)]
#[command(name = "lms-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./lms-query.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one filter-mode query read from stdin
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./lms-query.json")]
        config: PathBuf,

        /// Entity to query
        #[arg(long)]
        entity: String,

        /// Comma separated relation paths (defaults to the entity's configured relations)
        #[arg(long)]
        relations: Option<String>,
    },

    /// Run one search-mode query read from stdin
    Search {
        /// Path to configuration file
        #[arg(long, default_value = "./lms-query.json")]
        config: PathBuf,

        /// Entity to search
        #[arg(long)]
        entity: String,

        /// Comma separated relation paths (defaults to the entity's configured relations)
        #[arg(long)]
        relations: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
