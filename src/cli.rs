//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// qdrant-digest - grouped, deduplicated code-search reports from Qdrant
///
/// Fetches hits from a Qdrant collection (or a saved JSON file), groups them
/// by source file, drops spans contained in wider spans and prints a
/// per-file summary with average scores.
///
/// Examples:
///   qdrant-digest --collection my-repo
///   qdrant-digest --collection my-repo --vector query.json --limit 20
///   qdrant-digest --collection my-repo --file src/lib.rs
///   qdrant-digest --input hits.json --format json
///   qdrant-digest --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Qdrant collection to query
    ///
    /// Also used as the collection label in the report.
    #[arg(short, long, value_name = "NAME", env = "QDRANT_COLLECTION")]
    pub collection: Option<String>,

    /// Qdrant REST endpoint URL
    #[arg(long, value_name = "URL", env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,

    /// Qdrant API key
    #[arg(long, value_name = "KEY", env = "QDRANT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// JSON file holding the query vector (array of floats)
    ///
    /// Without a vector, points are fetched with a scroll request and
    /// every hit scores 1.0.
    #[arg(long, value_name = "FILE", conflicts_with = "input")]
    pub vector: Option<PathBuf>,

    /// Read hits from a JSON file instead of querying Qdrant
    ///
    /// Accepts a bare array of hits or a saved search/scroll response.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Only fetch chunks whose payload filePath equals this value
    #[arg(long, value_name = "PATH", conflicts_with = "input")]
    pub file: Option<String>,

    /// Maximum number of hits to fetch
    #[arg(short, long, value_name = "COUNT")]
    pub limit: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .qdrant-digest.toml in the current directory
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 when the query returns no hits
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Generate a default .qdrant-digest.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain-text summary (default)
    #[default]
    Text,
    /// Full report as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.qdrant_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Qdrant URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref collection) = self.collection {
            if collection.trim().is_empty() {
                return Err("Collection name cannot be empty".to_string());
            }
        }

        if self.limit == Some(0) {
            return Err("Limit must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for (flag, path) in [("--input", &self.input), ("--vector", &self.vector)] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(format!("{} file does not exist: {}", flag, path.display()));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` config key; `--quiet`
    /// wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
