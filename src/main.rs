//! qdrant-digest - grouped code-search reports from Qdrant
//!
//! A CLI tool that fetches scored code chunks from a Qdrant collection,
//! groups them by source file, removes spans contained in wider spans and
//! renders a per-file summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, unreadable input, etc.)
//!   2 - No hits found and --fail-on-empty set

mod analysis;
mod cli;
mod config;
mod models;
mod qdrant;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::RawHit;
use qdrant::{QdrantClient, QdrantClientConfig};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so `[general] verbose` can set the log level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("qdrant-digest v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!(
        "Using {} collection {} (limit {})",
        config.qdrant.url, config.qdrant.collection, config.qdrant.limit
    );

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .qdrant-digest.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging at `level`, unless `RUST_LOG` is set.
///
/// Logs go to stderr; stdout only ever carries the report.
fn init_logging(level: tracing::Level) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(level, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Directives from `RUST_LOG` when present and valid, otherwise `level`.
fn log_filter(level: tracing::Level, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()))
}

/// Fetch hits, aggregate them and emit the report. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let collection = config.qdrant.collection.clone();

    let hits = match args.input {
        Some(ref input) => load_hits(input)?,
        None => fetch_hits(&args, &config).await?,
    };
    info!("Aggregating {} hits", hits.len());

    let report = analysis::aggregate(&hits, &collection);
    info!(
        "{} files, {} snippets kept",
        report.file_count,
        report.files.iter().map(|f| f.spans.len()).sum::<usize>()
    );

    let output = match config.general.format {
        OutputFormat::Text => report::generate_text_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    if args.fail_on_empty && report.is_empty() {
        warn!("No hits found in collection {}", collection);
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up. A config file that exists but does not
/// parse is an error, whether it was named with --config or found in the
/// working directory.
fn load_config(args: &Args) -> Result<Config> {
    load_config_in(args, Path::new("."))
}

fn load_config_in(args: &Args, dir: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_from_dir(dir)?.unwrap_or_default())
}

/// Read hits saved as JSON (bare array or Qdrant response body).
fn load_hits(path: &Path) -> Result<Vec<RawHit>> {
    info!("Reading hits from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read hits file: {}", path.display()))?;

    qdrant::client::parse_hits(&content)
        .with_context(|| format!("Failed to parse hits file: {}", path.display()))
}

/// Read a query vector stored as a JSON array of floats.
fn load_vector(path: &Path) -> Result<Vec<f32>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read vector file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse vector file: {}", path.display()))
}

/// Query Qdrant: health check, then search or scroll.
async fn fetch_hits(args: &Args, config: &Config) -> Result<Vec<RawHit>> {
    let vector = args.vector.as_deref().map(load_vector).transpose()?;

    let client = QdrantClient::new(QdrantClientConfig {
        url: config.qdrant.url.clone(),
        api_key: config.qdrant.api_key.clone(),
        timeout_seconds: config.qdrant.timeout_seconds,
    })?;

    let collection = &config.qdrant.collection;
    info!(
        "Querying {} collection {} ({})",
        client.url(),
        collection,
        if vector.is_some() { "search" } else { "scroll" }
    );

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Querying Qdrant collection {}", collection));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let result = client
        .query(
            collection,
            vector.as_deref(),
            config.qdrant.limit,
            args.file.as_deref(),
        )
        .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result.with_context(|| format!("Failed to query Qdrant collection \"{}\"", collection))
}
