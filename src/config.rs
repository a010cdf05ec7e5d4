//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.qdrant-digest.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".qdrant-digest.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Qdrant connection settings.
    #[serde(default)]
    pub qdrant: QdrantConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Report output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            format: OutputFormat::Text,
        }
    }
}

/// Qdrant connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Qdrant REST endpoint.
    #[serde(default = "default_url")]
    pub url: String,

    /// Collection to query.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// API key sent in the `api-key` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of hits to fetch.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            collection: default_collection(),
            api_key: None,
            timeout_seconds: default_timeout(),
            limit: default_limit(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "code".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_limit() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.qdrant-digest.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.qdrant_url {
            self.qdrant.url = url.clone();
        }
        if let Some(ref collection) = args.collection {
            self.qdrant.collection = collection.clone();
        }
        if let Some(ref api_key) = args.api_key {
            self.qdrant.api_key = Some(api_key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.qdrant.timeout_seconds = timeout;
        }
        if let Some(limit) = args.limit {
            self.qdrant.limit = limit;
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.qdrant.url, "http://localhost:6333");
        assert_eq!(config.qdrant.limit, 10);
        assert_eq!(config.general.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true
format = "json"

[qdrant]
url = "http://qdrant:6333"
collection = "my-repo"
limit = 25
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.qdrant.url, "http://qdrant:6333");
        assert_eq!(config.qdrant.collection, "my-repo");
        assert_eq!(config.qdrant.limit, 25);
        assert_eq!(config.qdrant.timeout_seconds, 30);
        assert!(config.qdrant.api_key.is_none());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[qdrant]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.qdrant.collection, "code");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[qdrant]\ncollection = \"docs\"\n",
        )
        .unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.qdrant.collection, "docs");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[qdrant\nurl = ").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_only_overrides_provided_args() {
        let mut config = Config::default();
        config.qdrant.collection = "from-file".to_string();
        config.qdrant.limit = 50;

        let mut args = make_args();
        args.limit = Some(5);
        args.format = Some(OutputFormat::Json);

        config.merge_with_args(&args);

        assert_eq!(config.qdrant.collection, "from-file");
        assert_eq!(config.qdrant.limit, 5);
        assert_eq!(config.general.format, OutputFormat::Json);
    }
}
