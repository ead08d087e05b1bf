//! Configuration file support for layerscan.
//!
//! Provides YAML-based configuration through `layerscan.config.yml` files,
//! including data structures, file loading, and validation. Command-line
//! arguments take precedence over configuration file values.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::shared::Result;

const CONFIG_FILENAME: &str = "layerscan.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub feed_url: Option<String>,
    pub skip_correlation: Option<bool>,
    pub batch_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub timeout_seconds: Option<u64>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(batch_size) = config.batch_size {
        if batch_size == 0 {
            bail!(
                "Invalid config: batch_size must be at least 1.\n\n\
                 💡 Hint: Remove the field to use the default batch size."
            );
        }
    }

    if let Some(concurrency) = config.concurrency {
        if concurrency == 0 {
            bail!(
                "Invalid config: concurrency must be at least 1.\n\n\
                 💡 Hint: Remove the field to use the default concurrency."
            );
        }
    }

    if let Some(timeout_seconds) = config.timeout_seconds {
        if timeout_seconds == 0 {
            bail!(
                "Invalid config: timeout_seconds must be at least 1.\n\n\
                 💡 Hint: Remove the field to use the default deadline."
            );
        }
    }

    if let Some(ref feed_url) = config.feed_url {
        if !feed_url.starts_with("http://") && !feed_url.starts_with("https://") {
            bail!(
                "Invalid config: feed_url must be an http(s) URL.\n\n\
                 💡 Hint: Example: https://services.nvd.nist.gov/rest/json/cves/2.0"
            );
        }
    }

    Ok(())
}

/// Warn about unknown fields, typically typos.
fn warn_unknown_fields(config: &ConfigFile) {
    for field in config.unknown_fields.keys() {
        eprintln!("⚠️  Warning: Unknown config field '{}' ignored", field);
    }
}
