//! Config file location and loading.

use crate::schema::KippoConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the Kippo config directory.
/// Priority: `KIPPO_CONFIG_DIR` env > `~/.kippo/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KIPPO_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".kippo"),
        None => PathBuf::from(".kippo"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// joined to `base`.
pub fn resolve_path(base: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Read the config file as an untyped value, before env substitution.
///
/// Returns an empty object if the file doesn't exist (first run).
pub async fn load_raw_config(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    // A document of only comments parses as null.
    Ok(if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    })
}

/// Load and parse the config from disk without any processing.
pub async fn load_config(path: &Path) -> Result<KippoConfig> {
    let value = load_raw_config(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config structure at: {}", path.display()))
}
