//! `kippo-config`: Kippo runtime configuration management.
//!
//! Provides:
//! - Typed config schema (server, database, attendance, storage, logging, organizations)
//! - YAML loading from `KIPPO_CONFIG_DIR` or `~/.kippo/`
//! - `${ENV_VAR}` substitution
//! - Default value application and validation
//! - Config redaction for safe display
//! - Syncing configured organizations into the store

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod settings;
pub mod sync;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_raw_config, resolve_path};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    AttendanceConfig, DatabaseConfig, KippoConfig, LoggingConfig, MemberConfig,
    OrganizationConfig, ProjectConfig, ServerConfig, StorageConfig,
};
pub use settings::parse_utc_offset;
pub use sync::{sync_into_store, SyncSummary};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, apply env substitution, apply defaults to, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Validation
/// findings are logged and returned alongside the config.
pub async fn load_and_prepare(path: &Path) -> Result<(KippoConfig, ValidationReport)> {
    let raw = load_raw_config(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
    prepare(value)
}

/// [`load_and_prepare`] over an in-memory value and an explicit environment.
pub fn prepare_with_env(
    raw: &Value,
    env: &HashMap<String, String>,
) -> Result<(KippoConfig, ValidationReport)> {
    let value = resolve_env_vars_with(raw, env).context("Failed to resolve env vars in config")?;
    prepare(value)
}

fn prepare(value: Value) -> Result<(KippoConfig, ValidationReport)> {
    let config: KippoConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    Ok((config, report))
}
