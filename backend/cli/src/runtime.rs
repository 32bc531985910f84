//! Shared setup for the subcommands: config, logging, store and dispatchers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use kippo_commands::{default_registry, Dispatcher};
use kippo_config::{load_and_prepare, sync_into_store, KippoConfig, ValidationReport};
use kippo_core::{Notifier, Organization};
use kippo_store::{LocalObjectStore, SqliteStore};
use tracing::{info, warn};

pub struct Runtime {
    pub config_dir: PathBuf,
    pub config: KippoConfig,
    pub report: ValidationReport,
}

impl Runtime {
    /// Load `config.yaml` from `config_dir` and install the logger.
    pub async fn load(config_dir: PathBuf, log_level: Option<&str>) -> Result<Self> {
        let path = kippo_config::config_file_path(&config_dir);
        let (config, report) = load_and_prepare(&path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;

        let level = log_level.map(str::to_string).unwrap_or_else(|| config.log_level());
        kippo_logging::init_logger(config.log_dir(&config_dir), &level);
        for warning in &report.warnings {
            warn!(path = %warning.path, "{}", warning.message);
        }

        Ok(Self {
            config_dir,
            config,
            report,
        })
    }

    /// Fail on validation errors; commands touching Slack call this first.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.report.is_valid() {
            return Ok(());
        }
        let errors: Vec<String> = self.report.errors.iter().map(|e| e.to_string()).collect();
        bail!("invalid configuration:\n  {}", errors.join("\n  "))
    }

    pub fn open_store(&self) -> Result<Arc<SqliteStore>> {
        let path = self.config.database_path(&self.config_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(Arc::new(SqliteStore::open(&path)?))
    }

    pub fn object_store(&self) -> LocalObjectStore {
        LocalObjectStore::new(self.config.storage_root(&self.config_dir))
    }
}

/// Sync the configured organizations into `store` and build one dispatcher
/// per organization, all sharing one registry and notifier.
pub fn build_dispatchers(
    config: &KippoConfig,
    store: Arc<SqliteStore>,
    notifier: Arc<dyn Notifier>,
) -> Result<Vec<Dispatcher>> {
    let (organizations, _summary) = sync_into_store(config, store.as_ref())?;
    let registry = Arc::new(default_registry().context("Failed to build command registry")?);
    let settings = config.attendance_settings()?;
    organizations
        .into_iter()
        .map(|org: Organization| {
            info!(organization = %org.name, id = %org.id, "Prepared dispatcher");
            Dispatcher::new(org, registry.clone(), store.clone(), notifier.clone(), settings)
                .map_err(anyhow::Error::from)
        })
        .collect()
}

/// A runtime over a one-organization config written into `dir`.
#[cfg(test)]
pub(crate) async fn test_runtime(dir: &std::path::Path) -> Runtime {
    const CONFIG: &str = r##"
database:
  path: data/kippo.db
storage:
  root: objects
organizations:
  - name: acme
    slack_api_token: xoxb-1
    slack_signing_secret: secret
    slack_command_name: kippo
    slack_attendance_report_channel: "#attendance"
    slack_weekly_project_report_channel: "#weekly"
    members:
      - username: alice
        display_name: Alice
        slack_username: alice
        slack_user_id: U1
"##;
    std::fs::write(dir.join("config.yaml"), CONFIG).unwrap();
    Runtime::load(dir.to_path_buf(), Some("warn")).await.unwrap()
}
