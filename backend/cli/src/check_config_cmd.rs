//! `kippo check-config`: validate the config and show it with secrets masked.

use anyhow::{bail, Result};
use kippo_config::{collect_redacted_paths, redact, ValidationReport};

use crate::runtime::Runtime;
use crate::terminal_output::{note_error, note_success, note_warn};

pub fn run(runtime: &Runtime) -> Result<()> {
    let path = kippo_config::config_file_path(&runtime.config_dir);
    println!("Config: {}\n", path.display());
    println!("{}", render_redacted(runtime)?);

    print_report(&runtime.report);
    if !runtime.report.is_valid() {
        bail!("{} config error(s)", runtime.report.errors.len());
    }
    note_success("Config is valid");
    Ok(())
}

/// The effective config as YAML, with secret values masked.
fn render_redacted(runtime: &Runtime) -> Result<String> {
    let value = serde_json::to_value(&runtime.config)?;
    let masked = collect_redacted_paths(&value);
    let mut yaml = serde_yaml::to_string(&redact(&value))?;
    if !masked.is_empty() {
        yaml.push_str(&format!("# masked: {}\n", masked.join(", ")));
    }
    Ok(yaml)
}

fn print_report(report: &ValidationReport) {
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
}
