//! Config validation with field paths and user-friendly messages.

use std::collections::HashSet;

use crate::schema::{KippoConfig, OrganizationConfig};
use crate::settings::parse_utc_offset;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &KippoConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_attendance(config, &mut report);
    validate_storage(config, &mut report);
    validate_organizations(config, &mut report);
    report
}

fn validate_server(config: &KippoConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if let Some(port) = server.port {
        if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "server.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if let Some(path) = &server.slash_command_path {
        if path.contains(':') || path.contains('*') {
            report.error("server.slash_command_path", "Path must not contain route parameters");
        }
    }
}

fn validate_attendance(config: &KippoConfig, report: &mut ValidationReport) {
    let Some(attendance) = &config.attendance else { return };
    if let Some(offset) = &attendance.utc_offset {
        if let Err(err) = parse_utc_offset(offset) {
            report.error("attendance.utc_offset", err.to_string());
        }
    }
    if let Some(minutes) = attendance.cancel_window_minutes {
        if minutes <= 0 {
            report.error("attendance.cancel_window_minutes", "cancel_window_minutes must be >= 1");
        }
    }
    if let Some(days) = attendance.image_refresh_days {
        if days < 0 {
            report.error("attendance.image_refresh_days", "image_refresh_days cannot be negative");
        }
    }
}

fn validate_storage(config: &KippoConfig, report: &mut ValidationReport) {
    let Some(storage) = &config.storage else { return };
    if let Some(bucket) = &storage.dump_bucket {
        if bucket.trim().is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
            report.error("storage.dump_bucket", format!("Invalid bucket name '{bucket}'"));
        }
    }
}

fn validate_organizations(config: &KippoConfig, report: &mut ValidationReport) {
    if config.organizations.is_empty() {
        report.warn("organizations", "No organizations configured; every command will be refused");
    }
    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for (i, org) in config.organizations.iter().enumerate() {
        let path = format!("organizations[{i}]");
        if org.name.trim().is_empty() {
            report.error(format!("{path}.name"), "Organization name cannot be empty");
        } else if !names.insert(org.name.as_str()) {
            report.error(format!("{path}.name"), format!("Duplicate organization '{}'", org.name));
        }
        if let Some(id) = org.id {
            if !ids.insert(id) {
                report.error(format!("{path}.id"), format!("Duplicate organization id {id}"));
            }
        }
        validate_organization(org, &path, report);
    }
}

fn validate_organization(org: &OrganizationConfig, path: &str, report: &mut ValidationReport) {
    let required = [
        ("slack_api_token", &org.slack_api_token),
        ("slack_signing_secret", &org.slack_signing_secret),
        ("slack_command_name", &org.slack_command_name),
        ("slack_attendance_report_channel", &org.slack_attendance_report_channel),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            report.error(format!("{path}.{field}"), format!("{field} is required"));
        }
    }
    if org.slack_weekly_project_report_channel.trim().is_empty() {
        report.warn(
            format!("{path}.slack_weekly_project_report_channel"),
            "No weekly project report channel; project-status replies will not name one",
        );
    }

    let mut slack_usernames = HashSet::new();
    for (i, member) in org.members.iter().enumerate() {
        let member_path = format!("{path}.members[{i}]");
        if member.username.trim().is_empty() {
            report.error(format!("{member_path}.username"), "username cannot be empty");
        }
        if member.slack_username.trim().is_empty() {
            report.error(format!("{member_path}.slack_username"), "slack_username cannot be empty");
        } else if !slack_usernames.insert(member.slack_username.as_str()) {
            report.error(
                format!("{member_path}.slack_username"),
                format!("Duplicate slack_username '{}'", member.slack_username),
            );
        }
        if member.slack_user_id.is_none() {
            report.warn(
                format!("{member_path}.slack_user_id"),
                "No slack_user_id; profile images cannot be looked up",
            );
        }
    }

    for (i, project) in org.projects.iter().enumerate() {
        if project.name.trim().is_empty() {
            report.error(format!("{path}.projects[{i}].name"), "Project name cannot be empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{AttendanceConfig, MemberConfig};

    fn organization(name: &str) -> OrganizationConfig {
        OrganizationConfig {
            name: name.into(),
            slack_api_token: "xoxb-1".into(),
            slack_signing_secret: "secret".into(),
            slack_command_name: "kippo".into(),
            slack_attendance_report_channel: "#attendance".into(),
            slack_weekly_project_report_channel: "#weekly".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_with_one_org_are_valid() {
        let mut cfg = KippoConfig::default();
        cfg.organizations.push(organization("acme"));
        let report = validate(&apply_all_defaults(cfg));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn empty_config_only_warns() {
        let report = validate(&KippoConfig::default());
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "organizations");
    }

    #[test]
    fn missing_required_organization_fields() {
        let mut cfg = KippoConfig::default();
        let mut org = organization("acme");
        org.slack_signing_secret.clear();
        org.slack_command_name = "  ".into();
        cfg.organizations.push(org);
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "organizations[0].slack_signing_secret",
                "organizations[0].slack_command_name"
            ]
        );
    }

    #[test]
    fn duplicate_names_and_slack_usernames() {
        let mut cfg = KippoConfig::default();
        let mut org = organization("acme");
        for username in ["alice", "alicia"] {
            org.members.push(MemberConfig {
                username: username.into(),
                slack_username: "alice".into(),
                slack_user_id: Some("U1".into()),
                ..Default::default()
            });
        }
        cfg.organizations.push(org);
        cfg.organizations.push(organization("acme"));
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].message.contains("Duplicate slack_username"));
        assert!(report.errors[1].message.contains("Duplicate organization"));
    }

    #[test]
    fn bad_attendance_values() {
        let mut cfg = KippoConfig::default();
        cfg.attendance = Some(AttendanceConfig {
            utc_offset: Some("JST".into()),
            cancel_window_minutes: Some(0),
            image_refresh_days: Some(-1),
        });
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors[0].path, "attendance.utc_offset");
    }
}
