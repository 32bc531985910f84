//! Kippo runtime configuration schema, typed for serde YAML/JSON.
//!
//! Every section is optional in the file; [`crate::apply_all_defaults`] fills
//! in what is missing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KippoConfig {
    /// Slash command HTTP endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// SQLite database location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    /// Clock-in/out behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceConfig>,

    /// Object storage for dumps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Organizations synced into the store at startup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<OrganizationConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Commands are accepted at `{slash_command_path}/{organization_id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slash_command_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// `+09:00` style offset used to read and display times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_window_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_refresh_days: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the object store; relative to the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_key_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory of the daily NDJSON files; unset logs to the console only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Fixed id; otherwise the stored organization with the same name keeps
    /// its id, or a new one is generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub slack_api_token: String,
    #[serde(default)]
    pub slack_signing_secret: String,
    #[serde(default)]
    pub slack_command_name: String,
    #[serde(default)]
    pub slack_attendance_report_channel: String,
    #[serde(default)]
    pub slack_weekly_project_report_channel: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub slack_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_channel_name: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default = "default_true")]
    pub display_as_active: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r##"
server:
  port: 9000
attendance:
  utc_offset: "+09:00"
organizations:
  - name: acme
    slack_api_token: xoxb-1
    slack_signing_secret: s3cret
    slack_command_name: kippo
    slack_attendance_report_channel: "#attendance"
    members:
      - username: alice
        slack_username: alice.s
    projects:
      - name: Apollo
        slack_channel_name: proj-apollo
"##;
        let config: KippoConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.unwrap().port, Some(9000));
        let org = &config.organizations[0];
        assert_eq!(org.slack_weekly_project_report_channel, "");
        assert_eq!(org.members[0].display_name, None);
        assert!(org.projects[0].display_as_active);
        assert!(!org.projects[0].is_closed);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: KippoConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, KippoConfig::default());
    }
}
