//! Persistent records shared by the command handlers and the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// A tenant with its own Slack workspace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slack_api_token: String,
    pub slack_signing_secret: String,
    /// Slash command registered in Slack, with or without the leading `/`.
    pub slack_command_name: String,
    pub slack_attendance_report_channel: String,
    #[serde(default)]
    pub slack_weekly_project_report_channel: String,
}

impl Organization {
    /// Fields that must be non-empty before commands can be processed.
    pub const REQUIRED_FIELDS: [&'static str; 4] = [
        "slack_api_token",
        "slack_signing_secret",
        "slack_command_name",
        "slack_attendance_report_channel",
    ];

    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let values = [
            &self.slack_api_token,
            &self.slack_signing_secret,
            &self.slack_command_name,
            &self.slack_attendance_report_channel,
        ];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect()
    }

    /// The slash command as Slack sends it, always prefixed with `/`.
    pub fn slash_command(&self) -> String {
        if self.slack_command_name.starts_with('/') {
            self.slack_command_name.clone()
        } else {
            format!("/{}", self.slack_command_name)
        }
    }

    /// The slash command without its `/`, as shown in usage hints.
    pub fn command_name(&self) -> &str {
        self.slack_command_name.trim_start_matches('/')
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KippoUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

/// Links a user to an organization and to their Slack identity there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub slack_username: String,
    pub slack_user_id: Option<String>,
    pub slack_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Slack command (one inbound instruction)
// ---------------------------------------------------------------------------

/// One slash-command invocation, persisted when it is received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackCommand {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    /// The alias that selected the handler.
    pub sub_command: String,
    /// Full text after the slash command, alias included.
    pub text: String,
    pub response_url: String,
    pub payload: serde_json::Value,
    /// Set once a handler completed a valid operation.
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
}

impl SlackCommand {
    pub fn new(
        organization_id: Uuid,
        user_id: Uuid,
        sub_command: impl Into<String>,
        text: impl Into<String>,
        response_url: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            sub_command: sub_command.into(),
            text: text.into(),
            response_url: response_url.into(),
            payload,
            is_valid: false,
            created_at: Utc::now(),
        }
    }

    /// String field from the raw request payload, e.g. `channel_name`.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceCategory {
    Start,
    BreakStart,
    BreakEnd,
    End,
}

impl AttendanceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::BreakStart => "break_start",
            Self::BreakEnd => "break_end",
            Self::End => "end",
        }
    }

    /// Human-readable working state after a record of this category.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Start | Self::BreakEnd => "working",
            Self::BreakStart => "working (on break)",
            Self::End => "clocked out",
        }
    }
}

impl fmt::Display for AttendanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "break_start" => Ok(Self::BreakStart),
            "break_end" => Ok(Self::BreakEnd),
            "end" => Ok(Self::End),
            other => Err(format!("unknown attendance category: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub category: AttendanceCategory,
    pub entry_datetime: DateTime<FixedOffset>,
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn new(
        organization_id: Uuid,
        created_by: Uuid,
        category: AttendanceCategory,
        entry_datetime: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            created_by,
            category,
            entry_datetime,
            created_at: Utc::now(),
        }
    }
}

/// A day (or half day) off registered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalHoliday {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub is_half: bool,
    /// Number of consecutive days, starting at `day`.
    pub duration: u32,
}

impl PersonalHoliday {
    pub fn new(user_id: Uuid, day: NaiveDate, is_half: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            day,
            is_half,
            duration: 1,
        }
    }

    pub fn covered_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..i64::from(self.duration.max(1))).map(move |offset| self.day + Duration::days(offset))
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.covered_days().any(|d| d == date)
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KippoProject {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub slack_channel_name: Option<String>,
    pub is_closed: bool,
    pub display_as_active: bool,
}

impl KippoProject {
    pub fn is_active(&self) -> bool {
        !self.is_closed && self.display_as_active
    }
}

/// A free-text weekly status comment left on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub id: Uuid,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectStatus {
    pub fn new(project_id: Uuid, created_by: Uuid, comment: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            created_by,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organization() -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "acme".into(),
            slack_api_token: "xoxb-token".into(),
            slack_signing_secret: "secret".into(),
            slack_command_name: "kippo".into(),
            slack_attendance_report_channel: "#attendance".into(),
            slack_weekly_project_report_channel: String::new(),
        }
    }

    #[test]
    fn test_slash_command_adds_prefix() {
        let mut org = organization();
        assert_eq!(org.slash_command(), "/kippo");
        org.slack_command_name = "/kippo".into();
        assert_eq!(org.slash_command(), "/kippo");
        assert_eq!(org.command_name(), "kippo");
    }

    #[test]
    fn test_missing_required_fields() {
        let mut org = organization();
        assert!(org.missing_required_fields().is_empty());
        org.slack_signing_secret = " ".into();
        org.slack_attendance_report_channel.clear();
        assert_eq!(
            org.missing_required_fields(),
            vec!["slack_signing_secret", "slack_attendance_report_channel"]
        );
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            AttendanceCategory::Start,
            AttendanceCategory::BreakStart,
            AttendanceCategory::BreakEnd,
            AttendanceCategory::End,
        ] {
            assert_eq!(category.as_str().parse::<AttendanceCategory>().unwrap(), category);
        }
        assert!("lunch".parse::<AttendanceCategory>().is_err());
    }

    #[test]
    fn test_holiday_covers_duration() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut holiday = PersonalHoliday::new(Uuid::new_v4(), day, false);
        assert!(holiday.covers(day));
        assert!(!holiday.covers(day.succ_opt().unwrap()));

        holiday.duration = 3;
        assert!(holiday.covers(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()));
        assert!(!holiday.covers(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()));
    }

    #[test]
    fn test_payload_str() {
        let cmd = SlackCommand::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "status",
            "status all good",
            "https://hooks.slack.test/1",
            serde_json::json!({"channel_name": "proj-a"}),
        );
        assert_eq!(cmd.payload_str("channel_name"), Some("proj-a"));
        assert_eq!(cmd.payload_str("user_id"), None);
        assert!(!cmd.is_valid);
    }
}
