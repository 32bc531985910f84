//! Slash Command Audit Log
//!
//! One structured entry per received command, written through `tracing` under
//! the `kippo_commands` target so it lands in the NDJSON file with everything
//! else. Free text is redacted first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    Dispatched {
        command: String,
        text: String,
        status: String,
    },
    Failed {
        command: String,
        text: String,
        error_msg: String,
    },
    SignatureRejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandLogEntry {
    pub organization: String,
    pub slack_username: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub event: CommandEvent,
}

pub struct CommandLogger;

impl CommandLogger {
    /// Build the redacted entry without emitting it.
    pub fn entry(
        organization: &str,
        slack_username: Option<&str>,
        mut event: CommandEvent,
    ) -> CommandLogEntry {
        match &mut event {
            CommandEvent::Dispatched { text, .. } => {
                *text = redact_sensitive_data(text);
            }
            CommandEvent::Failed {
                text, error_msg, ..
            } => {
                *text = redact_sensitive_data(text);
                *error_msg = redact_sensitive_data(error_msg);
            }
            CommandEvent::SignatureRejected => {}
        }
        CommandLogEntry {
            organization: organization.to_string(),
            slack_username: slack_username.map(str::to_string),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log(organization: &str, slack_username: Option<&str>, event: CommandEvent) {
        let entry = Self::entry(organization, slack_username, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            CommandEvent::Dispatched { .. } => {
                info!(target: "kippo_commands", entry = %json, "Slash command")
            }
            _ => warn!(target: "kippo_commands", entry = %json, "Slash command"),
        }
    }
}
