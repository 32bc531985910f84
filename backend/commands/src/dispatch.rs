//! Command dispatch: route a slash-command request to its handler and deliver
//! the handler's output to Slack.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use kippo_core::{
    Ack, AttendanceRecord, Block, ChannelPost, KippoUser, Notifier, Organization,
    OrganizationMembership, SlackCommand, Store, WebhookReply,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::CommandError;
use crate::extract::{leading_alias, strip_alias};
use crate::registry::CommandRegistry;
use crate::types::CommandDescriptor;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

const JST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Organization-independent attendance settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceSettings {
    /// Offset applied to parsed entry times and used for "today".
    pub utc_offset: FixedOffset,
    /// How far back `attendance-cancel` looks for a record to delete.
    pub cancel_window_minutes: i64,
    /// Age after which a stored Slack profile image is fetched again.
    pub image_refresh_days: i64,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(JST_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix()),
            cancel_window_minutes: 5,
            image_refresh_days: 7,
        }
    }
}

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Everything a handler may read or touch while processing one command.
pub struct CommandContext<'a> {
    pub organization: &'a Organization,
    pub user: &'a KippoUser,
    pub membership: &'a OrganizationMembership,
    pub command: &'a SlackCommand,
    pub store: &'a dyn Store,
    pub notifier: &'a dyn Notifier,
    pub registry: &'a CommandRegistry,
    pub settings: &'a AttendanceSettings,
    /// Current time at the configured offset.
    pub now: DateTime<FixedOffset>,
}

impl CommandContext<'_> {
    /// The alias the user typed.
    pub fn alias(&self) -> &str {
        &self.command.sub_command
    }

    pub fn ensure_alias(&self, descriptor: &CommandDescriptor) -> Result<(), CommandError> {
        if descriptor.accepts(self.alias()) {
            Ok(())
        } else {
            Err(CommandError::InvalidAlias {
                alias: self.alias().to_string(),
                command: descriptor.name.to_string(),
            })
        }
    }

    /// Command text after the alias.
    pub fn text_without_alias(&self) -> String {
        strip_alias(&self.command.text, &self.command.sub_command)
    }

    pub fn mark_valid(&self) -> Result<(), CommandError> {
        self.store.mark_slack_command_valid(self.command.id)?;
        Ok(())
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Local midnight of the current day.
    pub fn start_of_today(&self) -> DateTime<FixedOffset> {
        self.today()
            .and_time(chrono::NaiveTime::MIN)
            .and_local_timezone(self.settings.utc_offset)
            .single()
            .unwrap_or(self.now)
    }

    pub fn slash_command(&self) -> String {
        self.organization.slash_command()
    }

    /// The issuing user's latest attendance record in this organization.
    pub fn latest_attendance(&self) -> Result<Option<AttendanceRecord>, CommandError> {
        Ok(self.store.latest_attendance(self.organization.id, self.user.id)?)
    }

    /// `M/D H:MM` rendering of a timestamp at the configured offset.
    pub fn local_display<Tz: chrono::TimeZone>(&self, at: &DateTime<Tz>) -> String {
        at.with_timezone(&self.settings.utc_offset)
            .format("%-m/%-d %-H:%M")
            .to_string()
    }

    /// A post to the organization's attendance report channel.
    pub fn attendance_post(&self, blocks: Vec<Block>) -> ChannelPost {
        ChannelPost {
            token: self.organization.slack_api_token.clone(),
            channel: self.organization.slack_attendance_report_channel.clone(),
            blocks,
        }
    }

    /// Slack profile image of a member, refreshed through the notifier when
    /// missing or stale. Lookup failures keep the stored URL.
    pub async fn profile_image_url(&self, membership: &OrganizationMembership) -> Option<String> {
        let current = membership.slack_image_url.clone();
        let Some(slack_user_id) = membership.slack_user_id.as_deref() else {
            return current;
        };
        let now = self.now.with_timezone(&Utc);
        let stale_before = now - Duration::days(self.settings.image_refresh_days);
        if current.is_some() && membership.updated_at >= stale_before {
            return current;
        }

        match self
            .notifier
            .user_image_url(&self.organization.slack_api_token, slack_user_id)
            .await
        {
            Ok(image_url) => {
                if let Err(err) = self.store.update_membership_image(
                    membership.organization_id,
                    membership.user_id,
                    image_url.as_deref(),
                    now,
                ) {
                    warn!(error = %err, slack_user_id, "Failed to store refreshed profile image");
                }
                info!(slack_user_id, image_url = ?image_url, "Refreshed Slack profile image");
                image_url
            }
            Err(err) => {
                warn!(error = %err, slack_user_id, "Slack profile image lookup failed");
                current
            }
        }
    }
}

/// What a handler produced: the reply blocks plus the notifications to send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerOutput {
    pub blocks: Vec<Block>,
    /// Posted to a channel right away.
    pub immediate: Option<ChannelPost>,
    /// Posted to the command's response URL.
    pub deferred: Option<WebhookReply>,
}

impl HandlerOutput {
    /// Blocks answered to the issuing user only.
    pub fn reply(blocks: Vec<Block>) -> Self {
        Self {
            deferred: Some(WebhookReply::ephemeral(blocks.clone())),
            blocks,
            immediate: None,
        }
    }

    pub fn with_channel_post(mut self, post: ChannelPost) -> Self {
        self.immediate = Some(post);
        self
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn descriptor(&self) -> &CommandDescriptor;

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError>;
}

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// The form fields Slack posts for a slash command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommandRequest {
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub team_id: String,
}

impl SlashCommandRequest {
    /// The request as the JSON payload stored with the command.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Handled,
    UnknownCommand,
    UnknownAlias,
    UnknownUser,
    FeaturePending,
    Rejected,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::UnknownCommand => "unknown_command",
            Self::UnknownAlias => "unknown_alias",
            Self::UnknownUser => "unknown_user",
            Self::FeaturePending => "feature_pending",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub blocks: Vec<Block>,
    pub channel_ack: Option<Ack>,
    pub webhook_ack: Option<Ack>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Per-organization orchestrator of the command flow.
pub struct Dispatcher {
    organization: Organization,
    registry: Arc<CommandRegistry>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    settings: AttendanceSettings,
    clock: fn() -> DateTime<Utc>,
}

impl Dispatcher {
    pub fn new(
        organization: Organization,
        registry: Arc<CommandRegistry>,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        settings: AttendanceSettings,
    ) -> Result<Self, CommandError> {
        let missing = organization.missing_required_fields();
        if !missing.is_empty() {
            return Err(CommandError::Configuration(format!(
                "organization `{}` is missing required fields: {}",
                organization.name,
                missing.join(", ")
            )));
        }
        Ok(Self {
            organization,
            registry,
            store,
            notifier,
            settings,
            clock: Utc::now,
        })
    }

    /// Replace the wall clock, mostly for tests.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn organization(&self) -> &Organization {
        &self.organization
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, request: &SlashCommandRequest) -> Result<DispatchOutcome, CommandError> {
        let org = &self.organization;
        let now = (self.clock)().with_timezone(&self.settings.utc_offset);

        let expected = org.slash_command();
        if request.command.trim() != expected {
            error!(command = %request.command, expected = %expected, organization = %org.name, "Unknown slash command");
            return self
                .recover(
                    request,
                    DispatchStatus::UnknownCommand,
                    format!(":warning: Unknown command `{}`. Use `{expected}`.", request.command),
                )
                .await;
        }

        let Some(alias) = leading_alias(&request.text) else {
            warn!(organization = %org.name, "Slash command without a sub-command");
            return self
                .recover(request, DispatchStatus::UnknownAlias, self.unsupported_message())
                .await;
        };

        let Some((user, membership)) = self
            .store
            .find_member_by_slack_username(org.id, &request.user_name)?
        else {
            error!(slack_username = %request.user_name, organization = %org.name, "No member with this Slack username");
            return self
                .recover(
                    request,
                    DispatchStatus::UnknownUser,
                    format!(
                        ":warning: Slack user `{}` is not a member of {}.",
                        request.user_name, org.name
                    ),
                )
                .await;
        };

        let command = SlackCommand::new(
            org.id,
            user.id,
            alias,
            request.text.clone(),
            request.response_url.clone(),
            request.payload(),
        );
        self.store.insert_slack_command(&command)?;

        let handler = match self.registry.resolve(alias) {
            Ok(handler) => handler,
            Err(CommandError::UnknownAlias(alias)) => {
                warn!(%alias, user = %user.username, "Unsupported sub-command");
                return self
                    .recover(request, DispatchStatus::UnknownAlias, self.unsupported_message())
                    .await;
            }
            Err(err) => return Err(err),
        };

        info!(
            "[Commands] Dispatching {} {} for {} in {}",
            expected,
            handler.descriptor().name,
            user.username,
            org.name
        );
        let ctx = CommandContext {
            organization: org,
            user: &user,
            membership: &membership,
            command: &command,
            store: self.store.as_ref(),
            notifier: self.notifier.as_ref(),
            registry: &self.registry,
            settings: &self.settings,
            now,
        };

        match handler.handle(&ctx).await {
            Ok(output) => self.deliver(request, output).await,
            Err(CommandError::NotImplemented(name)) => {
                warn!(command = %name, "Sub-command is not implemented");
                self.recover(
                    request,
                    DispatchStatus::FeaturePending,
                    format!(":construction: `{name}` is not available yet."),
                )
                .await
            }
            Err(CommandError::Rejected(message)) => {
                self.recover(request, DispatchStatus::Rejected, message).await
            }
            Err(err) => Err(err),
        }
    }

    fn unsupported_message(&self) -> String {
        format!(
            "Invalid sub-command. Supported sub-commands are: {}",
            self.registry.aliases().join(", ")
        )
    }

    async fn deliver(
        &self,
        request: &SlashCommandRequest,
        output: HandlerOutput,
    ) -> Result<DispatchOutcome, CommandError> {
        let channel_ack = match &output.immediate {
            Some(post) => {
                let ack = self.notifier.send_immediate(post).await?;
                info!(channel = %post.channel, status = ack.status, "Posted channel notification");
                Some(ack)
            }
            None => None,
        };
        let webhook_ack = match &output.deferred {
            Some(reply) if !request.response_url.is_empty() => {
                Some(self.notifier.send_deferred(&request.response_url, reply).await?)
            }
            _ => None,
        };
        Ok(DispatchOutcome {
            status: DispatchStatus::Handled,
            blocks: output.blocks,
            channel_ack,
            webhook_ack,
        })
    }

    /// Answer a request that could not be handled with one explanatory block.
    async fn recover(
        &self,
        request: &SlashCommandRequest,
        status: DispatchStatus,
        message: String,
    ) -> Result<DispatchOutcome, CommandError> {
        let blocks = vec![Block::section(message)];
        let webhook_ack = if request.response_url.is_empty() {
            None
        } else {
            let reply = WebhookReply::ephemeral(blocks.clone());
            Some(self.notifier.send_deferred(&request.response_url, &reply).await?)
        };
        Ok(DispatchOutcome {
            status,
            blocks,
            channel_ack: None,
            webhook_ack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_registry;
    use crate::testing::{Fixture, RecordingNotifier};
    use chrono::TimeZone;
    use kippo_core::AttendanceCategory;

    fn fixed_clock() -> DateTime<Utc> {
        // 2024-03-05 10:00 at +09:00
        Utc.with_ymd_and_hms(2024, 3, 5, 1, 0, 0).unwrap()
    }

    fn dispatcher(fixture: &Fixture) -> Dispatcher {
        Dispatcher::new(
            fixture.organization.clone(),
            Arc::new(default_registry().unwrap()),
            fixture.store.clone(),
            fixture.notifier.clone(),
            AttendanceSettings::default(),
        )
        .unwrap()
        .with_clock(fixed_clock)
    }

    fn request(text: &str) -> SlashCommandRequest {
        SlashCommandRequest {
            command: "/kippo".into(),
            text: text.into(),
            response_url: "https://hooks.slack.test/response".into(),
            user_name: "alice".into(),
            channel_name: "general".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = AttendanceSettings::default();
        assert_eq!(settings.utc_offset.local_minus_utc(), 9 * 3600);
        assert_eq!(settings.cancel_window_minutes, 5);
        assert_eq!(settings.image_refresh_days, 7);
    }

    #[test]
    fn test_new_rejects_incomplete_organization() {
        let fixture = Fixture::new();
        let mut organization = fixture.organization.clone();
        organization.slack_signing_secret.clear();
        let result = Dispatcher::new(
            organization,
            Arc::new(default_registry().unwrap()),
            fixture.store.clone(),
            fixture.notifier.clone(),
            AttendanceSettings::default(),
        );
        match result {
            Err(CommandError::Configuration(message)) => {
                assert!(message.contains("slack_signing_secret"))
            }
            _ => panic!("expected a configuration error"),
        }
    }

    #[tokio::test]
    async fn test_list_commands_returns_block_per_command() {
        let fixture = Fixture::new();
        let dispatcher = dispatcher(&fixture);
        let outcome = dispatcher.dispatch(&request("list-commands")).await.unwrap();

        assert_eq!(outcome.status, DispatchStatus::Handled);
        assert_eq!(outcome.blocks.len(), dispatcher.registry().len());
        assert!(outcome.channel_ack.is_none());
        assert!(outcome.webhook_ack.unwrap().is_ok());

        let replies = fixture.notifier.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "https://hooks.slack.test/response");
    }

    #[tokio::test]
    async fn test_command_is_persisted_and_marked_valid() {
        let fixture = Fixture::new();
        let dispatcher = dispatcher(&fixture);
        dispatcher.dispatch(&request("commands")).await.unwrap();

        let commands = fixture.store.slack_commands().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].sub_command, "commands");
        assert!(commands[0].is_valid);
        assert_eq!(commands[0].payload_str("channel_name"), Some("general"));
    }

    #[tokio::test]
    async fn test_unknown_alias_is_recovered() {
        let fixture = Fixture::new();
        let dispatcher = dispatcher(&fixture);
        let outcome = dispatcher.dispatch(&request("dance now")).await.unwrap();

        assert_eq!(outcome.status, DispatchStatus::UnknownAlias);
        assert_eq!(outcome.blocks.len(), 1);
        let text = outcome.blocks[0].text().unwrap();
        assert!(text.starts_with("Invalid sub-command."));
        assert!(text.contains("clock-in"));
        assert!(outcome.webhook_ack.is_some());

        // The command is still recorded, but never marked valid.
        let commands = fixture.store.slack_commands().unwrap();
        assert_eq!(commands.len(), 1);
        assert!(!commands[0].is_valid);
    }

    #[tokio::test]
    async fn test_empty_text_is_unknown_alias() {
        let fixture = Fixture::new();
        let outcome = dispatcher(&fixture).dispatch(&request("   ")).await.unwrap();
        assert_eq!(outcome.status, DispatchStatus::UnknownAlias);
        assert!(fixture.store.slack_commands().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_implemented_becomes_feature_pending() {
        let fixture = Fixture::new();
        let outcome = dispatcher(&fixture)
            .dispatch(&request("list-project-status"))
            .await
            .unwrap();
        assert_eq!(outcome.status, DispatchStatus::FeaturePending);
        assert!(outcome.blocks[0].text().unwrap().contains("list-project-status"));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let fixture = Fixture::new();
        let mut req = request("clock-in");
        req.user_name = "mallory".into();
        let outcome = dispatcher(&fixture).dispatch(&req).await.unwrap();
        assert_eq!(outcome.status, DispatchStatus::UnknownUser);
        assert!(fixture.store.slack_commands().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_slash_command() {
        let fixture = Fixture::new();
        let mut req = request("clock-in");
        req.command = "/other".into();
        let outcome = dispatcher(&fixture).dispatch(&req).await.unwrap();
        assert_eq!(outcome.status, DispatchStatus::UnknownCommand);
        assert!(fixture.notifier.posts().is_empty());
    }

    #[tokio::test]
    async fn test_clock_in_sends_both_notifications() {
        let fixture = Fixture::new();
        let outcome = dispatcher(&fixture).dispatch(&request("clock-in")).await.unwrap();

        assert_eq!(outcome.status, DispatchStatus::Handled);
        assert!(outcome.channel_ack.is_some());
        assert!(outcome.webhook_ack.is_some());

        let posts = fixture.notifier.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].channel, "#attendance");
        assert_eq!(posts[0].token, "xoxb-test");

        let latest = fixture
            .store
            .latest_attendance(fixture.organization.id, fixture.user.id)
            .unwrap()
            .unwrap();
        assert_eq!(latest.category, AttendanceCategory::Start);
        assert_eq!(latest.entry_datetime, fixed_clock());
    }

    #[tokio::test]
    async fn test_rejected_transition_is_recovered() {
        let fixture = Fixture::new();
        let outcome = dispatcher(&fixture).dispatch(&request("clock-out")).await.unwrap();
        assert_eq!(outcome.status, DispatchStatus::Rejected);
        assert!(fixture.notifier.posts().is_empty());
        assert_eq!(fixture.notifier.replies().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_response_url_skips_webhook() {
        let fixture = Fixture::new();
        let mut req = request("dance");
        req.response_url.clear();
        let outcome = dispatcher(&fixture).dispatch(&req).await.unwrap();
        assert_eq!(outcome.status, DispatchStatus::UnknownAlias);
        assert!(outcome.webhook_ack.is_none());
        assert!(fixture.notifier.replies().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_propagates() {
        let fixture = Fixture::with_notifier(RecordingNotifier::failing());
        let result = dispatcher(&fixture).dispatch(&request("commands")).await;
        assert!(matches!(result, Err(CommandError::Other(_))));
    }
}
