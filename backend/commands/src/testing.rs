//! Test doubles shared by the handler and dispatcher tests.
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use kippo_core::{
    Ack, AttendanceCategory, AttendanceRecord, ChannelPost, KippoUser, Notifier, Organization,
    OrganizationMembership, SlackCommand, Store, WebhookReply,
};
use kippo_store::SqliteStore;
use uuid::Uuid;

use crate::dispatch::{AttendanceSettings, CommandContext, CommandHandler, HandlerOutput};
use crate::error::CommandError;
use crate::extract::leading_alias;
use crate::registry::{default_registry, CommandRegistry};

pub(crate) const RESPONSE_URL: &str = "https://hooks.slack.test/response";
pub(crate) const IMAGE_URL: &str = "https://img.slack.test/alice_192.png";

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub(crate) struct RecordingNotifier {
    posts: Mutex<Vec<ChannelPost>>,
    replies: Mutex<Vec<(String, WebhookReply)>>,
    image_lookups: Mutex<Vec<String>>,
    image_url: Option<String>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::build(Some(IMAGE_URL.to_string()), false)
    }

    pub fn without_image() -> Self {
        Self::build(None, false)
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self::build(None, true)
    }

    fn build(image_url: Option<String>, fail: bool) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            image_lookups: Mutex::new(Vec::new()),
            image_url,
            fail,
        }
    }

    pub fn posts(&self) -> Vec<ChannelPost> {
        self.posts.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<(String, WebhookReply)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn image_lookups(&self) -> Vec<String> {
        self.image_lookups.lock().unwrap().clone()
    }
}

fn ok_ack() -> Ack {
    Ack {
        status: 200,
        body: "ok".into(),
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_immediate(&self, post: &ChannelPost) -> Result<Ack> {
        if self.fail {
            bail!("chat.postMessage unavailable");
        }
        self.posts.lock().unwrap().push(post.clone());
        Ok(ok_ack())
    }

    async fn send_deferred(&self, response_url: &str, reply: &WebhookReply) -> Result<Ack> {
        if self.fail {
            bail!("webhook unavailable");
        }
        self.replies
            .lock()
            .unwrap()
            .push((response_url.to_string(), reply.clone()));
        Ok(ok_ack())
    }

    async fn user_image_url(&self, _token: &str, slack_user_id: &str) -> Result<Option<String>> {
        self.image_lookups
            .lock()
            .unwrap()
            .push(slack_user_id.to_string());
        if self.fail {
            bail!("users.info unavailable");
        }
        Ok(self.image_url.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// One organization with one member ("alice"), backed by an in-memory store.
pub(crate) struct Fixture {
    pub store: Arc<SqliteStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub registry: CommandRegistry,
    pub settings: AttendanceSettings,
    pub organization: Organization,
    pub user: KippoUser,
    pub membership: OrganizationMembership,
    /// 2024-03-05 10:00 +09:00 unless overridden.
    pub now: DateTime<FixedOffset>,
}

pub(crate) fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

pub(crate) fn jst_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    jst().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let store = SqliteStore::in_memory().unwrap();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: "acme".into(),
            slack_api_token: "xoxb-test".into(),
            slack_signing_secret: "signing-secret".into(),
            slack_command_name: "kippo".into(),
            slack_attendance_report_channel: "#attendance".into(),
            slack_weekly_project_report_channel: "#weekly".into(),
        };
        store.upsert_organization(&organization).unwrap();

        let now = jst_at(2024, 3, 5, 10, 0);
        let (user, membership) =
            add_member(&store, &organization, "alice", "Alice", Some("U0ALICE"), now);

        Self {
            store: Arc::new(store),
            notifier: Arc::new(notifier),
            registry: default_registry().unwrap(),
            settings: AttendanceSettings::default(),
            organization,
            user,
            membership,
            now,
        }
    }

    pub fn at(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    pub fn add_member(
        &self,
        username: &str,
        display_name: &str,
        slack_user_id: Option<&str>,
    ) -> (KippoUser, OrganizationMembership) {
        add_member(
            &self.store,
            &self.organization,
            username,
            display_name,
            slack_user_id,
            self.now,
        )
    }

    pub fn record(&self, user: &KippoUser, category: AttendanceCategory, at: DateTime<FixedOffset>) -> AttendanceRecord {
        let record = AttendanceRecord::new(self.organization.id, user.id, category, at);
        self.store.insert_attendance(&record).unwrap();
        record
    }

    /// Record an entry for alice.
    pub fn clock(&self, category: AttendanceCategory, at: DateTime<FixedOffset>) -> AttendanceRecord {
        self.record(&self.user, category, at)
    }

    pub fn latest(&self) -> Option<AttendanceRecord> {
        self.store
            .latest_attendance(self.organization.id, self.user.id)
            .unwrap()
    }

    pub async fn run(&self, handler: &dyn CommandHandler, text: &str) -> Result<HandlerOutput, CommandError> {
        self.run_in_channel(handler, text, "general").await
    }

    pub async fn run_in_channel(
        &self,
        handler: &dyn CommandHandler,
        text: &str,
        channel_name: &str,
    ) -> Result<HandlerOutput, CommandError> {
        let command = self.command(text, channel_name);
        let ctx = CommandContext {
            organization: &self.organization,
            user: &self.user,
            membership: &self.membership,
            command: &command,
            store: self.store.as_ref(),
            notifier: self.notifier.as_ref(),
            registry: &self.registry,
            settings: &self.settings,
            now: self.now,
        };
        handler.handle(&ctx).await
    }

    /// Persist a command as the dispatcher would.
    pub fn command(&self, text: &str, channel_name: &str) -> SlackCommand {
        let alias = leading_alias(text).unwrap_or_default();
        let command = SlackCommand::new(
            self.organization.id,
            self.user.id,
            alias,
            text,
            RESPONSE_URL,
            serde_json::json!({ "channel_name": channel_name }),
        );
        self.store.insert_slack_command(&command).unwrap();
        command
    }

    pub fn command_is_valid(&self) -> bool {
        self.store
            .slack_commands()
            .unwrap()
            .last()
            .map(|c| c.is_valid)
            .unwrap_or(false)
    }
}

fn add_member(
    store: &SqliteStore,
    organization: &Organization,
    username: &str,
    display_name: &str,
    slack_user_id: Option<&str>,
    now: DateTime<FixedOffset>,
) -> (KippoUser, OrganizationMembership) {
    let user = KippoUser {
        id: Uuid::new_v4(),
        username: username.into(),
        display_name: display_name.into(),
    };
    store.upsert_user(&user).unwrap();
    let membership = OrganizationMembership {
        organization_id: organization.id,
        user_id: user.id,
        slack_username: username.into(),
        slack_user_id: slack_user_id.map(str::to_string),
        slack_image_url: None,
        updated_at: now.with_timezone(&Utc),
    };
    store.upsert_membership(&membership).unwrap();
    (user, membership)
}

/// The user-facing message of a declined request.
pub(crate) fn rejection(result: Result<HandlerOutput, CommandError>) -> String {
    match result {
        Err(CommandError::Rejected(message)) => message,
        Err(other) => panic!("expected a rejection, got error: {other}"),
        Ok(output) => panic!("expected a rejection, got output: {output:?}"),
    }
}

/// Text of the first reply block.
pub(crate) fn reply_text(output: &HandlerOutput) -> String {
    output.blocks[0].text().unwrap_or_default().to_string()
}
