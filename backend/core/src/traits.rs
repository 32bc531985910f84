use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use uuid::Uuid;

use crate::blocks::{Ack, ChannelPost, WebhookReply};
use crate::error::KippoError;
use crate::models::{
    AttendanceRecord, KippoProject, KippoUser, Organization, OrganizationMembership,
    PersonalHoliday, ProjectStatus, SlackCommand,
};

/// Persistence collaborator used by the command handlers.
///
/// Calls are blocking; implementations are expected to be cheap enough to run
/// inline within one dispatch.
pub trait Store: Send + Sync {
    // Organizations and members
    fn upsert_organization(&self, org: &Organization) -> Result<()>;
    fn get_organization(&self, id: Uuid) -> Result<Option<Organization>>;
    fn find_organization_by_name(&self, name: &str) -> Result<Option<Organization>>;
    fn list_organizations(&self) -> Result<Vec<Organization>>;
    fn upsert_user(&self, user: &KippoUser) -> Result<()>;
    fn get_user(&self, id: Uuid) -> Result<Option<KippoUser>>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<KippoUser>>;
    fn upsert_membership(&self, membership: &OrganizationMembership) -> Result<()>;
    fn get_membership(&self, organization_id: Uuid, user_id: Uuid)
        -> Result<Option<OrganizationMembership>>;
    fn find_member_by_slack_username(
        &self,
        organization_id: Uuid,
        slack_username: &str,
    ) -> Result<Option<(KippoUser, OrganizationMembership)>>;
    fn update_membership_image(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        image_url: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    // Slack commands
    fn insert_slack_command(&self, command: &SlackCommand) -> Result<()>;
    fn mark_slack_command_valid(&self, id: Uuid) -> Result<()>;

    // Attendance
    fn insert_attendance(&self, record: &AttendanceRecord) -> Result<()>;
    /// The user's record with the latest `entry_datetime`.
    fn latest_attendance(&self, organization_id: Uuid, user_id: Uuid)
        -> Result<Option<AttendanceRecord>>;
    /// Like [`Store::latest_attendance`], restricted to entries at or after `since`.
    fn latest_attendance_since(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        since: DateTime<FixedOffset>,
    ) -> Result<Option<AttendanceRecord>>;
    /// The latest record of every user with an entry at or after `since`.
    fn latest_attendance_per_user_since(
        &self,
        organization_id: Uuid,
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<AttendanceRecord>>;
    fn delete_attendance(&self, id: Uuid) -> Result<bool>;

    // Holidays
    fn insert_holiday(&self, holiday: &PersonalHoliday) -> Result<()>;
    fn holidays_between(&self, user_id: Uuid, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<PersonalHoliday>>;

    // Projects
    fn upsert_project(&self, project: &KippoProject) -> Result<()>;
    fn find_project_by_name(&self, organization_id: Uuid, name: &str)
        -> Result<Option<KippoProject>>;
    /// The first active project linked to the given Slack channel.
    fn active_project_by_channel(&self, organization_id: Uuid, channel_name: &str)
        -> Result<Option<KippoProject>>;
    fn insert_project_status(&self, status: &ProjectStatus) -> Result<()>;
}

/// Notification collaborator: delivers handler output to Slack.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a message to a channel right away.
    async fn send_immediate(&self, post: &ChannelPost) -> Result<Ack>;

    /// Reply to a slash command through its response URL.
    async fn send_deferred(&self, response_url: &str, reply: &WebhookReply) -> Result<Ack>;

    /// Look up the profile image of a Slack user.
    async fn user_image_url(&self, token: &str, slack_user_id: &str) -> Result<Option<String>>;
}

/// Key/object storage used by the dump and restore commands.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns `false` when the bucket already existed.
    async fn create_bucket(&self, bucket: &str) -> Result<bool, KippoError>;
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), KippoError>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, KippoError>;
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, KippoError>;
    /// Keys starting with `prefix`, sorted.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, KippoError>;
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), KippoError>;
}
