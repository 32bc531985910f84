//! Whole-database JSON snapshots, gzip-compressed and dumped to or restored
//! from an object store.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use kippo_core::{
    AttendanceRecord, KippoError, KippoProject, KippoUser, ObjectStore, Organization,
    OrganizationMembership, PersonalHoliday, ProjectStatus, SlackCommand, Store,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sqlite::SqliteStore;

/// Every table of the store at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    pub organizations: Vec<Organization>,
    pub users: Vec<KippoUser>,
    pub memberships: Vec<OrganizationMembership>,
    pub slack_commands: Vec<SlackCommand>,
    pub attendance_records: Vec<AttendanceRecord>,
    pub personal_holidays: Vec<PersonalHoliday>,
    pub projects: Vec<KippoProject>,
    pub project_statuses: Vec<ProjectStatus>,
}

impl Snapshot {
    /// Number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.organizations.len()
            + self.users.len()
            + self.memberships.len()
            + self.slack_commands.len()
            + self.attendance_records.len()
            + self.personal_holidays.len()
            + self.projects.len()
            + self.project_statuses.len()
    }
}

/// Object key of a dump taken at `at`: `{prefix}all_{YYYYmmdd_HHMMSS}.json.gz`.
pub fn dump_key(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}all_{}.json.gz", at.format("%Y%m%d_%H%M%S"))
}

/// Gzip-compressed JSON of `snapshot`.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, KippoError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(snapshot)?)?;
    Ok(encoder.finish()?)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, KippoError> {
    let mut json = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

impl SqliteStore {
    pub fn export_snapshot(&self) -> anyhow::Result<Snapshot> {
        Ok(Snapshot {
            created_at: Utc::now(),
            organizations: self.list_organizations()?,
            users: self.list_users()?,
            memberships: self.list_memberships()?,
            slack_commands: self.slack_commands()?,
            attendance_records: self.list_attendance()?,
            personal_holidays: self.list_holidays()?,
            projects: self.list_projects()?,
            project_statuses: self.list_project_statuses()?,
        })
    }

    /// Upsert every record of the snapshot. Existing rows with the same id
    /// are replaced; other rows are left alone.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<usize> {
        self.conn()?.execute_batch("BEGIN")?;
        let result = self.import_records(snapshot);
        let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        self.conn()?.execute_batch(finish)?;
        result?;
        Ok(snapshot.record_count())
    }

    fn import_records(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        for org in &snapshot.organizations {
            self.upsert_organization(org)?;
        }
        for user in &snapshot.users {
            self.upsert_user(user)?;
        }
        for membership in &snapshot.memberships {
            self.upsert_membership(membership)?;
        }
        for command in &snapshot.slack_commands {
            self.insert_slack_command(command)?;
        }
        for record in &snapshot.attendance_records {
            self.insert_attendance(record)?;
        }
        for holiday in &snapshot.personal_holidays {
            self.insert_holiday(holiday)?;
        }
        for project in &snapshot.projects {
            self.upsert_project(project)?;
        }
        for status in &snapshot.project_statuses {
            self.insert_project_status(status)?;
        }
        Ok(())
    }
}

/// Write a snapshot of `store` into `bucket` and return its key.
///
/// The bucket must already exist.
pub async fn dump_to_object_store(
    store: &SqliteStore,
    objects: &dyn ObjectStore,
    bucket: &str,
    key_prefix: &str,
) -> Result<String, KippoError> {
    let snapshot = store.export_snapshot()?;
    let key = dump_key(key_prefix, snapshot.created_at);
    let bytes = encode_snapshot(&snapshot)?;
    let size = bytes.len();
    objects.put(bucket, &key, bytes).await?;
    info!(bucket, key = %key, size, records = snapshot.record_count(), "Dumped database snapshot");
    Ok(key)
}

/// Restore the snapshot stored at `key`, returning the number of records.
pub async fn load_from_object_store(
    store: &SqliteStore,
    objects: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<usize, KippoError> {
    let bytes = objects.get(bucket, key).await?;
    let snapshot = decode_snapshot(&bytes)?;
    let count = store.import_snapshot(&snapshot)?;
    info!(bucket, key, records = count, "Loaded database snapshot");
    Ok(count)
}
