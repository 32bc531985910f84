/// SQLite-backed persistence for organizations, members, commands,
/// attendance, holidays and projects.
///
/// A single `rusqlite::Connection` is shared behind a mutex; every `Store`
/// call takes the lock for the duration of one statement (or one transaction
/// for snapshot imports).
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use kippo_core::{
    AttendanceRecord, KippoProject, KippoUser, Organization, OrganizationMembership,
    PersonalHoliday, ProjectStatus, SlackCommand, Store,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tracing::{debug, info};
use uuid::Uuid;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS organizations (
        id                                  TEXT PRIMARY KEY,
        name                                TEXT NOT NULL UNIQUE,
        slack_api_token                     TEXT NOT NULL,
        slack_signing_secret                TEXT NOT NULL,
        slack_command_name                  TEXT NOT NULL,
        slack_attendance_report_channel     TEXT NOT NULL,
        slack_weekly_project_report_channel TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS users (
        id           TEXT PRIMARY KEY,
        username     TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS memberships (
        organization_id TEXT NOT NULL,
        user_id         TEXT NOT NULL,
        slack_username  TEXT NOT NULL,
        slack_user_id   TEXT,
        slack_image_url TEXT,
        updated_at      TEXT NOT NULL,
        PRIMARY KEY (organization_id, user_id)
    );
    CREATE INDEX IF NOT EXISTS idx_memberships_slack_username
        ON memberships(organization_id, slack_username);
    CREATE TABLE IF NOT EXISTS slack_commands (
        id              TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        user_id         TEXT NOT NULL,
        sub_command     TEXT NOT NULL,
        text            TEXT NOT NULL,
        response_url    TEXT NOT NULL,
        payload         TEXT NOT NULL,
        is_valid        INTEGER NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS attendance_records (
        id              TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        created_by      TEXT NOT NULL,
        category        TEXT NOT NULL,
        entry_datetime  TEXT NOT NULL,
        entry_ts        INTEGER NOT NULL,
        created_at      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_attendance_user
        ON attendance_records(organization_id, created_by, entry_ts);
    CREATE TABLE IF NOT EXISTS personal_holidays (
        id       TEXT PRIMARY KEY,
        user_id  TEXT NOT NULL,
        day      TEXT NOT NULL,
        is_half  INTEGER NOT NULL,
        duration INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_holidays_user_day ON personal_holidays(user_id, day);
    CREATE TABLE IF NOT EXISTS projects (
        id                 TEXT PRIMARY KEY,
        organization_id    TEXT NOT NULL,
        name               TEXT NOT NULL,
        slack_channel_name TEXT,
        is_closed          INTEGER NOT NULL,
        display_as_active  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS project_statuses (
        id         TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        created_by TEXT NOT NULL,
        comment    TEXT NOT NULL,
        created_at TEXT NOT NULL
    );";

const ORGANIZATION_COLUMNS: &str = "id, name, slack_api_token, slack_signing_secret, slack_command_name, \
     slack_attendance_report_channel, slack_weekly_project_report_channel";
const MEMBERSHIP_COLUMNS: &str =
    "organization_id, user_id, slack_username, slack_user_id, slack_image_url, updated_at";
const COMMAND_COLUMNS: &str =
    "id, organization_id, user_id, sub_command, text, response_url, payload, is_valid, created_at";
const ATTENDANCE_COLUMNS: &str =
    "id, organization_id, created_by, category, entry_datetime, created_at";
const PROJECT_COLUMNS: &str =
    "id, organization_id, name, slack_channel_name, is_closed, display_as_active";

impl SqliteStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL journal")?;
        let store = Self::with_connection(conn)?;
        info!(path = ?path.as_ref(), "SqliteStore opened");
        Ok(store)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize kippo schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }

    fn query_rows<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }

    fn query_one<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        let conn = self.conn()?;
        Ok(conn.query_row(sql, params, map).optional()?)
    }

    // -- Listing, used by snapshots and tests ------------------------------

    pub fn list_users(&self) -> Result<Vec<KippoUser>> {
        self.query_rows(
            "SELECT id, username, display_name FROM users ORDER BY username",
            params![],
            user_from_row,
        )
    }

    pub fn list_memberships(&self) -> Result<Vec<OrganizationMembership>> {
        self.query_rows(
            &format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships ORDER BY organization_id, slack_username"),
            params![],
            membership_from_row,
        )
    }

    /// Every recorded slash command, oldest first.
    pub fn slack_commands(&self) -> Result<Vec<SlackCommand>> {
        self.query_rows(
            &format!("SELECT {COMMAND_COLUMNS} FROM slack_commands ORDER BY rowid"),
            params![],
            command_from_row,
        )
    }

    pub fn list_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        self.query_rows(
            &format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance_records ORDER BY entry_ts, rowid"),
            params![],
            attendance_from_row,
        )
    }

    pub fn list_holidays(&self) -> Result<Vec<PersonalHoliday>> {
        self.query_rows(
            "SELECT id, user_id, day, is_half, duration FROM personal_holidays ORDER BY day, rowid",
            params![],
            holiday_from_row,
        )
    }

    pub fn list_projects(&self) -> Result<Vec<KippoProject>> {
        self.query_rows(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY rowid"),
            params![],
            project_from_row,
        )
    }

    /// Status comments of one project, oldest first.
    pub fn project_statuses(&self, project_id: Uuid) -> Result<Vec<ProjectStatus>> {
        self.query_rows(
            "SELECT id, project_id, created_by, comment, created_at
             FROM project_statuses WHERE project_id = ?1 ORDER BY rowid",
            params![project_id.to_string()],
            project_status_from_row,
        )
    }

    pub fn list_project_statuses(&self) -> Result<Vec<ProjectStatus>> {
        self.query_rows(
            "SELECT id, project_id, created_by, comment, created_at FROM project_statuses ORDER BY rowid",
            params![],
            project_status_from_row,
        )
    }
}

// ---------------------------------------------------------------------------
// Store implementation
// ---------------------------------------------------------------------------

impl Store for SqliteStore {
    fn upsert_organization(&self, org: &Organization) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO organizations (id, name, slack_api_token, slack_signing_secret, slack_command_name,
                 slack_attendance_report_channel, slack_weekly_project_report_channel)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 slack_api_token = excluded.slack_api_token,
                 slack_signing_secret = excluded.slack_signing_secret,
                 slack_command_name = excluded.slack_command_name,
                 slack_attendance_report_channel = excluded.slack_attendance_report_channel,
                 slack_weekly_project_report_channel = excluded.slack_weekly_project_report_channel",
            params![
                org.id.to_string(),
                org.name,
                org.slack_api_token,
                org.slack_signing_secret,
                org.slack_command_name,
                org.slack_attendance_report_channel,
                org.slack_weekly_project_report_channel,
            ],
        )?;
        debug!(organization = %org.name, "Upserted organization");
        Ok(())
    }

    fn get_organization(&self, id: Uuid) -> Result<Option<Organization>> {
        self.query_one(
            &format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = ?1"),
            params![id.to_string()],
            organization_from_row,
        )
    }

    fn find_organization_by_name(&self, name: &str) -> Result<Option<Organization>> {
        self.query_one(
            &format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE name = ?1"),
            params![name],
            organization_from_row,
        )
    }

    fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.query_rows(
            &format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations ORDER BY name"),
            params![],
            organization_from_row,
        )
    }

    fn upsert_user(&self, user: &KippoUser) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO users (id, username, display_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 display_name = excluded.display_name",
            params![user.id.to_string(), user.username, user.display_name],
        )?;
        Ok(())
    }

    fn get_user(&self, id: Uuid) -> Result<Option<KippoUser>> {
        self.query_one(
            "SELECT id, username, display_name FROM users WHERE id = ?1",
            params![id.to_string()],
            user_from_row,
        )
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<KippoUser>> {
        self.query_one(
            "SELECT id, username, display_name FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
    }

    fn upsert_membership(&self, membership: &OrganizationMembership) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO memberships (organization_id, user_id, slack_username, slack_user_id,
                 slack_image_url, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(organization_id, user_id) DO UPDATE SET
                 slack_username = excluded.slack_username,
                 slack_user_id = excluded.slack_user_id,
                 slack_image_url = excluded.slack_image_url,
                 updated_at = excluded.updated_at",
            params![
                membership.organization_id.to_string(),
                membership.user_id.to_string(),
                membership.slack_username,
                membership.slack_user_id,
                membership.slack_image_url,
                membership.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationMembership>> {
        self.query_one(
            &format!(
                "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE organization_id = ?1 AND user_id = ?2"
            ),
            params![organization_id.to_string(), user_id.to_string()],
            membership_from_row,
        )
    }

    fn find_member_by_slack_username(
        &self,
        organization_id: Uuid,
        slack_username: &str,
    ) -> Result<Option<(KippoUser, OrganizationMembership)>> {
        self.query_one(
            "SELECT m.organization_id, m.user_id, m.slack_username, m.slack_user_id,
                    m.slack_image_url, m.updated_at, u.id, u.username, u.display_name
             FROM memberships m JOIN users u ON u.id = m.user_id
             WHERE m.organization_id = ?1 AND m.slack_username = ?2
             LIMIT 1",
            params![organization_id.to_string(), slack_username],
            |row| {
                let membership = membership_from_row(row)?;
                let user = KippoUser {
                    id: uuid_at(row, 6)?,
                    username: row.get(7)?,
                    display_name: row.get(8)?,
                };
                Ok((user, membership))
            },
        )
    }

    fn update_membership_image(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        image_url: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn()?.execute(
            "UPDATE memberships SET slack_image_url = ?3, updated_at = ?4
             WHERE organization_id = ?1 AND user_id = ?2",
            params![
                organization_id.to_string(),
                user_id.to_string(),
                image_url,
                updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn insert_slack_command(&self, command: &SlackCommand) -> Result<()> {
        self.conn()?.execute(
            &format!(
                "INSERT OR REPLACE INTO slack_commands ({COMMAND_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                command.id.to_string(),
                command.organization_id.to_string(),
                command.user_id.to_string(),
                command.sub_command,
                command.text,
                command.response_url,
                serde_json::to_string(&command.payload)?,
                command.is_valid,
                command.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn mark_slack_command_valid(&self, id: Uuid) -> Result<()> {
        self.conn()?.execute(
            "UPDATE slack_commands SET is_valid = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    fn insert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO attendance_records
                 (id, organization_id, created_by, category, entry_datetime, entry_ts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.organization_id.to_string(),
                record.created_by.to_string(),
                record.category.as_str(),
                record.entry_datetime.to_rfc3339(),
                record.entry_datetime.timestamp_millis(),
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn latest_attendance(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<AttendanceRecord>> {
        self.query_one(
            &format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
                 WHERE organization_id = ?1 AND created_by = ?2
                 ORDER BY entry_ts DESC, rowid DESC LIMIT 1"
            ),
            params![organization_id.to_string(), user_id.to_string()],
            attendance_from_row,
        )
    }

    fn latest_attendance_since(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        since: DateTime<FixedOffset>,
    ) -> Result<Option<AttendanceRecord>> {
        self.query_one(
            &format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
                 WHERE organization_id = ?1 AND created_by = ?2 AND entry_ts >= ?3
                 ORDER BY entry_ts DESC, rowid DESC LIMIT 1"
            ),
            params![
                organization_id.to_string(),
                user_id.to_string(),
                since.timestamp_millis()
            ],
            attendance_from_row,
        )
    }

    fn latest_attendance_per_user_since(
        &self,
        organization_id: Uuid,
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<AttendanceRecord>> {
        let records = self.query_rows(
            &format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
                 WHERE organization_id = ?1 AND entry_ts >= ?2
                 ORDER BY entry_ts, rowid"
            ),
            params![organization_id.to_string(), since.timestamp_millis()],
            attendance_from_row,
        )?;

        let mut latest: Vec<AttendanceRecord> = Vec::new();
        let mut index_by_user: HashMap<Uuid, usize> = HashMap::new();
        for record in records {
            match index_by_user.get(&record.created_by) {
                Some(&index) => latest[index] = record,
                None => {
                    index_by_user.insert(record.created_by, latest.len());
                    latest.push(record);
                }
            }
        }
        latest.sort_by_key(|r| r.entry_datetime);
        Ok(latest)
    }

    fn delete_attendance(&self, id: Uuid) -> Result<bool> {
        let deleted = self.conn()?.execute(
            "DELETE FROM attendance_records WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    fn insert_holiday(&self, holiday: &PersonalHoliday) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO personal_holidays (id, user_id, day, is_half, duration)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                holiday.id.to_string(),
                holiday.user_id.to_string(),
                holiday.day.to_string(),
                holiday.is_half,
                holiday.duration,
            ],
        )?;
        Ok(())
    }

    fn holidays_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PersonalHoliday>> {
        self.query_rows(
            "SELECT id, user_id, day, is_half, duration FROM personal_holidays
             WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
             ORDER BY day, rowid",
            params![user_id.to_string(), from.to_string(), to.to_string()],
            holiday_from_row,
        )
    }

    fn upsert_project(&self, project: &KippoProject) -> Result<()> {
        self.conn()?.execute(
            &format!(
                "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     organization_id = excluded.organization_id,
                     name = excluded.name,
                     slack_channel_name = excluded.slack_channel_name,
                     is_closed = excluded.is_closed,
                     display_as_active = excluded.display_as_active"
            ),
            params![
                project.id.to_string(),
                project.organization_id.to_string(),
                project.name,
                project.slack_channel_name,
                project.is_closed,
                project.display_as_active,
            ],
        )?;
        Ok(())
    }

    fn find_project_by_name(&self, organization_id: Uuid, name: &str) -> Result<Option<KippoProject>> {
        self.query_one(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE organization_id = ?1 AND name = ?2"),
            params![organization_id.to_string(), name],
            project_from_row,
        )
    }

    fn active_project_by_channel(
        &self,
        organization_id: Uuid,
        channel_name: &str,
    ) -> Result<Option<KippoProject>> {
        self.query_one(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE organization_id = ?1 AND slack_channel_name = ?2
                   AND is_closed = 0 AND display_as_active = 1
                 ORDER BY rowid LIMIT 1"
            ),
            params![organization_id.to_string(), channel_name],
            project_from_row,
        )
    }

    fn insert_project_status(&self, status: &ProjectStatus) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO project_statuses (id, project_id, created_by, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                status.id.to_string(),
                status.project_id.to_string(),
                status.created_by.to_string(),
                status.comment,
                status.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row deserialization helpers
// ---------------------------------------------------------------------------

fn conversion_error(index: usize, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

fn uuid_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(index)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(index, e))
}

fn fixed_at(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<FixedOffset>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw).map_err(|e| conversion_error(index, e))
}

fn utc_at(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(fixed_at(row, index)?.with_timezone(&Utc))
}

fn organization_from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        slack_api_token: row.get(2)?,
        slack_signing_secret: row.get(3)?,
        slack_command_name: row.get(4)?,
        slack_attendance_report_channel: row.get(5)?,
        slack_weekly_project_report_channel: row.get(6)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<KippoUser> {
    Ok(KippoUser {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<OrganizationMembership> {
    Ok(OrganizationMembership {
        organization_id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        slack_username: row.get(2)?,
        slack_user_id: row.get(3)?,
        slack_image_url: row.get(4)?,
        updated_at: utc_at(row, 5)?,
    })
}

fn command_from_row(row: &Row<'_>) -> rusqlite::Result<SlackCommand> {
    let payload: String = row.get(6)?;
    Ok(SlackCommand {
        id: uuid_at(row, 0)?,
        organization_id: uuid_at(row, 1)?,
        user_id: uuid_at(row, 2)?,
        sub_command: row.get(3)?,
        text: row.get(4)?,
        response_url: row.get(5)?,
        payload: serde_json::from_str(&payload).map_err(|e| conversion_error(6, e))?,
        is_valid: row.get(7)?,
        created_at: utc_at(row, 8)?,
    })
}

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    let category: String = row.get(3)?;
    Ok(AttendanceRecord {
        id: uuid_at(row, 0)?,
        organization_id: uuid_at(row, 1)?,
        created_by: uuid_at(row, 2)?,
        category: category.parse().map_err(|e: String| conversion_error(3, e))?,
        entry_datetime: fixed_at(row, 4)?,
        created_at: utc_at(row, 5)?,
    })
}

fn holiday_from_row(row: &Row<'_>) -> rusqlite::Result<PersonalHoliday> {
    let day: String = row.get(2)?;
    Ok(PersonalHoliday {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        day: day.parse().map_err(|e: chrono::ParseError| conversion_error(2, e))?,
        is_half: row.get(3)?,
        duration: row.get(4)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<KippoProject> {
    Ok(KippoProject {
        id: uuid_at(row, 0)?,
        organization_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        slack_channel_name: row.get(3)?,
        is_closed: row.get(4)?,
        display_as_active: row.get(5)?,
    })
}

fn project_status_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectStatus> {
    Ok(ProjectStatus {
        id: uuid_at(row, 0)?,
        project_id: uuid_at(row, 1)?,
        created_by: uuid_at(row, 2)?,
        comment: row.get(3)?,
        created_at: utc_at(row, 4)?,
    })
}
