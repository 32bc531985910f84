//! Sync configured organizations, members and projects into the store.
//!
//! Records are matched by natural key (organization name, username, project
//! name) so repeated syncs update in place and keep ids stable.

use anyhow::{Context, Result};
use chrono::Utc;
use kippo_core::{KippoProject, KippoUser, Organization, OrganizationMembership, Store};
use tracing::info;
use uuid::Uuid;

use crate::schema::{KippoConfig, MemberConfig, OrganizationConfig, ProjectConfig};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub organizations: usize,
    pub members: usize,
    pub projects: usize,
}

/// Write every configured organization into `store` and return them as stored.
pub fn sync_into_store(
    config: &KippoConfig,
    store: &dyn Store,
) -> Result<(Vec<Organization>, SyncSummary)> {
    let mut summary = SyncSummary::default();
    let mut organizations = Vec::with_capacity(config.organizations.len());
    for org_config in &config.organizations {
        let organization = sync_organization(org_config, store)
            .with_context(|| format!("Failed to sync organization '{}'", org_config.name))?;
        for member in &org_config.members {
            sync_member(&organization, member, store)
                .with_context(|| format!("Failed to sync member '{}'", member.username))?;
        }
        for project in &org_config.projects {
            sync_project(&organization, project, store)
                .with_context(|| format!("Failed to sync project '{}'", project.name))?;
        }
        summary.organizations += 1;
        summary.members += org_config.members.len();
        summary.projects += org_config.projects.len();
        organizations.push(organization);
    }
    info!(
        organizations = summary.organizations,
        members = summary.members,
        projects = summary.projects,
        "Synced configuration into store"
    );
    Ok((organizations, summary))
}

fn sync_organization(config: &OrganizationConfig, store: &dyn Store) -> Result<Organization> {
    let id = match config.id {
        Some(id) => id,
        None => store
            .find_organization_by_name(&config.name)?
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4),
    };
    let organization = Organization {
        id,
        name: config.name.clone(),
        slack_api_token: config.slack_api_token.clone(),
        slack_signing_secret: config.slack_signing_secret.clone(),
        slack_command_name: config.slack_command_name.clone(),
        slack_attendance_report_channel: config.slack_attendance_report_channel.clone(),
        slack_weekly_project_report_channel: config.slack_weekly_project_report_channel.clone(),
    };
    store.upsert_organization(&organization)?;
    Ok(organization)
}

fn sync_member(organization: &Organization, config: &MemberConfig, store: &dyn Store) -> Result<()> {
    let id = store
        .find_user_by_username(&config.username)?
        .map(|existing| existing.id)
        .unwrap_or_else(Uuid::new_v4);
    let user = KippoUser {
        id,
        username: config.username.clone(),
        display_name: config
            .display_name
            .clone()
            .unwrap_or_else(|| config.username.clone()),
    };
    store.upsert_user(&user)?;

    // Keep the cached image unless the Slack account changed.
    let existing = store.get_membership(organization.id, user.id)?;
    let (slack_image_url, updated_at) = match existing {
        Some(m) if m.slack_user_id == config.slack_user_id => (m.slack_image_url, m.updated_at),
        _ => (None, Utc::now()),
    };
    store.upsert_membership(&OrganizationMembership {
        organization_id: organization.id,
        user_id: user.id,
        slack_username: config.slack_username.clone(),
        slack_user_id: config.slack_user_id.clone(),
        slack_image_url,
        updated_at,
    })
}

fn sync_project(organization: &Organization, config: &ProjectConfig, store: &dyn Store) -> Result<()> {
    let id = store
        .find_project_by_name(organization.id, &config.name)?
        .map(|existing| existing.id)
        .unwrap_or_else(Uuid::new_v4);
    store.upsert_project(&KippoProject {
        id,
        organization_id: organization.id,
        name: config.name.clone(),
        slack_channel_name: config.slack_channel_name.clone(),
        is_closed: config.is_closed,
        display_as_active: config.display_as_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kippo_store::SqliteStore;

    fn config() -> KippoConfig {
        let yaml = r##"
organizations:
  - name: acme
    slack_api_token: xoxb-1
    slack_signing_secret: secret
    slack_command_name: kippo
    slack_attendance_report_channel: "#attendance"
    members:
      - username: alice
        display_name: Alice
        slack_username: alice.s
        slack_user_id: U1
      - username: bob
        slack_username: bob
    projects:
      - name: Apollo
        slack_channel_name: proj-apollo
"##;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_sync_creates_records() {
        let store = SqliteStore::in_memory().unwrap();
        let (orgs, summary) = sync_into_store(&config(), &store).unwrap();
        assert_eq!(summary, SyncSummary { organizations: 1, members: 2, projects: 1 });

        let org = &orgs[0];
        let (alice, membership) = store
            .find_member_by_slack_username(org.id, "alice.s")
            .unwrap()
            .unwrap();
        assert_eq!(alice.display_name, "Alice");
        assert_eq!(membership.slack_user_id.as_deref(), Some("U1"));
        let bob = store.find_user_by_username("bob").unwrap().unwrap();
        assert_eq!(bob.display_name, "bob");
        assert!(store.active_project_by_channel(org.id, "proj-apollo").unwrap().is_some());
    }

    #[test]
    fn test_resync_keeps_ids_and_cached_image() {
        let store = SqliteStore::in_memory().unwrap();
        let (first, _) = sync_into_store(&config(), &store).unwrap();
        let alice = store.find_user_by_username("alice").unwrap().unwrap();
        store
            .update_membership_image(first[0].id, alice.id, Some("https://img/a.png"), Utc::now())
            .unwrap();

        let mut changed = config();
        changed.organizations[0].slack_api_token = "xoxb-2".into();
        changed.organizations[0].projects[0].is_closed = true;
        let (second, _) = sync_into_store(&changed, &store).unwrap();

        assert_eq!(second[0].id, first[0].id);
        assert_eq!(store.list_organizations().unwrap().len(), 1);
        assert_eq!(store.get_organization(first[0].id).unwrap().unwrap().slack_api_token, "xoxb-2");
        assert_eq!(store.find_user_by_username("alice").unwrap().unwrap().id, alice.id);
        let membership = store.get_membership(first[0].id, alice.id).unwrap().unwrap();
        assert_eq!(membership.slack_image_url.as_deref(), Some("https://img/a.png"));
        assert!(store.active_project_by_channel(first[0].id, "proj-apollo").unwrap().is_none());
        assert_eq!(store.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_explicit_id_is_used() {
        let store = SqliteStore::in_memory().unwrap();
        let mut cfg = config();
        let id = Uuid::new_v4();
        cfg.organizations[0].id = Some(id);
        let (orgs, _) = sync_into_store(&cfg, &store).unwrap();
        assert_eq!(orgs[0].id, id);
        assert!(store.get_organization(id).unwrap().is_some());
    }
}
