use async_trait::async_trait;
use kippo_core::{Block, ProjectStatus};
use tracing::{error, info};

use crate::dispatch::{CommandContext, CommandHandler, HandlerOutput};
use crate::error::CommandError;
use crate::types::CommandDescriptor;

static PROJECT_STATUS: CommandDescriptor = CommandDescriptor {
    name: "project-status",
    description: "Post a status comment to the project linked to this channel. e.g. `COMMAND project-status {COMMENT}`",
    aliases: &["project-status", "projectstatus", "status"],
};

static LIST_PROJECT_STATUS: CommandDescriptor = CommandDescriptor {
    name: "list-project-status",
    description: "List the latest status of every active project. e.g. `COMMAND list-project-status`",
    aliases: &["list-project-status", "listprojectstatus", "list-status", "liststatus"],
};

pub struct ProjectStatusHandler;

#[async_trait]
impl CommandHandler for ProjectStatusHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &PROJECT_STATUS
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&PROJECT_STATUS)?;
        let comment = ctx.text_without_alias();
        let channel = ctx.command.payload_str("channel_name").unwrap_or_default();

        let Some(project) = ctx
            .store
            .active_project_by_channel(ctx.organization.id, channel)?
        else {
            error!(organization = %ctx.organization.name, channel, "No active project for channel");
            return Err(CommandError::Rejected(format!(
                ":warning: Project not found. The `{channel}` channel is not linked to an active project.\n\
                 (The project may be closed.)\n\
                 Check the project's `slack_channel_name` setting."
            )));
        };

        let status = ProjectStatus::new(project.id, ctx.user.id, comment.clone());
        ctx.store.insert_project_status(&status)?;
        info!(organization = %ctx.organization.name, project = %project.name, "Created project status");
        ctx.mark_valid()?;

        Ok(HandlerOutput::reply(vec![Block::section(format!(
            "> {comment}\nStatus registered for {}.\nA summary is posted to {} at the start of the week.",
            project.name, ctx.organization.slack_weekly_project_report_channel
        ))]))
    }
}

/// Declared so the aliases are reserved; listing is not available yet.
pub struct ListProjectStatusHandler;

#[async_trait]
impl CommandHandler for ListProjectStatusHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &LIST_PROJECT_STATUS
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&LIST_PROJECT_STATUS)?;
        Err(CommandError::NotImplemented(LIST_PROJECT_STATUS.name.to_string()))
    }
}
