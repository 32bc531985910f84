use async_trait::async_trait;
use kippo_core::Block;

use crate::dispatch::{CommandContext, CommandHandler, HandlerOutput};
use crate::error::CommandError;
use crate::types::CommandDescriptor;

static LIST_COMMANDS: CommandDescriptor = CommandDescriptor {
    name: "list-commands",
    description: "Show the available sub-commands. e.g. `COMMAND list-commands`",
    aliases: &["list-commands", "listcommands", "commands"],
};

pub struct ListCommandsHandler;

#[async_trait]
impl CommandHandler for ListCommandsHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &LIST_COMMANDS
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&LIST_COMMANDS)?;
        let slash_command = ctx.slash_command();
        let blocks = ctx
            .registry
            .list_all()
            .map(|descriptor| {
                Block::section(format!(
                    "*{}* - {}\nALIASES: {}",
                    descriptor.name,
                    descriptor.description_for(&slash_command),
                    descriptor.aliases_display()
                ))
            })
            .collect();
        ctx.mark_valid()?;
        Ok(HandlerOutput::reply(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_one_block_per_command() {
        let fixture = Fixture::new();
        let output = fixture.run(&ListCommandsHandler, "list-commands").await.unwrap();
        assert_eq!(output.blocks.len(), fixture.registry.len());
        assert_eq!(output.deferred.as_ref().unwrap().blocks, output.blocks);
        assert!(output.immediate.is_none());

        let last = output.blocks.last().unwrap().text().unwrap();
        assert_eq!(
            last,
            "*list-commands* - Show the available sub-commands. e.g. `/kippo list-commands`\n\
             ALIASES: list-commands, listcommands, commands"
        );
        assert!(output.blocks[0].text().unwrap().starts_with("*clock-in* - "));
    }
}
