//! Command descriptors.
use serde::Serialize;

/// Static metadata of one command handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    /// Canonical display name (e.g. "clock-in").
    pub name: &'static str,
    /// Usage description; `COMMAND` stands for the organization's slash command.
    pub description: &'static str,
    /// Tokens a user may type to select this command.
    pub aliases: &'static [&'static str],
}

impl CommandDescriptor {
    pub fn accepts(&self, alias: &str) -> bool {
        self.aliases.contains(&alias.trim())
    }

    pub fn aliases_display(&self) -> String {
        self.aliases.join(", ")
    }

    /// Description with `COMMAND` replaced by the given slash command.
    pub fn description_for(&self, slash_command: &str) -> String {
        self.description.replace("COMMAND", slash_command)
    }
}
