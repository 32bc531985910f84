//! Alias → handler registry, built once at startup and read-only afterwards.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::CommandHandler;
use crate::error::CommandError;
use crate::handlers::builtin_handlers;
use crate::types::CommandDescriptor;

pub struct CommandRegistry {
    commands: Vec<Arc<dyn CommandHandler>>,
    by_alias: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            by_alias: HashMap::new(),
        }
    }

    /// Register a handler under all of its aliases.
    ///
    /// Nothing is registered when any alias collides, either with an existing
    /// entry or within the handler's own alias list.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), CommandError> {
        let descriptor = handler.descriptor();
        if descriptor.aliases.is_empty() {
            return Err(CommandError::EmptyAliases(descriptor.name.to_string()));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(descriptor.aliases.len());
        for alias in descriptor.aliases {
            let existing = match self.by_alias.get(alias) {
                Some(&index) => Some(self.commands[index].descriptor().name),
                None if seen.contains(alias) => Some(descriptor.name),
                None => None,
            };
            if let Some(existing) = existing {
                return Err(CommandError::DuplicateAlias {
                    alias: alias.to_string(),
                    command: descriptor.name.to_string(),
                    existing: existing.to_string(),
                });
            }
            seen.push(*alias);
        }

        let index = self.commands.len();
        for alias in descriptor.aliases {
            self.by_alias.insert(*alias, index);
        }
        debug!(command = descriptor.name, aliases = ?descriptor.aliases, "Registered command");
        self.commands.push(handler);
        Ok(())
    }

    /// Find the handler registered for `alias`.
    pub fn resolve(&self, alias: &str) -> Result<&Arc<dyn CommandHandler>, CommandError> {
        self.by_alias
            .get(alias.trim())
            .map(|&index| &self.commands[index])
            .ok_or_else(|| CommandError::UnknownAlias(alias.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list_all(&self) -> impl Iterator<Item = &CommandDescriptor> + '_ {
        self.commands.iter().map(|c| c.descriptor())
    }

    /// Every registered alias, grouped by command in registration order.
    pub fn aliases(&self) -> Vec<&'static str> {
        self.list_all().flat_map(|d| d.aliases.iter().copied()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the registry holding every built-in command.
///
/// Fails only when the built-in alias sets overlap, which must abort startup.
pub fn default_registry() -> Result<CommandRegistry, CommandError> {
    let mut registry = CommandRegistry::new();
    for handler in builtin_handlers() {
        registry.register(handler)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandContext, HandlerOutput};
    use async_trait::async_trait;

    struct StubHandler(CommandDescriptor);

    #[async_trait]
    impl CommandHandler for StubHandler {
        fn descriptor(&self) -> &CommandDescriptor {
            &self.0
        }

        async fn handle(&self, _ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
            Ok(HandlerOutput::default())
        }
    }

    fn stub(name: &'static str, aliases: &'static [&'static str]) -> Arc<dyn CommandHandler> {
        Arc::new(StubHandler(CommandDescriptor {
            name,
            description: "stub",
            aliases,
        }))
    }

    #[test]
    fn test_resolve_every_alias() {
        let mut registry = CommandRegistry::new();
        registry.register(stub("clock-in", &["clockin", "clock-in"])).unwrap();
        registry.register(stub("clock-out", &["clockout"])).unwrap();

        assert_eq!(registry.resolve("clockin").unwrap().descriptor().name, "clock-in");
        assert_eq!(registry.resolve("clock-in").unwrap().descriptor().name, "clock-in");
        assert_eq!(registry.resolve("clockout").unwrap().descriptor().name, "clock-out");
    }

    #[test]
    fn test_resolve_unknown_alias() {
        let mut registry = CommandRegistry::new();
        registry.register(stub("clock-in", &["clockin"])).unwrap();
        let err = registry.resolve("dance").err().unwrap();
        assert!(matches!(err, CommandError::UnknownAlias(ref a) if a == "dance"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(stub("clock-in", &["clockin", "start"])).unwrap();
        let err = registry.register(stub("begin", &["begin", "start"])).unwrap_err();
        match err {
            CommandError::DuplicateAlias { alias, command, existing } => {
                assert_eq!(alias, "start");
                assert_eq!(command, "begin");
                assert_eq!(existing, "clock-in");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The failed registration left nothing behind.
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("begin").is_err());
    }

    #[test]
    fn test_duplicate_alias_within_descriptor() {
        let mut registry = CommandRegistry::new();
        let err = registry.register(stub("echo", &["echo", "echo"])).unwrap_err();
        assert!(matches!(err, CommandError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_empty_aliases_rejected() {
        let mut registry = CommandRegistry::new();
        let err = registry.register(stub("silent", &[])).unwrap_err();
        assert!(matches!(err, CommandError::EmptyAliases(ref n) if n == "silent"));
    }

    #[test]
    fn test_list_all_in_registration_order() {
        let mut registry = CommandRegistry::new();
        registry.register(stub("b", &["b"])).unwrap();
        registry.register(stub("a", &["a", "aa"])).unwrap();
        let names: Vec<_> = registry.list_all().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.aliases(), vec!["b", "a", "aa"]);
    }

    #[test]
    fn test_default_registry_aliases_are_disjoint() {
        let registry = default_registry().unwrap();
        let aliases = registry.aliases();
        let mut unique = aliases.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(aliases.len(), unique.len());
        assert_eq!(registry.len(), 10);
        for descriptor in registry.list_all() {
            for alias in descriptor.aliases {
                assert_eq!(registry.resolve(alias).unwrap().descriptor(), descriptor);
            }
        }
    }
}
