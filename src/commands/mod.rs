pub mod ai;
pub mod gemini;
pub mod help;
pub mod imagine;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::event::InboundEvent;
use crate::messenger::MessageSender;

/// Name of the handler that receives unmatched messages.
pub const FALLBACK_COMMAND: &str = "ai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Everyone,
    Admin,
}

/// Everything a handler needs to act on one invocation.
pub struct CommandContext {
    pub user_id: String,
    pub args: Vec<String>,
    pub sender: Arc<dyn MessageSender>,
    pub event: InboundEvent,
}

/// A named, independently pluggable handler for one user intent.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn access(&self) -> Access {
        Access::Everyone
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Registry of all command handlers, built once at startup and handed to
/// the router by injection.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler keyed by its lower-cased name.
    /// Last registration for a given name wins.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let key = command.name().to_lowercase();
        info!("Registered command: {}", command.name());
        self.commands.insert(key, command);
    }

    /// Case-insensitive exact-match lookup.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_lowercase()).cloned()
    }

    pub fn fallback(&self) -> Option<Arc<dyn Command>> {
        self.resolve(FALLBACK_COMMAND)
    }

    /// (name, description) pairs for every registered handler, sorted by name.
    pub fn summaries(&self) -> Vec<(String, String)> {
        let mut list: Vec<(String, String)> = self
            .commands
            .values()
            .map(|c| (c.name().to_string(), c.description().to_string()))
            .collect();
        list.sort();
        list
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedCommand {
        name: &'static str,
        description: &'static str,
    }

    #[async_trait]
    impl Command for NamedCommand {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            self.description
        }

        async fn execute(&self, _ctx: &CommandContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(NamedCommand {
            name: "Help",
            description: "",
        }));

        assert!(registry.resolve("help").is_some());
        assert!(registry.resolve("HELP").is_some());
        assert!(registry.resolve("Help").is_some());
        assert!(registry.resolve("hel").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(NamedCommand {
            name: "echo",
            description: "first",
        }));
        registry.register(Arc::new(NamedCommand {
            name: "ECHO",
            description: "second",
        }));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("echo").unwrap().description(), "second");
    }

    #[test]
    fn test_fallback_resolves_ai() {
        let mut registry = CommandRegistry::new();
        assert!(registry.fallback().is_none());

        registry.register(Arc::new(NamedCommand {
            name: "ai",
            description: "default",
        }));
        assert_eq!(registry.fallback().unwrap().name(), "ai");
    }
}
