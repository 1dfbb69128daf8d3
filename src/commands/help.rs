use anyhow::Result;
use async_trait::async_trait;

use crate::commands::{Command, CommandContext};

/// Lists every registered command. Built from a registry snapshot taken at
/// startup, after all other handlers are registered.
pub struct HelpCommand {
    summaries: Vec<(String, String)>,
}

impl HelpCommand {
    pub fn new(mut summaries: Vec<(String, String)>) -> Self {
        summaries.push((
            "help".to_string(),
            "Show this list of commands".to_string(),
        ));
        summaries.sort();
        Self { summaries }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show this list of commands"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let mut text = String::from("Available commands:\n\n");
        for (name, description) in &self.summaries {
            text.push_str(&format!("  - {}: {}\n", name, description));
        }
        text.push_str("\nType 'stop' at any time to leave the current mode.");

        ctx.sender.send_text(&ctx.user_id, &text).await?;
        Ok(())
    }
}
