use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::commands::{Command, CommandContext};
use crate::config::AnalyzerConfig;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    answer: Option<String>,
}

/// Default fallback handler: relays the whole message to the chat backend
/// and sends its answer back.
pub struct AiCommand {
    client: reqwest::Client,
    config: AnalyzerConfig,
}

impl AiCommand {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        debug!("Forwarding prompt to chat backend");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("prompt", prompt)])
            .send()
            .await
            .context("Failed to reach the chat backend")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat backend error ({}): {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat response")?;

        Ok(parsed.answer.unwrap_or_default())
    }
}

#[async_trait]
impl Command for AiCommand {
    fn name(&self) -> &str {
        "ai"
    }

    fn description(&self) -> &str {
        "Ask the assistant anything"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let prompt = ctx.args.join(" ");
        if prompt.trim().is_empty() {
            ctx.sender
                .send_text(&ctx.user_id, "What would you like to ask?")
                .await?;
            return Ok(());
        }

        let answer = self.ask(&prompt).await?;
        if answer.is_empty() {
            ctx.sender
                .send_text(&ctx.user_id, "I couldn't come up with an answer, sorry.")
                .await?;
        } else {
            ctx.sender.send_text(&ctx.user_id, &answer).await?;
        }

        Ok(())
    }
}
