use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;

use crate::analyzer::ImageAnalyzer;
use crate::commands::{Command, CommandContext};

/// Answers a question about an image the user replied to: looks up the
/// replied-to message's attachment and runs it through the analyzer.
pub struct GeminiCommand {
    analyzer: Arc<dyn ImageAnalyzer>,
}

impl GeminiCommand {
    pub fn new(analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl Command for GeminiCommand {
    fn name(&self) -> &str {
        "gemini"
    }

    fn description(&self) -> &str {
        "Reply to an image with 'gemini <question>' to ask about it"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let prompt = ctx.args.join(" ");
        if prompt.trim().is_empty() {
            ctx.sender
                .send_text(&ctx.user_id, "Usage: reply to an image with 'gemini <question>'.")
                .await?;
            return Ok(());
        }

        let Some(mid) = ctx.event.reply_to_mid() else {
            ctx.sender
                .send_text(
                    &ctx.user_id,
                    "Please reply to the image you want me to look at.",
                )
                .await?;
            return Ok(());
        };

        let image_url = ctx
            .sender
            .fetch_attachment_url(mid)
            .await
            .context("Failed to locate the replied-to image")?;

        let answer = self.analyzer.analyze(&image_url, &prompt).await?;
        if answer.is_empty() {
            ctx.sender
                .send_text(&ctx.user_id, "❌ No useful information found for this image.")
                .await?;
        } else {
            ctx.sender
                .send_text(&ctx.user_id, &format!("📄 Analysis result:\n{}", answer))
                .await?;
        }

        Ok(())
    }
}
