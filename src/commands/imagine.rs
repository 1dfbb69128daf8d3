use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::commands::{Command, CommandContext};

#[derive(Debug, Deserialize)]
struct ImagineResponse {
    #[serde(default)]
    url: Option<String>,
}

/// Generates an image from a text prompt through the configured backend
/// and sends it back as an image attachment.
pub struct ImagineCommand {
    client: reqwest::Client,
    endpoint: String,
}

impl ImagineCommand {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Command for ImagineCommand {
    fn name(&self) -> &str {
        "imagine"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let prompt = ctx.args.join(" ");
        if prompt.trim().is_empty() {
            ctx.sender
                .send_text(&ctx.user_id, "Usage: imagine <description of the image>.")
                .await?;
            return Ok(());
        }

        debug!("Requesting image generation");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("prompt", prompt.as_str())])
            .send()
            .await
            .context("Failed to reach the image generation backend")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Image generation error ({}): {}", status, body);
        }

        let parsed: ImagineResponse = response
            .json()
            .await
            .context("Failed to parse image generation response")?;

        match parsed.url {
            Some(url) => ctx.sender.send_image(&ctx.user_id, &url).await?,
            None => {
                ctx.sender
                    .send_text(&ctx.user_id, "❌ I couldn't generate that image, sorry.")
                    .await?;
            }
        }

        Ok(())
    }
}
