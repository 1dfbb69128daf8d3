use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::MessengerConfig;

#[derive(Debug, Clone, Serialize)]
pub struct QuickReply {
    pub content_type: String,
    pub title: String,
    pub payload: String,
}

impl QuickReply {
    pub fn text(title: &str, payload: &str) -> Self {
        Self {
            content_type: "text".to_string(),
            title: title.to_string(),
            payload: payload.to_string(),
        }
    }
}

/// An outbound message before transport defaults are applied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<QuickReply>>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn image(url: &str) -> Self {
        Self {
            attachment: Some(json!({
                "type": "image",
                "payload": { "url": url, "is_reusable": true }
            })),
            ..Self::default()
        }
    }
}

/// Outbound delivery capability. Calls return a Result the router may
/// ignore; delivery failures must stay inside the implementation's log.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient_id: &str, message: OutboundMessage) -> Result<()>;

    /// Given a message id, the URL of the image attached to that message.
    async fn fetch_attachment_url(&self, mid: &str) -> Result<String>;

    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<()> {
        self.send(recipient_id, OutboundMessage::text(text)).await
    }

    async fn send_image(&self, recipient_id: &str, url: &str) -> Result<()> {
        self.send(recipient_id, OutboundMessage::image(url)).await
    }
}

#[derive(Debug, Serialize)]
struct SendPayload {
    recipient: Recipient,
    message: OutboundMessage,
}

#[derive(Debug, Serialize)]
struct Recipient {
    id: String,
}

pub struct GraphApiSender {
    client: reqwest::Client,
    config: MessengerConfig,
}

impl GraphApiSender {
    pub fn new(config: MessengerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Best-effort typing indicator; failures are logged and swallowed.
    async fn typing_on(&self, recipient_id: &str) {
        let url = format!("{}/me/messages", self.config.graph_api_base);
        let body = json!({
            "recipient": { "id": recipient_id },
            "sender_action": "typing_on",
        });

        let result = self
            .client
            .post(&url)
            .query(&[("access_token", &self.config.page_access_token)])
            .json(&body)
            .send()
            .await;

        if let Err(e) = result {
            warn!("Failed to send typing indicator: {}", e);
        }
    }
}

#[async_trait]
impl MessageSender for GraphApiSender {
    async fn send(&self, recipient_id: &str, mut message: OutboundMessage) -> Result<()> {
        if message.text.is_none() && message.attachment.is_none() {
            anyhow::bail!("Outbound message must carry text or an attachment");
        }

        self.typing_on(recipient_id).await;

        // Every message without explicit quick replies gets the Menu button.
        if message.quick_replies.is_none() {
            message.quick_replies = Some(vec![QuickReply::text("Menu", "MENU_PAYLOAD")]);
        }

        let payload = SendPayload {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            message,
        };

        let url = format!("{}/me/messages", self.config.graph_api_base);
        debug!("Sending message to {}", recipient_id);

        let response = self
            .client
            .post(&url)
            .query(&[("access_token", &self.config.page_access_token)])
            .json(&payload)
            .send()
            .await
            .context("Failed to reach the send API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Send API error ({}): {}", status, body);
        }

        Ok(())
    }

    async fn fetch_attachment_url(&self, mid: &str) -> Result<String> {
        if mid.is_empty() {
            anyhow::bail!("No message id provided");
        }

        let url = format!("{}/{}/attachments", self.config.graph_api_base, mid);
        let response = self
            .client
            .get(&url)
            .query(&[("access_token", &self.config.page_access_token)])
            .send()
            .await
            .context("Failed to fetch attachments")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Attachment API error ({}): {}", status, body);
        }

        let data: Value = response
            .json()
            .await
            .context("Failed to parse attachment response")?;

        data["data"][0]["image_data"]["url"]
            .as_str()
            .map(|s| s.to_string())
            .context("No image found in the replied message")
    }
}
