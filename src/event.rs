use serde::Deserialize;

/// Top-level webhook body: one envelope may batch several page entries,
/// each carrying several messaging events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub messaging: Vec<InboundEvent>,
}

/// A single messaging event as delivered by the platform webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub message: Option<MessageContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Present when this message is a reply to an earlier one.
    #[serde(default)]
    pub reply_to: Option<ReplyTo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyTo {
    #[serde(default)]
    pub mid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: AttachmentPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default)]
    pub url: Option<String>,
}

impl InboundEvent {
    /// Sender id, or None when the event is malformed.
    pub fn sender_id(&self) -> Option<&str> {
        self.sender
            .as_ref()
            .map(|s| s.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// URL of the image attachment, if the first attachment is an image.
    pub fn image_url(&self) -> Option<&str> {
        self.message
            .as_ref()?
            .attachments
            .first()
            .filter(|a| a.kind == "image")
            .and_then(|a| a.payload.url.as_deref())
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_ref()?.text.as_deref()
    }

    /// Id of the message this one replies to, if any.
    pub fn reply_to_mid(&self) -> Option<&str> {
        self.message
            .as_ref()?
            .reply_to
            .as_ref()
            .map(|r| r.mid.as_str())
            .filter(|mid| !mid.is_empty())
    }
}
