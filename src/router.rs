use std::sync::Arc;

use tracing::{error, info};

use crate::analyzer::ImageAnalyzer;
use crate::commands::{Access, CommandContext, CommandRegistry};
use crate::event::InboundEvent;
use crate::messenger::MessageSender;
use crate::state::{ConversationLog, StateStore, UserState};

const MSG_QUIT_MODE: &str = "🔓 You've left the current mode. Type 'help' to continue.";
const MSG_IMAGE_RECEIVED: &str =
    "📷 Image received. What would you like to know about it? Ask me anything!";
const MSG_ANALYZING: &str = "🔍 Analyzing the image... ⏳";
const MSG_NO_ANALYSIS: &str = "❌ No useful information found for this image.";
const MSG_ANALYSIS_FAILED: &str = "⚠️ Something went wrong while analyzing the image.";
const MSG_NOT_AUTHORIZED: &str = "❌ You're not allowed to use this command.";
const MSG_COMMAND_FAILED: &str = "⚠️ Something went wrong while running that command.";
const MSG_FALLBACK_FAILED: &str = "⚠️ Something went wrong while handling your request.";
const MSG_NOT_UNDERSTOOD: &str = "❓ Sorry, I didn't understand that. Try a valid command.";

/// The message router: one instance per process, shared across webhook
/// tasks. All collaborators are injected; the router owns no I/O itself.
pub struct Router {
    registry: CommandRegistry,
    states: Arc<dyn StateStore>,
    log: ConversationLog,
    sender: Arc<dyn MessageSender>,
    analyzer: Arc<dyn ImageAnalyzer>,
    admin_ids: Vec<String>,
}

impl Router {
    pub fn new(
        registry: CommandRegistry,
        states: Arc<dyn StateStore>,
        sender: Arc<dyn MessageSender>,
        analyzer: Arc<dyn ImageAnalyzer>,
        admin_ids: Vec<String>,
    ) -> Self {
        Self {
            registry,
            states,
            log: ConversationLog::new(),
            sender,
            analyzer,
            admin_ids,
        }
    }

    /// Process one inbound event. Never returns an error: every failure is
    /// logged and, where appropriate, reported to the user as a short
    /// non-technical message.
    pub async fn handle_event(&self, event: InboundEvent) {
        let Some(sender_id) = event.sender_id() else {
            error!("Invalid event: missing sender id");
            return;
        };
        let sender_id = sender_id.to_string();

        self.log
            .append_user_message(&sender_id, event.text().unwrap_or("Image"))
            .await;

        if let Some(image_url) = event.image_url() {
            self.await_image_prompt(&sender_id, image_url).await;
        } else if let Some(text) = event.text() {
            let text = text.trim().to_string();
            info!("Received message from {}: {}", sender_id, text);

            if text.eq_ignore_ascii_case("stop") {
                self.states.clear(&sender_id).await;
                self.notify(&sender_id, MSG_QUIT_MODE).await;
                return;
            }

            if let UserState::AwaitingImagePrompt { image_url } =
                self.states.get(&sender_id).await
            {
                self.analyze_image(&sender_id, &image_url, &text).await;
                return;
            }

            self.dispatch(&sender_id, &text, &event).await;
        }
        // Neither text nor attachment: nothing to do.
    }

    /// Record the image and ask the user what to do with it.
    async fn await_image_prompt(&self, sender_id: &str, image_url: &str) {
        self.states
            .set(
                sender_id,
                UserState::AwaitingImagePrompt {
                    image_url: image_url.to_string(),
                },
            )
            .await;
        self.notify(sender_id, MSG_IMAGE_RECEIVED).await;
    }

    /// Run the analyzer with the user's prompt and relay the outcome.
    /// The awaiting-prompt state is deliberately left in place, so follow-up
    /// questions keep targeting the same image until the user types "stop".
    async fn analyze_image(&self, sender_id: &str, image_url: &str, prompt: &str) {
        self.notify(sender_id, MSG_ANALYZING).await;

        match self.analyzer.analyze(image_url, prompt).await {
            Ok(result) if !result.is_empty() => {
                self.notify(sender_id, &format!("📄 Analysis result:\n{}", result))
                    .await;
            }
            Ok(_) => {
                self.notify(sender_id, MSG_NO_ANALYSIS).await;
            }
            Err(e) => {
                error!("Image analysis failed: {:#}", e);
                self.notify(sender_id, MSG_ANALYSIS_FAILED).await;
            }
        }
    }

    /// Parse the text as a command invocation, falling back to the default
    /// handler when the first token matches nothing.
    async fn dispatch(&self, sender_id: &str, text: &str, event: &InboundEvent) {
        let mut tokens = text.split_whitespace();
        let Some(first) = tokens.next() else {
            return;
        };
        let args: Vec<String> = tokens.map(|t| t.to_string()).collect();

        if let Some(command) = self.registry.resolve(first) {
            if command.access() == Access::Admin
                && !self.admin_ids.iter().any(|id| id == sender_id)
            {
                self.notify(sender_id, MSG_NOT_AUTHORIZED).await;
                return;
            }

            self.states
                .set(
                    sender_id,
                    UserState::LockedCommand {
                        command: command.name().to_lowercase(),
                    },
                )
                .await;

            let ctx = CommandContext {
                user_id: sender_id.to_string(),
                args,
                sender: Arc::clone(&self.sender),
                event: event.clone(),
            };
            if let Err(e) = command.execute(&ctx).await {
                error!("Command '{}' failed: {:#}", command.name(), e);
                self.notify(sender_id, MSG_COMMAND_FAILED).await;
            }
        } else if let Some(fallback) = self.registry.fallback() {
            // The fallback receives the whole message as one argument.
            let ctx = CommandContext {
                user_id: sender_id.to_string(),
                args: vec![text.to_string()],
                sender: Arc::clone(&self.sender),
                event: event.clone(),
            };
            if let Err(e) = fallback.execute(&ctx).await {
                error!("Fallback command '{}' failed: {:#}", fallback.name(), e);
                self.notify(sender_id, MSG_FALLBACK_FAILED).await;
            }
        } else {
            self.notify(sender_id, MSG_NOT_UNDERSTOOD).await;
        }
    }

    /// Fire-and-forget text send; delivery failures only reach the log.
    async fn notify(&self, sender_id: &str, text: &str) {
        if let Err(e) = self.sender.send_text(sender_id, text).await {
            error!("Failed to deliver message to {}: {:#}", sender_id, e);
        }
    }

    #[cfg(test)]
    pub(crate) fn state_store(&self) -> &Arc<dyn StateStore> {
        &self.states
    }

    #[cfg(test)]
    pub(crate) fn conversation_log(&self) -> &ConversationLog {
        &self.log
    }
}
