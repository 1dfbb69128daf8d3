mod analyzer;
mod commands;
mod config;
mod event;
mod messenger;
mod router;
mod state;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::analyzer::{GeminiAnalyzer, ImageAnalyzer};
use crate::commands::{
    ai::AiCommand, gemini::GeminiCommand, help::HelpCommand, imagine::ImagineCommand,
    CommandRegistry,
};
use crate::config::Config;
use crate::messenger::GraphApiSender;
use crate::router::Router;
use crate::state::MemoryStateStore;
use crate::webhook::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Graph API: {}", config.messenger.graph_api_base);
    info!("  Admins: {:?}", config.messenger.admin_ids);
    info!("  Listening on: {}", config.server.bind);

    let sender = Arc::new(GraphApiSender::new(config.messenger.clone()));
    let analyzer: Arc<dyn ImageAnalyzer> = Arc::new(GeminiAnalyzer::new(config.analyzer.clone()));

    // Register command handlers. The router only ever sees the finished
    // registry, never how commands are discovered.
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(AiCommand::new(config.analyzer.clone())));
    registry.register(Arc::new(GeminiCommand::new(Arc::clone(&analyzer))));
    if let Some(image_gen_url) = config.analyzer.image_gen_url.clone() {
        registry.register(Arc::new(ImagineCommand::new(image_gen_url)));
    }
    registry.register(Arc::new(HelpCommand::new(registry.summaries())));
    info!("Commands registered: {}", registry.len());

    let router = Arc::new(Router::new(
        registry,
        Arc::new(MemoryStateStore::new()),
        sender,
        analyzer,
        config.messenger.admin_ids.clone(),
    ));

    info!("Bot is starting...");
    webhook::run(
        &config.server.bind,
        AppState {
            router,
            verify_token: config.messenger.verify_token.clone(),
        },
    )
    .await?;

    Ok(())
}
