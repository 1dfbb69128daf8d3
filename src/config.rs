use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub messenger: MessengerConfig,
    #[serde(default = "default_analyzer_config")]
    pub analyzer: AnalyzerConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessengerConfig {
    /// Page access token passed as a query parameter on every Graph API call.
    pub page_access_token: String,
    /// Token echoed back during the webhook verification handshake.
    pub verify_token: String,
    /// Sender ids allowed to run admin-gated commands.
    #[serde(default)]
    pub admin_ids: Vec<String>,
    #[serde(default = "default_graph_api_base")]
    pub graph_api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyzerConfig {
    #[serde(default = "default_analyzer_base_url")]
    pub base_url: String,
    /// Image-generation endpoint; the 'imagine' command is only registered
    /// when this is set.
    #[serde(default)]
    pub image_gen_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_analyzer_base_url() -> String {
    "https://sandipbaruwal.onrender.com/gemini2".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_analyzer_config() -> AnalyzerConfig {
    AnalyzerConfig {
        base_url: default_analyzer_base_url(),
        image_gen_url: None,
    }
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind: default_bind(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}
