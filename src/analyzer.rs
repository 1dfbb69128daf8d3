use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::AnalyzerConfig;

/// Image analysis capability: given an image URL and a free-text prompt,
/// returns a textual answer. An empty string means the backend had nothing
/// useful to say; transport failures are errors.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct AnalyzerResponse {
    #[serde(default)]
    answer: Option<String>,
}

pub struct GeminiAnalyzer {
    client: reqwest::Client,
    config: AnalyzerConfig,
}

impl GeminiAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image_url: &str, prompt: &str) -> Result<String> {
        debug!("Requesting image analysis: {}", image_url);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("url", image_url), ("prompt", prompt)])
            .send()
            .await
            .context("Failed to reach the analysis backend")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Analysis backend error ({}): {}", status, body);
        }

        let parsed: AnalyzerResponse = response
            .json()
            .await
            .context("Failed to parse analysis response")?;

        // A body without an answer field is an empty result, not an error.
        Ok(parsed.answer.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_with_answer() {
        let parsed: AnalyzerResponse =
            serde_json::from_str(r#"{ "answer": "a red bicycle" }"#).unwrap();
        assert_eq!(parsed.answer.as_deref(), Some("a red bicycle"));
    }

    #[test]
    fn test_response_without_answer_is_empty() {
        let parsed: AnalyzerResponse = serde_json::from_str(r#"{ "other": 1 }"#).unwrap();
        assert_eq!(parsed.answer.unwrap_or_default(), "");
    }
}
