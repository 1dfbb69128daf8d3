use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::event::WebhookEnvelope;
use crate::router::Router;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub verify_token: String,
}

/// Query parameters of the platform's verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    mode: String,
    #[serde(rename = "hub.verify_token", default)]
    verify_token: String,
    #[serde(rename = "hub.challenge", default)]
    challenge: String,
}

fn verification_response(params: &VerifyParams, expected_token: &str) -> Result<String, StatusCode> {
    if params.mode == "subscribe" && params.verify_token == expected_token {
        Ok(params.challenge.clone())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, StatusCode> {
    match verification_response(&params, &state.verify_token) {
        Ok(challenge) => {
            info!("Webhook verified");
            Ok(challenge)
        }
        Err(status) => {
            warn!("Webhook verification rejected (mode: {})", params.mode);
            Err(status)
        }
    }
}

/// Event intake. Each messaging event is processed on its own task; the
/// handshake with the platform always succeeds so it does not retry
/// deliveries we have already accepted.
async fn receive_events(
    State(state): State<AppState>,
    Json(envelope): Json<WebhookEnvelope>,
) -> (StatusCode, &'static str) {
    if envelope.object != "page" {
        warn!("Ignoring webhook for object: {}", envelope.object);
        return (StatusCode::OK, "EVENT_RECEIVED");
    }

    for entry in envelope.entry {
        for event in entry.messaging {
            let router = Arc::clone(&state.router);
            tokio::spawn(async move {
                router.handle_event(event).await;
            });
        }
    }

    (StatusCode::OK, "EVENT_RECEIVED")
}

/// Serve the webhook until the process is stopped.
pub async fn run(bind: &str, state: AppState) -> Result<()> {
    let app = axum::Router::new()
        .route("/webhook", get(verify_webhook).post(receive_events))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind webhook server to {}", bind))?;

    info!("Webhook server listening on {}", bind);
    axum::serve(listener, app)
        .await
        .context("Webhook server exited")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: &str, token: &str, challenge: &str) -> VerifyParams {
        VerifyParams {
            mode: mode.to_string(),
            verify_token: token.to_string(),
            challenge: challenge.to_string(),
        }
    }

    #[test]
    fn test_handshake_echoes_challenge_on_token_match() {
        let response = verification_response(&params("subscribe", "SECRET", "12345"), "SECRET");
        assert_eq!(response.unwrap(), "12345");
    }

    #[test]
    fn test_handshake_rejects_wrong_token() {
        let response = verification_response(&params("subscribe", "WRONG", "12345"), "SECRET");
        assert_eq!(response.unwrap_err(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_handshake_rejects_wrong_mode() {
        let response = verification_response(&params("unsubscribe", "SECRET", "12345"), "SECRET");
        assert_eq!(response.unwrap_err(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_query_param_names_with_dots() {
        let params: VerifyParams = serde_urlencoded::from_str(
            "hub.mode=subscribe&hub.verify_token=SECRET&hub.challenge=abc",
        )
        .unwrap();
        assert_eq!(params.mode, "subscribe");
        assert_eq!(params.verify_token, "SECRET");
        assert_eq!(params.challenge, "abc");
    }
}
