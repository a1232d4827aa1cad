//! Gateway HTTP server: LINE webhook and health probe.

use crate::channels::{first_message_event, LineClient, ReplyHandle, WebhookPayload};
use crate::config::{self, Config};
use crate::store::{MessageStore, SqlMessageStore, StoreError, StoredMessage};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Route LINE is configured to POST to.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Shared state for the gateway. Read-only after start-up.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MessageStore>,
    pub replier: Arc<dyn ReplyHandle>,
}

/// What happened to one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Body did not parse, had no leading message event, or there was no text to send.
    Ignored,
    Replied,
    /// Reply call failed; delivery is still acknowledged.
    ReplyFailed,
}

/// Stored text wins when present; otherwise echo the inbound text. None when neither exists.
pub fn resolve_reply_text(stored: Option<StoredMessage>, inbound: Option<&str>) -> Option<String> {
    stored
        .and_then(|m| m.text)
        .or_else(|| inbound.map(str::to_string))
}

fn warn_not_message_event(body: &[u8]) {
    log::warn!(
        "webhook event is not a message event; body = {}",
        String::from_utf8_lossy(body)
    );
}

/// Handle one webhook body: parse, take the first message event, resolve the reply text, reply.
/// Only a store fault is an error; a failed reply is logged and reported as `ReplyFailed`.
pub async fn process_webhook(
    state: &GatewayState,
    body: &[u8],
) -> Result<WebhookOutcome, StoreError> {
    let payload: WebhookPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("webhook body did not parse: {}", e);
            warn_not_message_event(body);
            return Ok(WebhookOutcome::Ignored);
        }
    };
    let Some(event) = first_message_event(&payload) else {
        warn_not_message_event(body);
        return Ok(WebhookOutcome::Ignored);
    };

    let stored = state.store.first_message().await?;
    if stored.is_none() {
        log::debug!("no stored message, echoing inbound text");
    }
    let Some(text) = resolve_reply_text(stored, event.text.as_deref()) else {
        log::warn!(
            "no stored message and no inbound text to echo; body = {}",
            String::from_utf8_lossy(body)
        );
        return Ok(WebhookOutcome::Ignored);
    };

    match state.replier.reply(&event.reply_token, &text).await {
        Ok(()) => {
            log::info!("{} reply sent", state.replier.id());
            Ok(WebhookOutcome::Replied)
        }
        Err(e) => {
            log::warn!("{} reply failed: {}", state.replier.id(), e);
            Ok(WebhookOutcome::ReplyFailed)
        }
    }
}

/// POST /webhook: always 200 with an empty body unless the message store fails.
async fn line_webhook(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    log::info!("webhook request received ({} bytes)", body.len());
    match process_webhook(&state, &body).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            log::error!("webhook failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route(WEBHOOK_PATH, post(line_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Fails before binding when the channel access token or the database connection is not configured.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let settings = config::resolve_gateway_settings(&config)?;

    let store = Arc::new(SqlMessageStore::connect(&settings.database_url).await?);
    log::info!("line channel replying via {}", settings.api_base);
    let line = Arc::new(LineClient::new(settings.access_token, settings.api_base));

    let state = GatewayState {
        config: Arc::new(config.clone()),
        store: store.clone(),
        replier: line,
    };

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    store.close().await;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}
