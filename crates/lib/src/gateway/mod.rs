//! Gateway: HTTP server hosting the LINE webhook.
//!
//! Single port serves the webhook (`POST /webhook`) and a health probe (`GET /`).

mod server;

pub use server::{
    process_webhook, resolve_reply_text, router, run_gateway, GatewayState, WebhookOutcome,
    WEBHOOK_PATH,
};
