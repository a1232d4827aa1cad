//! Communication channels (LINE).
//!
//! Inbound webhook payloads are reduced to a single message event; replies go out
//! through a [`ReplyHandle`] so the gateway does not depend on a concrete client.

mod handle;
mod inbound;
mod line;

pub use handle::ReplyHandle;
pub use inbound::{first_message_event, MessageEvent};
pub use line::{
    LineClient, LineError, ReplyPayload, TextMessage, WebhookEvent, WebhookMessage,
    WebhookPayload, REPLY_PATH,
};
