//! Reply handle: the outbound half of a channel.

use async_trait::async_trait;

/// Sends a reply addressed by a platform reply token.
#[async_trait]
pub trait ReplyHandle: Send + Sync {
    /// Channel id (e.g. "line").
    fn id(&self) -> &str;
    /// Send `text` as the single reply to the event identified by `reply_token`.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), String>;
}
