//! LINE channel: webhook payload types and the reply API client.

use crate::channels::handle::ReplyHandle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reply API path, relative to the API origin.
pub const REPLY_PATH: &str = "/v2/bot/message/reply";

/// Webhook POST body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One event of a webhook delivery (message, follow, unfollow, postback, ...).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub message: Option<WebhookMessage>,
}

/// Message object of a `message` event. Only text messages carry `text`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMessage {
    #[serde(default)]
    pub text: Option<String>,
}

/// Reply API request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    pub reply_token: String,
    pub messages: Vec<TextMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    #[serde(rename = "type", default = "text_type")]
    pub message_type: String,
    pub text: String,
}

fn text_type() -> String {
    "text".to_string()
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            message_type: text_type(),
            text: text.into(),
        }
    }
}

impl ReplyPayload {
    /// Single text message reply.
    pub fn text(reply_token: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reply_token: reply_token.into(),
            messages: vec![TextMessage::new(text)],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("line api error: {0}")]
    Api(String),
}

/// Client for the LINE Messaging API reply endpoint.
#[derive(Clone)]
pub struct LineClient {
    id: String,
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(access_token: String, base_url: String) -> Self {
        Self {
            id: "line".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    /// POST /v2/bot/message/reply with a bearer token.
    pub async fn reply(&self, payload: &ReplyPayload) -> Result<(), LineError> {
        let url = format!("{}{}", self.base_url, REPLY_PATH);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ReplyHandle for LineClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), String> {
        let payload = ReplyPayload::text(reply_token, text);
        LineClient::reply(self, &payload)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_payload_wire_shape() {
        let payload = ReplyPayload::text("token-1", "こんにちは");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "replyToken": "token-1",
                "messages": [{ "type": "text", "text": "こんにちは" }]
            })
        );
    }

    #[test]
    fn reply_payload_decodes_back() {
        let json = serde_json::to_string(&ReplyPayload::text("R", "T \"quoted\"\n")).unwrap();
        let decoded: ReplyPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.reply_token, "R");
        assert_eq!(decoded.messages.len(), 1);
        assert_eq!(decoded.messages[0].text, "T \"quoted\"\n");
    }

    #[test]
    fn webhook_payload_accepts_platform_fields() {
        let json = r#"{
            "destination": "Uxxxxxxxx",
            "events": [{
                "type": "message",
                "mode": "active",
                "timestamp": 1462629479859,
                "source": { "type": "user", "userId": "U4af4980629" },
                "webhookEventId": "01FZ74A0TDDPYRVKNK77XKC3ZR",
                "replyToken": "nHuyWiB7yP5Zw52FIkcQobQuGDXCTA",
                "message": { "id": "444573844083572737", "type": "text", "text": "Hello, world" }
            }]
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let event = &payload.events[0];
        assert_eq!(event.event_type, "message");
        assert_eq!(event.reply_token.as_deref(), Some("nHuyWiB7yP5Zw52FIkcQobQuGDXCTA"));
        assert_eq!(
            event.message.as_ref().and_then(|m| m.text.as_deref()),
            Some("Hello, world")
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = LineClient::new("tok".to_string(), "http://127.0.0.1:9/".to_string());
        assert_eq!(client.base_url, "http://127.0.0.1:9");
        assert_eq!(ReplyHandle::id(&client), "line");
    }
}
