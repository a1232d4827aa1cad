//! Inbound message event: the first qualifying event of a webhook delivery.

use crate::channels::line::WebhookPayload;

/// Event type tag handled by the gateway.
const MESSAGE_EVENT: &str = "message";

/// A message event reduced to what the reply needs. `text` is None for non-text
/// messages (stickers, images, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub reply_token: String,
    pub text: Option<String>,
}

/// Only the first event is considered. Returns None when the list is empty, the first
/// event is not a `message`, or it has no reply token to answer with.
pub fn first_message_event(payload: &WebhookPayload) -> Option<MessageEvent> {
    let event = payload.events.first()?;
    if event.event_type != MESSAGE_EVENT {
        return None;
    }
    let reply_token = event.reply_token.as_ref()?;
    Some(MessageEvent {
        reply_token: reply_token.clone(),
        text: event.message.as_ref().and_then(|m| m.text.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WebhookPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn picks_first_message_event() {
        let payload = parse(
            r#"{"destination":"U0","events":[
                {"type":"message","replyToken":"r1","message":{"type":"text","id":"1","text":"hi"}},
                {"type":"message","replyToken":"r2","message":{"type":"text","id":"2","text":"second"}}
            ]}"#,
        );
        assert_eq!(
            first_message_event(&payload),
            Some(MessageEvent {
                reply_token: "r1".to_string(),
                text: Some("hi".to_string()),
            })
        );
    }

    #[test]
    fn ignores_when_first_event_is_not_message() {
        let payload = parse(
            r#"{"events":[
                {"type":"follow","replyToken":"r1"},
                {"type":"message","replyToken":"r2","message":{"text":"later"}}
            ]}"#,
        );
        assert_eq!(first_message_event(&payload), None);
    }

    #[test]
    fn ignores_empty_and_missing_events() {
        assert_eq!(first_message_event(&parse(r#"{"events":[]}"#)), None);
        assert_eq!(first_message_event(&parse(r#"{}"#)), None);
    }

    #[test]
    fn keeps_sticker_message_without_text() {
        let payload = parse(
            r#"{"events":[{"type":"message","replyToken":"r1","message":{"type":"sticker","id":"1","packageId":"446","stickerId":"1988"}}]}"#,
        );
        assert_eq!(
            first_message_event(&payload),
            Some(MessageEvent {
                reply_token: "r1".to_string(),
                text: None,
            })
        );
    }

    #[test]
    fn ignores_message_without_reply_token() {
        let payload = parse(r#"{"events":[{"type":"message","message":{"text":"hi"}}]}"#);
        assert_eq!(first_message_event(&payload), None);
    }
}
