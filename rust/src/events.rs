//! Inbound events from the ship's chat subscription.
//!
//! The wire format is a JSON object with exactly one key naming the event:
//!
//! ```json
//! {"message": {"conversation_id": "0v1.abc", "message": {"id": "1.2", ...}}}
//! {"sending": {"conversation_id": "0v1.abc", "identifier": "-3"}}
//! {"delivered": {"conversation_id": "0v1.abc", "identifier": "-3", "message_id": "1.9"}}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Rejection;
use crate::state::{Conversation, Message};

const EVENT_KEYS: &[&str] = &[
    "message",
    "sending",
    "delivered",
    "conversations",
    "message_list",
    "invite",
    "search_result",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Update {
    Message(MessageEvent),
    Sending(SendingAck),
    Delivered(DeliveredAck),
    Conversations(Vec<ChatSnapshot>),
    MessageList(MessageList),
    /// Payload is opaque to this core; an invite only triggers a refresh.
    Invite(Value),
    SearchResult(Vec<Message>),
}

impl Update {
    pub fn tag(&self) -> &'static str {
        match self {
            Update::Message(_) => "message",
            Update::Sending(_) => "sending",
            Update::Delivered(_) => "delivered",
            Update::Conversations(_) => "conversations",
            Update::MessageList(_) => "message_list",
            Update::Invite(_) => "invite",
            Update::SearchResult(_) => "search_result",
        }
    }

    /// Parses one raw event.
    ///
    /// `Ok(None)` means the event is well-formed JSON but names nothing this
    /// client handles (including `{}`), which callers ignore.
    pub fn parse(raw: &str) -> Result<Option<Self>, Rejection> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| Rejection::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Option<Self>, Rejection> {
        let Value::Object(mut object) = value else {
            return Err(Rejection::Malformed("expected a JSON object".into()));
        };
        let known: Vec<String> = object
            .keys()
            .filter(|k| EVENT_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        let key = match known.as_slice() {
            [] => return Ok(None),
            [key] => key.clone(),
            _ => {
                return Err(Rejection::Malformed(format!(
                    "expected one event, got {}",
                    known.join(", ")
                )))
            }
        };
        let body = object.remove(&key).unwrap_or(Value::Null);
        let mut tagged = Map::new();
        tagged.insert(key, body);
        serde_json::from_value(Value::Object(tagged))
            .map(Some)
            .map_err(|e| Rejection::Malformed(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageEvent {
    pub conversation_id: String,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendingAck {
    pub conversation_id: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveredAck {
    pub conversation_id: String,
    pub identifier: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageList {
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One row of a full conversation list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatSnapshot {
    pub conversation: Conversation,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unreads: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_event() {
        let raw = r#"{"message":{"conversation_id":"c1","message":
            {"id":"1.2","author":"~zod","kind":"text","content":"hi","timestamp":3}}}"#;
        let Some(Update::Message(ev)) = Update::parse(raw).unwrap() else {
            panic!("expected message event");
        };
        assert_eq!(ev.conversation_id, "c1");
        assert_eq!(ev.message.id, "1.2");
    }

    #[test]
    fn parses_acks() {
        let sending = Update::parse(r#"{"sending":{"conversation_id":"c1","identifier":"-1"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(sending.tag(), "sending");

        let delivered = Update::parse(
            r#"{"delivered":{"conversation_id":"c1","identifier":"-1","message_id":"4"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            delivered,
            Update::Delivered(DeliveredAck {
                conversation_id: "c1".into(),
                identifier: "-1".into(),
                message_id: Some("4".into()),
            })
        );
    }

    #[test]
    fn unknown_and_empty_events_are_ignored() {
        assert_eq!(Update::parse("{}").unwrap(), None);
        assert_eq!(Update::parse(r#"{"typing":{"ship":"~bus"}}"#).unwrap(), None);
    }

    #[test]
    fn bad_shapes_are_malformed() {
        assert!(matches!(
            Update::parse(r#"{"message":{"conversation_id":"c1"}}"#),
            Err(Rejection::Malformed(_))
        ));
        assert!(matches!(Update::parse("[1,2]"), Err(Rejection::Malformed(_))));
        assert!(matches!(Update::parse("not json"), Err(Rejection::Malformed(_))));
        assert!(matches!(
            Update::parse(r#"{"invite":{},"sending":{}}"#),
            Err(Rejection::Malformed(_))
        ));
    }

    #[test]
    fn invite_payload_is_opaque() {
        let u = Update::parse(r#"{"invite":{"from":"~bus","whatever":[1]}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(u.tag(), "invite");
    }

    #[test]
    fn snapshot_rows_default_missing_fields() {
        let u = Update::parse(
            r#"{"conversations":[{"conversation":{"id":"c1","name":"x","last_active":9}}]}"#,
        )
        .unwrap()
        .unwrap();
        let Update::Conversations(rows) = u else {
            panic!("expected conversations");
        };
        assert_eq!(rows[0].unreads, 0);
        assert!(rows[0].conversation.members.is_empty());
        assert!(rows[0].last_message.is_none());
    }
}
