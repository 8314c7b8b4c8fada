use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub rev: u64,
    pub ship: String,
    pub chats: HashMap<String, Chat>,
    /// Conversation ids, most recently active first.
    pub chat_index: Vec<String>,
    pub chat_list: Vec<ChatSummary>,
    pub current_chat: Option<String>,
    pub total_unreads: u32,
    pub is_searching: bool,
    pub search_results: Vec<Message>,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            ship: String::new(),
            chats: HashMap::new(),
            chat_index: vec![],
            chat_list: vec![],
            current_chat: None,
            total_unreads: 0,
            is_searching: false,
            search_results: vec![],
        }
    }
}

/// Message kind as carried on the wire (`"text"`, `"member-add"`, ...).
///
/// Kinds this client does not know about are kept verbatim and treated as
/// content.
#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    Text,
    SendTokens,
    MemberAdd,
    MemberRemove,
    LeaderAdd,
    LeaderRemove,
    ChangeName,
    ChangeRouter,
    Other { kind: String },
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Text => "text",
            MessageKind::SendTokens => "send-tokens",
            MessageKind::MemberAdd => "member-add",
            MessageKind::MemberRemove => "member-remove",
            MessageKind::LeaderAdd => "leader-add",
            MessageKind::LeaderRemove => "leader-remove",
            MessageKind::ChangeName => "change-name",
            MessageKind::ChangeRouter => "change-router",
            MessageKind::Other { kind } => kind,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            MessageKind::MemberAdd
                | MessageKind::MemberRemove
                | MessageKind::LeaderAdd
                | MessageKind::LeaderRemove
                | MessageKind::ChangeName
                | MessageKind::ChangeRouter
        )
    }
}

impl From<String> for MessageKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "text" => MessageKind::Text,
            "send-tokens" => MessageKind::SendTokens,
            "member-add" => MessageKind::MemberAdd,
            "member-remove" => MessageKind::MemberRemove,
            "leader-add" => MessageKind::LeaderAdd,
            "leader-remove" => MessageKind::LeaderRemove,
            "change-name" => MessageKind::ChangeName,
            "change-router" => MessageKind::ChangeRouter,
            _ => MessageKind::Other { kind },
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Failed { reason: String },
}

impl MessageStatus {
    fn rank(&self) -> u8 {
        match self {
            MessageStatus::Pending | MessageStatus::Failed { .. } => 0,
            MessageStatus::Sent => 1,
            MessageStatus::Delivered => 2,
        }
    }

    /// Moves forward along pending → sent → delivered. A failed message
    /// counts as pending here, so a late acknowledgement still resolves it.
    pub fn advance(&mut self, next: MessageStatus) {
        if next.rank() > self.rank() {
            *self = next;
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, MessageStatus::Delivered)
    }
}

fn delivered() -> MessageStatus {
    MessageStatus::Delivered
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub conversation_id: String,
    pub author: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub edited: bool,
    /// emoji -> ships that reacted with it
    #[serde(default)]
    pub reactions: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default = "delivered")]
    pub status: MessageStatus,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        crate::ids::is_pending_id(&self.id)
    }

    /// The `(kind, content, author)` tuple a pending send is matched on.
    pub fn matches_content(&self, other: &Message) -> bool {
        self.kind == other.kind
            && self.content == other.content
            && crate::display::same_ship(&self.author, &other.author)
    }

    /// Copies the fields a redelivery may change onto `self`.
    pub fn absorb(&mut self, later: Message) {
        self.content = later.content;
        self.edited = later.edited;
        self.reactions = later.reactions;
        self.reference = later.reference;
        self.timestamp = later.timestamp;
        self.status.advance(later.status);
    }
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub leaders: Vec<String>,
    #[serde(default)]
    pub last_active: i64,
    #[serde(default)]
    pub last_read: Option<String>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub dm: bool,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chat {
    pub conversation: Conversation,
    /// Most recent first.
    pub messages: Vec<Message>,
    pub last_message: Option<Message>,
    pub unreads: u32,
    /// Insertion order, used to break `last_active` ties in the index.
    pub seq: u64,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub conversation_id: String,
    pub display_name: String,
    pub is_dm: bool,
    pub muted: bool,
    pub last_active: i64,
    pub last_author: Option<String>,
    pub preview: String,
    pub unreads: u32,
}

pub fn now_seconds() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
