use crate::state::MessageKind;

#[derive(uniffi::Enum, Debug, Clone)]
pub enum AppAction {
    // Messaging
    SendMessage {
        conversation_id: String,
        kind: MessageKind,
        content: String,
    },
    RetryMessage {
        conversation_id: String,
        message_id: String,
    },

    // Conversations
    OpenChat {
        conversation_id: String,
    },
    CloseChat,
    LeaveChat {
        conversation_id: String,
    },
    ToggleMute {
        conversation_id: String,
    },

    // Search
    StartSearch,
    ClearSearch,

    // Lifecycle
    Foregrounded,
}

impl AppAction {
    /// Log-safe action tag (never includes message content).
    pub fn tag(&self) -> &'static str {
        match self {
            // Messaging
            AppAction::SendMessage { .. } => "SendMessage",
            AppAction::RetryMessage { .. } => "RetryMessage",

            // Conversations
            AppAction::OpenChat { .. } => "OpenChat",
            AppAction::CloseChat => "CloseChat",
            AppAction::LeaveChat { .. } => "LeaveChat",
            AppAction::ToggleMute { .. } => "ToggleMute",

            // Search
            AppAction::StartSearch => "StartSearch",
            AppAction::ClearSearch => "ClearSearch",

            // Lifecycle
            AppAction::Foregrounded => "Foregrounded",
        }
    }
}
