use crate::state::{AppState, MessageKind};
use crate::AppAction;

#[derive(uniffi::Enum, Clone, Debug)]
pub enum AppUpdate {
    FullState(AppState),
    /// Work for an external collaborator (transport, push, persistence).
    Outbound {
        rev: u64,
        request: OutboundRequest,
    },
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
            AppUpdate::Outbound { rev, .. } => *rev,
        }
    }
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq, Eq)]
pub enum OutboundRequest {
    /// Poke the ship with a new message. `identifier` must be echoed back in
    /// the `sending`/`delivered` acks.
    SendMessage {
        conversation_id: String,
        identifier: String,
        kind: MessageKind,
        content: String,
    },
    RefreshConversations,
    FetchMessages {
        conversation_id: String,
    },
    MarkRead {
        conversation_id: String,
        message_id: String,
    },
    LeaveConversation {
        conversation_id: String,
    },
    SetMuted {
        conversation_id: String,
        muted: bool,
    },
}

impl OutboundRequest {
    pub fn tag(&self) -> &'static str {
        match self {
            OutboundRequest::SendMessage { .. } => "SendMessage",
            OutboundRequest::RefreshConversations => "RefreshConversations",
            OutboundRequest::FetchMessages { .. } => "FetchMessages",
            OutboundRequest::MarkRead { .. } => "MarkRead",
            OutboundRequest::LeaveConversation { .. } => "LeaveConversation",
            OutboundRequest::SetMuted { .. } => "SetMuted",
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(AppAction),
    Internal(Box<InternalEvent>),
}

#[derive(Debug)]
pub enum InternalEvent {
    // Subscription receive path; parsed on the actor thread.
    RemoteUpdate { raw: String },

    // Periodic pending-send expiry.
    SweepPending { now: i64 },
}
