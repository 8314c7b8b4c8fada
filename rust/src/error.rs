//! Reasons an update or action was not applied.

use thiserror::Error;

/// Every variant leaves the chat state untouched.
///
/// [`Rejection::UnknownConversation`] and [`Rejection::UnknownMessage`] are
/// expected races (a leave or list refresh crossed the event in flight).
/// [`Rejection::Malformed`] means the remote sent something this client
/// cannot read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No chat with this id is loaded
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),

    /// No local message carries this id or correlation token
    #[error("unknown message: {0}")]
    UnknownMessage(String),

    /// Update payload is missing fields or has the wrong shape
    #[error("malformed update: {0}")]
    Malformed(String),

    /// Local send with nothing to send
    #[error("message content is empty")]
    EmptyContent,
}

impl Rejection {
    /// True for rejections that are part of normal operation.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Rejection::UnknownConversation(_) | Rejection::UnknownMessage(_) | Rejection::EmptyContent
        )
    }
}
