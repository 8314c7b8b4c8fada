// Per-conversation aggregate: the message log plus the list-level counters
// derived from it.

use crate::display::{de_sig, same_ship};
use crate::ids::{id_key, is_more_recent, IdKey};
use crate::reconcile::reconcile;
use crate::state::{Chat, Conversation, Message, MessageKind, MessageStatus};

pub const PENDING_TIMEOUT_REASON: &str = "timed out";

/// What applying an incoming message changed beyond the chat itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOutcome {
    pub most_recent: bool,
    /// Set when the focused chat advanced its read marker to this id.
    pub read_up_to: Option<String>,
}

impl Chat {
    pub fn new(conversation: Conversation, seq: u64) -> Self {
        Self {
            conversation,
            messages: vec![],
            last_message: None,
            unreads: 0,
            seq,
        }
    }

    pub fn id(&self) -> &str {
        &self.conversation.id
    }

    /// Most recent remote-assigned id known for this chat, from the log or
    /// the cached preview message.
    pub fn newest_confirmed_id(&self) -> Option<&str> {
        self.messages
            .iter()
            .chain(self.last_message.iter())
            .map(|m| m.id.as_str())
            .filter(|id| matches!(id_key(id), IdKey::Confirmed(_)))
            .max_by(|a, b| id_key(a).cmp(&id_key(b)))
    }

    /// True once the read marker is past `message_id`, so a notification for
    /// it can be dismissed.
    pub fn has_read_past(&self, message_id: &str) -> bool {
        self.conversation
            .last_read
            .as_deref()
            .is_some_and(|read| is_more_recent(read, message_id))
    }

    fn is_most_recent(&self, id: &str) -> bool {
        if id_key(id) == IdKey::Malformed {
            return false;
        }
        match self.newest_confirmed_id() {
            Some(head) => is_more_recent(id, head),
            None => true,
        }
    }

    /// Applies a message pushed by the remote.
    ///
    /// Only the focused chat keeps its detailed log in sync; background chats
    /// update their counters, preview and administrative fields.
    pub fn apply_message(
        &mut self,
        mut message: Message,
        self_ship: &str,
        focused: bool,
    ) -> MessageOutcome {
        message.conversation_id = self.conversation.id.clone();
        let most_recent = self.is_most_recent(&message.id);
        let mut outcome = MessageOutcome {
            most_recent,
            read_up_to: None,
        };

        if most_recent {
            self.conversation.last_active = message.timestamp;
            self.last_message = Some(Message {
                status: MessageStatus::Delivered,
                ..message.clone()
            });
        }

        if same_ship(&message.author, self_ship) || focused {
            self.unreads = 0;
        } else if most_recent {
            self.unreads = self.unreads.saturating_add(1);
        }

        if focused && most_recent {
            self.conversation.last_read = Some(message.id.clone());
            outcome.read_up_to = Some(message.id.clone());
        }

        self.apply_admin(&message, most_recent);

        if focused {
            self.merge_into_log([message]);
        }
        outcome
    }

    /// Membership edits apply in arrival order. A rename only applies when it
    /// is the newest message, so a late older rename cannot roll it back.
    fn apply_admin(&mut self, message: &Message, most_recent: bool) {
        let conv = &mut self.conversation;
        let target = de_sig(&message.content);
        match message.kind {
            MessageKind::MemberAdd => {
                if !conv.members.iter().any(|m| same_ship(m, target)) {
                    conv.members.insert(0, target.to_string());
                }
            }
            MessageKind::MemberRemove => {
                if let Some(pos) = conv.members.iter().position(|m| same_ship(m, target)) {
                    conv.members.remove(pos);
                }
            }
            MessageKind::LeaderAdd => {
                if !conv.leaders.iter().any(|l| same_ship(l, target)) {
                    conv.leaders.push(target.to_string());
                }
            }
            MessageKind::LeaderRemove => conv.leaders.retain(|l| !same_ship(l, target)),
            MessageKind::ChangeName => {
                if most_recent {
                    conv.name = message.content.clone();
                }
            }
            MessageKind::ChangeRouter
            | MessageKind::Text
            | MessageKind::SendTokens
            | MessageKind::Other { .. } => {}
        }
    }

    /// Appends `incoming` as later arrivals and re-runs reconciliation.
    pub fn merge_into_log(&mut self, incoming: impl IntoIterator<Item = Message>) {
        let mut log = std::mem::take(&mut self.messages);
        log.extend(incoming);
        self.messages = reconcile(log);
    }

    /// Merges a page of history fetched for this chat. Counters other than
    /// the preview are left alone.
    pub fn apply_history(&mut self, page: Vec<Message>) {
        let conversation_id = self.conversation.id.clone();
        let page: Vec<Message> = page
            .into_iter()
            .map(|mut m| {
                m.conversation_id = conversation_id.clone();
                m
            })
            .collect();
        let newest = page
            .iter()
            .filter(|m| !m.is_pending() && id_key(&m.id) != IdKey::Malformed)
            .max_by(|a, b| id_key(&a.id).cmp(&id_key(&b.id)))
            .cloned();
        if let Some(newest) = newest {
            if self.is_most_recent(&newest.id) {
                self.conversation.last_active = self.conversation.last_active.max(newest.timestamp);
                self.last_message = Some(Message {
                    status: MessageStatus::Delivered,
                    ..newest
                });
            }
        }
        self.merge_into_log(page);
    }

    /// Puts an optimistic local send at the head of the log.
    pub fn push_local(&mut self, message: Message) {
        self.conversation.last_active = self.conversation.last_active.max(message.timestamp);
        self.last_message = Some(message.clone());
        self.unreads = 0;
        self.messages.insert(0, message);
    }

    fn refresh_preview(&mut self, updated: &Message) {
        if let Some(last) = self.last_message.as_mut() {
            if last.identifier.is_some() && last.identifier == updated.identifier {
                *last = updated.clone();
            }
        }
    }

    /// Remote accepted a local send. Matches the correlation token against
    /// both the pending id and the `identifier` field.
    pub fn mark_sent(&mut self, token: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| {
            !m.status.is_delivered() && (m.id == token || m.identifier.as_deref() == Some(token))
        }) else {
            return false;
        };
        message.status.advance(MessageStatus::Sent);
        message.identifier = Some(message.id.clone());
        let updated = message.clone();
        self.refresh_preview(&updated);
        self.messages = reconcile(std::mem::take(&mut self.messages));
        true
    }

    /// Remote delivered a local send, optionally with its authoritative id.
    pub fn mark_delivered(&mut self, token: &str, message_id: Option<&str>) -> bool {
        let Some(message) = self
            .messages
            .iter_mut()
            .find(|m| !m.status.is_delivered() && m.identifier.as_deref() == Some(token))
        else {
            return false;
        };
        if let Some(id) = message_id.map(str::trim).filter(|id| !id.is_empty()) {
            message.id = id.to_string();
        }
        message.status.advance(MessageStatus::Delivered);
        let updated = message.clone();
        self.refresh_preview(&updated);
        self.messages = reconcile(std::mem::take(&mut self.messages));
        true
    }

    /// Marks local sends still pending after `timeout_secs` as failed.
    /// Sends the remote already accepted are left alone.
    pub fn expire_pending(&mut self, now: i64, timeout_secs: i64) -> usize {
        let mut expired = vec![];
        for m in self.messages.iter_mut() {
            if m.is_pending()
                && m.status == MessageStatus::Pending
                && now.saturating_sub(m.timestamp) >= timeout_secs
            {
                m.status = MessageStatus::Failed {
                    reason: PENDING_TIMEOUT_REASON.to_string(),
                };
                expired.push(m.clone());
            }
        }
        for m in &expired {
            self.refresh_preview(m);
        }
        expired.len()
    }

    /// Moves a failed local send back to pending and returns it for
    /// resending.
    pub fn retry(&mut self, message_id: &str, now: i64) -> Option<Message> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id && matches!(m.status, MessageStatus::Failed { .. }))?;
        message.status = MessageStatus::Pending;
        message.timestamp = now;
        let updated = message.clone();
        self.refresh_preview(&updated);
        Some(updated)
    }
}
