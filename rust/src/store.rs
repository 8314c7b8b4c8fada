// The chat map plus the bits of client state that travel with it (focus,
// search, local id allocation). Owned by exactly one actor; every mutation is
// synchronous and performs no I/O.

use std::collections::HashMap;

use crate::display::summarize;
use crate::error::Rejection;
use crate::events::ChatSnapshot;
use crate::ids::pending_id;
use crate::index;
use crate::state::{AppState, Chat, ChatSummary, Message, MessageKind, MessageStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatStore {
    ship: String,
    chats: HashMap<String, Chat>,
    index: Vec<String>,
    focused: Option<String>,
    next_seq: u64,
    next_pending: u64,
    is_searching: bool,
    search_results: Vec<Message>,
}

impl ChatStore {
    pub fn new(ship: impl Into<String>) -> Self {
        Self {
            ship: ship.into(),
            ..Self::default()
        }
    }

    pub fn ship(&self) -> &str {
        &self.ship
    }

    pub fn chats(&self) -> &HashMap<String, Chat> {
        &self.chats
    }

    pub fn chat(&self, conversation_id: &str) -> Option<&Chat> {
        self.chats.get(conversation_id)
    }

    pub(crate) fn chat_mut(&mut self, conversation_id: &str) -> Result<&mut Chat, Rejection> {
        self.chats
            .get_mut(conversation_id)
            .ok_or_else(|| Rejection::UnknownConversation(conversation_id.to_string()))
    }

    /// Conversation ids, most recently active first.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_focused(&self, conversation_id: &str) -> bool {
        self.focused.as_deref() == Some(conversation_id)
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn search_results(&self) -> &[Message] {
        &self.search_results
    }

    pub fn rebuild_index(&mut self) {
        self.index = index::rebuild_ids(&self.chats);
    }

    pub fn summaries(&self) -> Vec<ChatSummary> {
        self.index
            .iter()
            .filter_map(|id| self.chats.get(id))
            .map(|c| summarize(&self.ship, c))
            .collect()
    }

    pub fn total_unreads(&self) -> u32 {
        self.chats
            .values()
            .fold(0u32, |acc, c| acc.saturating_add(c.unreads))
    }

    pub fn focus(&mut self, conversation_id: &str) -> Result<(), Rejection> {
        let chat = self.chat_mut(conversation_id)?;
        chat.unreads = 0;
        self.focused = Some(conversation_id.to_string());
        Ok(())
    }

    pub fn unfocus(&mut self) {
        self.focused = None;
    }

    /// Inserts a chat for `snapshot`, or refreshes the conversation fields
    /// of an existing one while keeping its log.
    pub fn upsert(&mut self, snapshot: ChatSnapshot) {
        let id = snapshot.conversation.id.clone();
        let focused = self.is_focused(&id);
        match self.chats.get_mut(&id) {
            Some(chat) => {
                chat.conversation = snapshot.conversation;
                if snapshot.last_message.is_some() {
                    chat.last_message = snapshot.last_message;
                }
                chat.unreads = if focused { 0 } else { snapshot.unreads };
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                let mut chat = Chat::new(snapshot.conversation, seq);
                chat.last_message = snapshot.last_message;
                chat.unreads = snapshot.unreads;
                self.chats.insert(id, chat);
            }
        }
    }

    /// Replaces the chat set with a full conversation list. Chats missing
    /// from the list are dropped.
    pub fn apply_snapshot(&mut self, rows: Vec<ChatSnapshot>) {
        let listed: std::collections::HashSet<String> =
            rows.iter().map(|r| r.conversation.id.clone()).collect();
        self.chats.retain(|id, _| listed.contains(id));
        for row in rows {
            self.upsert(row);
        }
        if let Some(focused) = self.focused.clone() {
            if !self.chats.contains_key(&focused) {
                self.focused = None;
            }
        }
    }

    pub fn remove(&mut self, conversation_id: &str) -> Result<Chat, Rejection> {
        let chat = self
            .chats
            .remove(conversation_id)
            .ok_or_else(|| Rejection::UnknownConversation(conversation_id.to_string()))?;
        if self.is_focused(conversation_id) {
            self.focused = None;
        }
        Ok(chat)
    }

    pub fn toggle_mute(&mut self, conversation_id: &str) -> Result<bool, Rejection> {
        let chat = self.chat_mut(conversation_id)?;
        chat.conversation.muted = !chat.conversation.muted;
        Ok(chat.conversation.muted)
    }

    /// Creates an optimistic local send and puts it at the head of the
    /// chat's log. The returned message carries the correlation token the
    /// transport must echo back in its acks.
    pub fn send_local(
        &mut self,
        conversation_id: &str,
        kind: MessageKind,
        content: &str,
        author: &str,
        now: i64,
    ) -> Result<Message, Rejection> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Rejection::EmptyContent);
        }
        if !self.chats.contains_key(conversation_id) {
            return Err(Rejection::UnknownConversation(conversation_id.to_string()));
        }
        self.next_pending += 1;
        let id = pending_id(self.next_pending);
        let message = Message {
            id: id.clone(),
            conversation_id: conversation_id.to_string(),
            author: author.to_string(),
            kind,
            content: content.to_string(),
            timestamp: now,
            edited: false,
            reactions: HashMap::new(),
            reference: None,
            status: MessageStatus::Pending,
            identifier: Some(id),
        };
        self.chat_mut(conversation_id)?.push_local(message.clone());
        Ok(message)
    }

    pub fn retry(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        now: i64,
    ) -> Result<Message, Rejection> {
        self.chat_mut(conversation_id)?
            .retry(message_id, now)
            .ok_or_else(|| Rejection::UnknownMessage(message_id.to_string()))
    }

    /// Fails local sends older than `timeout_secs` across all chats.
    pub fn expire_pending(&mut self, now: i64, timeout_secs: i64) -> usize {
        self.chats
            .values_mut()
            .map(|c| c.expire_pending(now, timeout_secs))
            .sum()
    }

    pub fn start_search(&mut self) {
        self.is_searching = true;
        self.search_results.clear();
    }

    pub fn clear_search(&mut self) {
        self.is_searching = false;
        self.search_results.clear();
    }

    pub fn set_search_results(&mut self, results: Vec<Message>) {
        self.search_results = results;
    }

    pub fn snapshot(&self, rev: u64) -> AppState {
        AppState {
            rev,
            ship: self.ship.clone(),
            chats: self.chats.clone(),
            chat_index: self.index.clone(),
            chat_list: self.summaries(),
            current_chat: self.focused.clone(),
            total_unreads: self.total_unreads(),
            is_searching: self.is_searching,
            search_results: self.search_results.clone(),
        }
    }
}
