//! Routes inbound [`Update`]s to the chat they target.
//!
//! Every handler either applies fully or returns a [`Rejection`] before
//! touching state. Any handler that changes a chat leaves the conversation
//! index rebuilt, so readers never see a stale ordering.

use crate::error::Rejection;
use crate::events::{DeliveredAck, MessageEvent, MessageList, SendingAck, Update};
use crate::store::ChatStore;
use crate::updates::OutboundRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// State visible to readers changed.
    pub changed: bool,
    pub outbound: Vec<OutboundRequest>,
}

impl Dispatched {
    fn changed() -> Self {
        Self {
            changed: true,
            outbound: vec![],
        }
    }

    fn request(request: OutboundRequest) -> Self {
        Self {
            changed: false,
            outbound: vec![request],
        }
    }
}

pub fn dispatch(store: &mut ChatStore, update: Update) -> Result<Dispatched, Rejection> {
    let dispatched = match update {
        Update::Message(event) => on_message(store, event)?,
        Update::Sending(ack) => on_sending(store, ack)?,
        Update::Delivered(ack) => on_delivered(store, ack)?,
        Update::Conversations(rows) => {
            store.apply_snapshot(rows);
            Dispatched::changed()
        }
        Update::MessageList(page) => on_message_list(store, page)?,
        Update::Invite(_) => Dispatched::request(OutboundRequest::RefreshConversations),
        Update::SearchResult(results) => {
            store.set_search_results(results);
            Dispatched::changed()
        }
    };
    if dispatched.changed {
        store.rebuild_index();
    }
    Ok(dispatched)
}

/// Parses and dispatches one raw subscription event. Events this client
/// does not recognise are accepted as a no-op.
pub fn dispatch_raw(store: &mut ChatStore, raw: &str) -> Result<Dispatched, Rejection> {
    match Update::parse(raw)? {
        Some(update) => dispatch(store, update),
        None => Ok(Dispatched::default()),
    }
}

fn require(field: &str, value: &str) -> Result<(), Rejection> {
    if value.trim().is_empty() {
        return Err(Rejection::Malformed(format!("empty `{field}`")));
    }
    Ok(())
}

fn on_message(store: &mut ChatStore, event: MessageEvent) -> Result<Dispatched, Rejection> {
    let MessageEvent {
        conversation_id,
        message,
    } = event;
    require("conversation_id", &conversation_id)?;
    require("id", &message.id)?;

    let focused = store.is_focused(&conversation_id);
    let ship = store.ship().to_string();
    let message_id = message.id.clone();
    let chat = store.chat_mut(&conversation_id)?;
    let outcome = chat.apply_message(message, &ship, focused);
    tracing::debug!(
        %conversation_id,
        %message_id,
        focused,
        most_recent = outcome.most_recent,
        unreads = chat.unreads,
        "message applied"
    );

    let mut dispatched = Dispatched::changed();
    if let Some(read) = outcome.read_up_to {
        dispatched.outbound.push(OutboundRequest::MarkRead {
            conversation_id,
            message_id: read,
        });
    }
    Ok(dispatched)
}

fn on_sending(store: &mut ChatStore, ack: SendingAck) -> Result<Dispatched, Rejection> {
    require("identifier", &ack.identifier)?;
    let chat = store.chat_mut(&ack.conversation_id)?;
    if !chat.mark_sent(&ack.identifier) {
        return Err(Rejection::UnknownMessage(ack.identifier));
    }
    Ok(Dispatched::changed())
}

fn on_delivered(store: &mut ChatStore, ack: DeliveredAck) -> Result<Dispatched, Rejection> {
    require("identifier", &ack.identifier)?;
    let chat = store.chat_mut(&ack.conversation_id)?;
    if !chat.mark_delivered(&ack.identifier, ack.message_id.as_deref()) {
        return Err(Rejection::UnknownMessage(ack.identifier));
    }
    Ok(Dispatched::changed())
}

fn on_message_list(store: &mut ChatStore, page: MessageList) -> Result<Dispatched, Rejection> {
    if let Some(bad) = page.messages.iter().find(|m| m.id.trim().is_empty()) {
        return Err(Rejection::Malformed(format!(
            "message without id from {}",
            bad.author
        )));
    }
    store.chat_mut(&page.conversation_id)?.apply_history(page.messages);
    Ok(Dispatched::changed())
}
