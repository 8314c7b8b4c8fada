use std::cmp::Reverse;
use std::collections::HashMap;

use crate::state::Chat;

/// Orders chats by `last_active`, newest first. Ties keep insertion order.
///
/// Pure projection over the chat map; callers may rebuild at any time.
pub fn rebuild(chats: &HashMap<String, Chat>) -> Vec<&Chat> {
    let mut list: Vec<&Chat> = chats.values().collect();
    // HashMap iteration order is arbitrary, so insertion order is restored
    // explicitly before the stable sort.
    list.sort_by_key(|c| c.seq);
    list.sort_by_key(|c| Reverse(c.conversation.last_active));
    list
}

pub fn rebuild_ids(chats: &HashMap<String, Chat>) -> Vec<String> {
    rebuild(chats)
        .into_iter()
        .map(|c| c.conversation.id.clone())
        .collect()
}
