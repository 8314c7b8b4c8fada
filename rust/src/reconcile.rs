//! Message log reconciliation.
//!
//! A chat's log is fed from two directions: optimistic local sends (pending
//! ids) and the remote update stream (confirmed ids, possibly redelivered or
//! out of order). [`reconcile`] folds both into the canonical log:
//!
//! 1. a pending entry is dropped once a confirmed entry with the same
//!    `(kind, content, author)` exists;
//! 2. entries sharing an id collapse into the first slot, taking the mutable
//!    fields of the later arrival;
//! 3. confirmed entries are marked delivered;
//! 4. the log is stably sorted most recent first.
//!
//! The pass is idempotent and never drops an entry that has no duplicate.

use std::collections::{HashMap, HashSet};

use crate::display::de_sig;
use crate::ids::sort_most_recent_first;
use crate::state::{Message, MessageStatus};

/// `log` is in arrival order for the purpose of duplicate resolution: a
/// later index is a later arrival.
pub fn reconcile(log: Vec<Message>) -> Vec<Message> {
    let keep = pending_survivors(&log);

    let mut out: Vec<Message> = Vec::with_capacity(log.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(log.len());
    for (message, keep) in log.into_iter().zip(keep) {
        if !keep {
            continue;
        }
        match slots.get(&message.id) {
            Some(&slot) => out[slot].absorb(message),
            None => {
                slots.insert(message.id.clone(), out.len());
                out.push(message);
            }
        }
    }

    for message in out.iter_mut().filter(|m| !m.is_pending()) {
        message.status = MessageStatus::Delivered;
    }

    sort_most_recent_first(&mut out, |m| m.id.as_str());
    out
}

fn pending_survivors(log: &[Message]) -> Vec<bool> {
    let confirmed: HashSet<(&str, &str, &str)> = log
        .iter()
        .filter(|m| !m.is_pending())
        .map(|m| (m.kind.as_str(), m.content.as_str(), de_sig(&m.author)))
        .collect();

    log.iter()
        .map(|m| {
            !m.is_pending()
                || !confirmed.contains(&(m.kind.as_str(), m.content.as_str(), de_sig(&m.author)))
        })
        .collect()
}
