//! Total order over message identifiers.
//!
//! Remote ids are dotted decimal sequence numbers (`"170.141.184"`). Locally
//! created messages that the remote has not acknowledged yet carry a synthetic
//! id with a leading `-` marker (`"-3"`). Pending ids always sort as more
//! recent than remote ids; ids that cannot be parsed sort as least recent.

use std::cmp::Ordering;

pub const PENDING_MARKER: char = '-';
const SEPARATOR: char = '.';

/// Sort key derived from a message id. Variant order is significant:
/// `Malformed < Confirmed < Pending`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdKey {
    Malformed,
    Confirmed(Digits),
    Pending(Digits),
}

/// Arbitrary-length unsigned decimal, compared numerically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digits(String);

impl Digits {
    fn parse(raw: &str) -> Option<Self> {
        let mut digits = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                SEPARATOR => {}
                '0'..='9' => digits.push(ch),
                _ => return None,
            }
        }
        if digits.is_empty() {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        Some(Self(if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }))
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Only a well-formed `-<digits>` id is pending; `"-abc"` or `" -5"` is
/// malformed and treated like any other unreadable remote id.
pub fn is_pending_id(id: &str) -> bool {
    matches!(id_key(id), IdKey::Pending(_))
}

pub fn pending_id(seq: u64) -> String {
    format!("{PENDING_MARKER}{seq}")
}

/// Ids are taken verbatim. Surrounding whitespace makes an id malformed.
pub fn id_key(id: &str) -> IdKey {
    match id.strip_prefix(PENDING_MARKER) {
        Some(payload) => Digits::parse(payload).map_or(IdKey::Malformed, IdKey::Pending),
        None => Digits::parse(id).map_or(IdKey::Malformed, IdKey::Confirmed),
    }
}

/// Returns [`Ordering::Greater`] when `a` is more recent than `b`.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    id_key(a).cmp(&id_key(b))
}

pub fn is_more_recent(a: &str, b: &str) -> bool {
    compare_ids(a, b) == Ordering::Greater
}

/// Stable sort, most recent first. Entries with equal keys keep their
/// relative order.
pub fn sort_most_recent_first<T>(items: &mut [T], id_of: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| std::cmp::Reverse(id_key(id_of(item))));
}
