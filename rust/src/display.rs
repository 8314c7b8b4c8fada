// Read-only projections used by chat list rows and notifications.

use std::sync::OnceLock;

use regex::Regex;

use crate::state::{Chat, ChatSummary, Message, MessageKind};

const SIG: char = '~';
const TOKEN_DECIMALS: u32 = 18;
const TOKEN_DISPLAY_DECIMALS: usize = 3;

pub fn de_sig(ship: &str) -> &str {
    ship.trim().trim_start_matches(SIG)
}

pub fn add_sig(ship: &str) -> String {
    format!("{SIG}{}", de_sig(ship))
}

pub fn same_ship(a: &str, b: &str) -> bool {
    de_sig(a) == de_sig(b)
}

fn audio_url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://\S+\.(m4a|mp3|wav|aac|ogg|webm)(\?\S*)?$").expect("valid regex")
    })
}

fn image_url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://\S+\.(png|jpe?g|gif|webp|heic)(\?\S*)?$").expect("valid regex")
    })
}

/// For DMs, the other party; otherwise the conversation name.
pub fn chat_name(self_ship: &str, chat: &Chat) -> String {
    let conv = &chat.conversation;
    if conv.dm {
        return conv
            .members
            .iter()
            .find(|m| !same_ship(m, self_ship))
            .map(|m| add_sig(m))
            .unwrap_or_else(|| conv.name.clone());
    }
    conv.name.clone()
}

/// One-line rendering of a message for list previews.
pub fn preview_text(kind: &MessageKind, content: &str) -> String {
    match kind {
        MessageKind::MemberAdd => format!("{content} joined the chat"),
        MessageKind::MemberRemove => format!("{content} left the chat"),
        MessageKind::ChangeName => format!("name changed to \"{content}\""),
        MessageKind::LeaderAdd => format!("{content} added as an admin"),
        MessageKind::LeaderRemove => format!("{content} removed as an admin"),
        MessageKind::ChangeRouter => format!("Router changed to {content}"),
        MessageKind::SendTokens => format_token_content(content),
        _ if audio_url().is_match(content.trim()) => "Voice Message".to_string(),
        _ if image_url().is_match(content.trim()) => "Image".to_string(),
        _ => content.to_string(),
    }
}

/// `"<amount @ud> <symbol> <recipient>"` → `"Sent 1.5 ZIG to ~bus"`.
pub fn format_token_content(content: &str) -> String {
    let mut parts = content.split_whitespace();
    let (Some(amount), Some(symbol), Some(recipient)) = (parts.next(), parts.next(), parts.next())
    else {
        return content.to_string();
    };
    format!(
        "Sent {} {symbol} to {recipient}",
        display_token_amount(amount)
    )
}

fn display_token_amount(ud: &str) -> String {
    let raw: String = ud.chars().filter(|c| *c != '.').collect();
    let Ok(value) = raw.parse::<u128>() else {
        return ud.to_string();
    };
    let unit = 10u128.pow(TOKEN_DECIMALS);
    let whole = value / unit;
    let frac = value % unit;
    let frac = format!("{frac:018}");
    let frac = frac[..TOKEN_DISPLAY_DECIMALS].trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

pub fn last_message_preview(message: Option<&Message>) -> String {
    match message {
        Some(m) if !m.author.is_empty() => preview_text(&m.kind, &m.content),
        _ => "No messages yet".to_string(),
    }
}

pub fn summarize(self_ship: &str, chat: &Chat) -> ChatSummary {
    let last = chat.last_message.as_ref();
    ChatSummary {
        conversation_id: chat.conversation.id.clone(),
        display_name: chat_name(self_ship, chat),
        is_dm: chat.conversation.dm,
        muted: chat.conversation.muted,
        last_active: chat.conversation.last_active,
        last_author: last.filter(|m| !m.author.is_empty()).map(|m| {
            if same_ship(&m.author, self_ship) {
                "You".to_string()
            } else {
                add_sig(&m.author)
            }
        }),
        preview: last_message_preview(last),
        unreads: chat.unreads,
    }
}
