use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pongo_core::{
    AppAction, AppReconciler, AppUpdate, FfiApp, MessageKind, MessageStatus, OutboundRequest,
};
use serde_json::json;
use tempfile::tempdir;

fn write_config(data_dir: &str, pending_timeout_secs: u64) {
    let path = std::path::Path::new(data_dir).join("pongo_config.json");
    let v = json!({
        "pending_timeout_secs": pending_timeout_secs,
        "sweep_interval_ms": 20,
    });
    std::fs::write(path, serde_json::to_vec(&v).unwrap()).unwrap();
}

fn wait_until(what: &str, timeout: Duration, mut f: impl FnMut() -> bool) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if f() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("{what}: condition not met within {timeout:?}");
}

struct TestReconciler {
    updates: Arc<Mutex<Vec<AppUpdate>>>,
}

impl TestReconciler {
    fn new() -> (Self, Arc<Mutex<Vec<AppUpdate>>>) {
        let updates = Arc::new(Mutex::new(vec![]));
        (
            Self {
                updates: updates.clone(),
            },
            updates,
        )
    }
}

impl AppReconciler for TestReconciler {
    fn reconcile(&self, update: AppUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

fn outbound(updates: &Arc<Mutex<Vec<AppUpdate>>>) -> Vec<OutboundRequest> {
    updates
        .lock()
        .unwrap()
        .iter()
        .filter_map(|u| match u {
            AppUpdate::Outbound { request, .. } => Some(request.clone()),
            AppUpdate::FullState(_) => None,
        })
        .collect()
}

fn new_app(pending_timeout_secs: u64) -> (Arc<FfiApp>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    write_config(&dir.path().to_string_lossy(), pending_timeout_secs);
    let app = FfiApp::new(dir.path().to_string_lossy().to_string(), "~zod".into());
    (app, dir)
}

fn load_chats(app: &FfiApp) {
    app.push_update(
        json!({"conversations": [
            {"conversation": {"id": "c1", "name": "club", "members": ["zod", "bus", "nec"], "last_active": 10}},
            {"conversation": {"id": "c2", "members": ["zod", "bus"], "dm": true, "last_active": 20}},
        ]})
        .to_string(),
    );
    wait_until("chats loaded", Duration::from_secs(2), || {
        app.state().chat_index.len() == 2
    });
}

fn message(cid: &str, id: &str, author: &str, content: &str) -> String {
    json!({"message": {"conversation_id": cid, "message": {
        "id": id, "author": author, "kind": "text", "content": content, "timestamp": 100,
    }}})
    .to_string()
}

#[test]
fn conversation_list_builds_index_and_summaries() {
    let (app, _dir) = new_app(120);
    let (reconciler, updates) = TestReconciler::new();
    app.listen_for_updates(Box::new(reconciler));

    load_chats(&app);
    let s = app.state();
    assert_eq!(s.chat_index, vec!["c2".to_string(), "c1".to_string()]);
    assert_eq!(s.chat_list[0].display_name, "~bus");
    assert_eq!(s.chat_list[1].display_name, "club");

    wait_until("updates emitted", Duration::from_secs(2), || {
        !updates.lock().unwrap().is_empty()
    });
    let up = updates.lock().unwrap();
    for w in up.windows(2) {
        assert_eq!(w[0].rev() + 1, w[1].rev());
    }
}

#[test]
fn send_then_acks_resolve_the_pending_message() {
    let (app, _dir) = new_app(120);
    let (reconciler, updates) = TestReconciler::new();
    app.listen_for_updates(Box::new(reconciler));
    load_chats(&app);

    app.dispatch(AppAction::OpenChat {
        conversation_id: "c1".into(),
    });
    app.dispatch(AppAction::SendMessage {
        conversation_id: "c1".into(),
        kind: MessageKind::Text,
        content: "  hello ".into(),
    });
    wait_until("pending message appears", Duration::from_secs(2), || {
        app.state().chats["c1"]
            .messages
            .first()
            .is_some_and(|m| m.id == "-1" && m.status == MessageStatus::Pending)
    });
    assert_eq!(app.state().chat_index[0], "c1");

    wait_until("send requested", Duration::from_secs(2), || {
        outbound(&updates).contains(&OutboundRequest::SendMessage {
            conversation_id: "c1".into(),
            identifier: "-1".into(),
            kind: MessageKind::Text,
            content: "hello".into(),
        })
    });

    app.push_update(json!({"sending": {"conversation_id": "c1", "identifier": "-1"}}).to_string());
    wait_until("sent", Duration::from_secs(2), || {
        app.state().chats["c1"].messages[0].status == MessageStatus::Sent
    });

    app.push_update(message("c1", "1.5", "~zod", "hello"));
    wait_until("remote copy replaces pending", Duration::from_secs(2), || {
        let s = app.state();
        let log = &s.chats["c1"].messages;
        log.len() == 1 && log[0].id == "1.5" && log[0].status == MessageStatus::Delivered
    });
}

#[test]
fn background_messages_count_unreads_until_opened() {
    let (app, _dir) = new_app(120);
    load_chats(&app);

    app.push_update(message("c1", "1.1", "~bus", "one"));
    app.push_update(message("c1", "1.2", "~nec", "two"));
    wait_until("unreads counted", Duration::from_secs(2), || {
        app.state().total_unreads == 2
    });
    let s = app.state();
    assert!(s.chats["c1"].messages.is_empty());
    assert_eq!(s.chat_list[0].conversation_id, "c1");
    assert_eq!(s.chat_list[0].preview, "two");

    app.dispatch(AppAction::OpenChat {
        conversation_id: "c1".into(),
    });
    wait_until("opened", Duration::from_secs(2), || {
        app.state().current_chat.as_deref() == Some("c1")
    });
    assert_eq!(app.state().total_unreads, 0);

    app.push_update(
        json!({"message_list": {"conversation_id": "c1", "messages": [
            {"id": "1.1", "author": "~bus", "kind": "text", "content": "one"},
            {"id": "1.2", "author": "~nec", "kind": "text", "content": "two"},
        ]}})
        .to_string(),
    );
    wait_until("history merged", Duration::from_secs(2), || {
        let s = app.state();
        let ids: Vec<_> = s.chats["c1"].messages.iter().map(|m| m.id.clone()).collect();
        ids == ["1.2", "1.1"]
    });

    app.push_update(message("c1", "1.3", "~bus", "three"));
    wait_until("read marker advanced", Duration::from_secs(2), || {
        app.state().chats["c1"].conversation.last_read.as_deref() == Some("1.3")
    });
    assert!(app.should_dismiss_notification("c1".into(), "1.2".into()));
    assert!(!app.should_dismiss_notification("c1".into(), "1.3".into()));
}

#[test]
fn stale_send_times_out_and_retry_resends() {
    let (app, _dir) = new_app(1);
    let (reconciler, updates) = TestReconciler::new();
    app.listen_for_updates(Box::new(reconciler));
    load_chats(&app);

    app.dispatch(AppAction::SendMessage {
        conversation_id: "c2".into(),
        kind: MessageKind::Text,
        content: "anyone?".into(),
    });
    wait_until("send timed out", Duration::from_secs(5), || {
        matches!(
            app.state().chats["c2"].messages.first().map(|m| &m.status),
            Some(MessageStatus::Failed { .. })
        )
    });

    app.dispatch(AppAction::RetryMessage {
        conversation_id: "c2".into(),
        message_id: "-1".into(),
    });
    wait_until("resent", Duration::from_secs(2), || {
        outbound(&updates)
            .iter()
            .filter(|r| matches!(r, OutboundRequest::SendMessage { .. }))
            .count()
            == 2
    });

    // A late ack still resolves the message.
    app.push_update(json!({"sending": {"conversation_id": "c2", "identifier": "-1"}}).to_string());
    wait_until("sent", Duration::from_secs(2), || {
        app.state().chats["c2"].messages[0].status == MessageStatus::Sent
    });
}

#[test]
fn malformed_and_unknown_updates_are_ignored() {
    let (app, _dir) = new_app(120);
    load_chats(&app);
    let before = app.state();

    app.push_update("not json".into());
    app.push_update(json!({"typing": {"ship": "~bus"}}).to_string());
    app.push_update(json!({"delivered": {"conversation_id": "c1", "identifier": "-9"}}).to_string());
    app.push_update(message("gone", "1.1", "~bus", "hi"));
    // Barrier: the actor handles messages in order.
    app.push_update(message("c2", "2.1", "~bus", "hi"));
    wait_until("barrier applied", Duration::from_secs(2), || {
        app.state().total_unreads == 1
    });

    let after = app.state();
    assert_eq!(after.chats["c1"], before.chats["c1"]);
    assert!(!after.chats.contains_key("gone"));
}

#[test]
fn leave_and_mute_emit_requests() {
    let (app, _dir) = new_app(120);
    let (reconciler, updates) = TestReconciler::new();
    app.listen_for_updates(Box::new(reconciler));
    load_chats(&app);

    app.dispatch(AppAction::ToggleMute {
        conversation_id: "c2".into(),
    });
    app.dispatch(AppAction::LeaveChat {
        conversation_id: "c1".into(),
    });
    app.dispatch(AppAction::Foregrounded);
    wait_until("requests emitted", Duration::from_secs(2), || {
        outbound(&updates).len() == 4
    });

    assert_eq!(
        outbound(&updates),
        vec![
            OutboundRequest::SetMuted {
                conversation_id: "c2".into(),
                muted: true,
            },
            OutboundRequest::LeaveConversation {
                conversation_id: "c1".into(),
            },
            OutboundRequest::RefreshConversations,
            OutboundRequest::RefreshConversations,
        ]
    );
    let s = app.state();
    assert_eq!(s.chat_index, vec!["c2".to_string()]);
    assert!(s.chats["c2"].conversation.muted);
}
