mod config;

use std::sync::{Arc, RwLock};
use std::time::Instant;

use flume::Sender;

use crate::actions::AppAction;
use crate::dispatch::{dispatch_raw, Dispatched};
use crate::error::Rejection;
use crate::state::{now_seconds, AppState};
use crate::store::ChatStore;
use crate::updates::{AppUpdate, CoreMsg, InternalEvent, OutboundRequest};

pub(crate) use config::default_app_config_json;

/// Single-threaded "app actor". Owns the chat store; every inbound event and
/// UI action is applied here, one at a time, and each visible change is
/// published as a full snapshot.
pub struct AppCore {
    pub state: AppState,
    rev: u64,
    store: ChatStore,

    update_sender: Sender<AppUpdate>,
    shared_state: Arc<RwLock<AppState>>,

    config: config::AppConfig,
    last_sweep: Instant,
}

impl AppCore {
    pub fn new(
        update_sender: Sender<AppUpdate>,
        data_dir: String,
        ship: String,
        shared_state: Arc<RwLock<AppState>>,
    ) -> Self {
        let config = config::load_app_config(&data_dir);
        let store = ChatStore::new(ship);
        let state = store.snapshot(0);

        let this = Self {
            state,
            rev: 0,
            store,
            update_sender,
            shared_state,
            config,
            last_sweep: Instant::now(),
        };

        // Ensure FfiApp.state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        let rev = self.next_rev();
        self.state = self.store.snapshot(rev);
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    fn emit_outbound(&mut self, request: OutboundRequest) {
        let rev = self.next_rev();
        // Keep snapshot rev in sync with the update stream even though this is a side-effect update.
        self.state.rev = rev;
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        tracing::debug!(request = request.tag(), rev, "outbound");
        let _ = self.update_sender.send(AppUpdate::Outbound { rev, request });
    }

    fn publish(&mut self, dispatched: Dispatched) {
        if dispatched.changed {
            self.emit_state();
        }
        for request in dispatched.outbound {
            self.emit_outbound(request);
        }
    }

    fn log_rejection(&self, what: &'static str, rejection: &Rejection) {
        if rejection.is_expected() {
            tracing::debug!(%rejection, what, "ignored");
        } else {
            tracing::warn!(%rejection, what, "rejected");
        }
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(action) => {
                // Never log `?action` directly: it carries message content.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action);
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    /// Runs the pending-send sweep if the configured interval has elapsed.
    pub fn maybe_sweep(&mut self) {
        if self.last_sweep.elapsed() < self.config.sweep_interval() {
            return;
        }
        self.last_sweep = Instant::now();
        self.handle_internal(InternalEvent::SweepPending { now: now_seconds() });
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::RemoteUpdate { raw } => match dispatch_raw(&mut self.store, &raw) {
                Ok(dispatched) => self.publish(dispatched),
                Err(rejection) => self.log_rejection("remote_update", &rejection),
            },
            InternalEvent::SweepPending { now } => {
                let Some(timeout) = self.config.pending_timeout_secs() else {
                    return;
                };
                let expired = self.store.expire_pending(now, timeout);
                if expired > 0 {
                    tracing::info!(expired, timeout, "pending sends timed out");
                    self.emit_state();
                }
            }
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::SendMessage {
                conversation_id,
                kind,
                content,
            } => {
                let ship = self.store.ship().to_string();
                let message = match self.store.send_local(
                    &conversation_id,
                    kind,
                    &content,
                    &ship,
                    now_seconds(),
                ) {
                    Ok(m) => m,
                    Err(rejection) => {
                        self.log_rejection("send_message", &rejection);
                        return;
                    }
                };
                self.store.rebuild_index();
                self.emit_state();
                self.emit_outbound(OutboundRequest::SendMessage {
                    conversation_id,
                    identifier: message.identifier.unwrap_or(message.id),
                    kind: message.kind,
                    content: message.content,
                });
            }
            AppAction::RetryMessage {
                conversation_id,
                message_id,
            } => {
                let message = match self.store.retry(&conversation_id, &message_id, now_seconds())
                {
                    Ok(m) => m,
                    Err(rejection) => {
                        self.log_rejection("retry_message", &rejection);
                        return;
                    }
                };
                self.emit_state();
                self.emit_outbound(OutboundRequest::SendMessage {
                    conversation_id,
                    identifier: message.identifier.unwrap_or(message.id),
                    kind: message.kind,
                    content: message.content,
                });
            }
            AppAction::OpenChat { conversation_id } => {
                if let Err(rejection) = self.store.focus(&conversation_id) {
                    self.log_rejection("open_chat", &rejection);
                    return;
                }
                self.store.rebuild_index();
                self.emit_state();
                self.emit_outbound(OutboundRequest::FetchMessages { conversation_id });
            }
            AppAction::CloseChat => {
                if self.store.focused().is_some() {
                    self.store.unfocus();
                    self.emit_state();
                }
            }
            AppAction::LeaveChat { conversation_id } => {
                if let Err(rejection) = self.store.remove(&conversation_id) {
                    self.log_rejection("leave_chat", &rejection);
                    return;
                }
                self.store.rebuild_index();
                self.emit_state();
                self.emit_outbound(OutboundRequest::LeaveConversation { conversation_id });
                self.emit_outbound(OutboundRequest::RefreshConversations);
            }
            AppAction::ToggleMute { conversation_id } => {
                let muted = match self.store.toggle_mute(&conversation_id) {
                    Ok(muted) => muted,
                    Err(rejection) => {
                        self.log_rejection("toggle_mute", &rejection);
                        return;
                    }
                };
                self.emit_state();
                self.emit_outbound(OutboundRequest::SetMuted {
                    conversation_id,
                    muted,
                });
            }
            AppAction::StartSearch => {
                self.store.start_search();
                self.emit_state();
            }
            AppAction::ClearSearch => {
                self.store.clear_search();
                self.emit_state();
            }
            AppAction::Foregrounded => {
                self.emit_outbound(OutboundRequest::RefreshConversations);
            }
        }
    }
}
