mod actions;
pub mod chat;
mod core;
pub mod dispatch;
pub mod display;
mod error;
pub mod events;
pub mod ids;
pub mod index;
mod logging;
pub mod reconcile;
mod state;
pub mod store;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, RecvTimeoutError, Sender};

pub use actions::AppAction;
pub use error::Rejection;
pub use state::*;
pub use updates::*;

/// Return the default `pongo_config.json` payload used when no config file exists.
pub fn default_config_json() -> String {
    core::default_app_config_json()
}

uniffi::setup_scaffolding!();

#[uniffi::export(callback_interface)]
pub trait AppReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: AppUpdate);
}

#[derive(uniffi::Object)]
pub struct FfiApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
}

#[uniffi::export]
impl FfiApp {
    #[uniffi::constructor]
    pub fn new(data_dir: String, ship: String) -> Arc<Self> {
        logging::init_logging(&data_dir);
        tracing::info!(data_dir = %data_dir, ship = %ship, "FfiApp::new() starting");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));

        // Actor loop thread (single threaded "app actor").
        let shared_for_core = shared_state.clone();
        thread::spawn(move || {
            let mut core = crate::core::AppCore::new(update_tx, data_dir, ship, shared_for_core);
            loop {
                match core_rx.recv_timeout(core.sweep_interval()) {
                    Ok(msg) => core.handle_message(msg),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                core.maybe_sweep();
            }
            tracing::debug!("app actor stopped");
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
        })
    }

    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    /// Feed one raw subscription payload from the ship. Parsed and applied
    /// on the actor thread; malformed payloads are logged and dropped.
    pub fn push_update(&self, json: String) {
        let _ = self.core_tx.send(CoreMsg::Internal(Box::new(
            InternalEvent::RemoteUpdate { raw: json },
        )));
    }

    /// True once the user has read past `message_id`, so a delivered push
    /// notification for it can be dismissed.
    pub fn should_dismiss_notification(&self, conversation_id: String, message_id: String) -> bool {
        self.state()
            .chats
            .get(&conversation_id)
            .is_some_and(|chat| chat.has_read_past(&message_id))
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn AppReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }
}
