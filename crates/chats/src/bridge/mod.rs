//! View-state bridge between a push-based chat client and a render loop.
//!
//! The bridge keeps one registration on the chat client, stores every
//! snapshot it receives and relays it to its own listeners. Readers get the
//! latest snapshot without blocking through [`ViewStateBridge::current_state`].

pub mod listeners;

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tracing::debug;

use crate::client::ChatClientHandle;
use crate::entities::ChatSnapshot;
use crate::types::ChatIntents;

pub use listeners::{ListenerId, ListenerTable, StateListener, Subscription};

use listeners::lock;

/// Adapts a [`ChatClientHandle`] into a pull-plus-notify contract.
///
/// The bridge does no I/O and never fails. Client-side failures arrive as
/// snapshot data (`status`, `active_error_messages`).
pub struct ViewStateBridge {
    chat_id: String,
    client: Arc<dyn ChatClientHandle>,
    latest: Arc<ArcSwap<ChatSnapshot>>,
    listeners: Arc<ListenerTable>,
    upstream: Mutex<Option<ListenerId>>,
}

impl ViewStateBridge {
    /// Register on `client` and seed the latest snapshot from it.
    ///
    /// A client that has not produced anything yet is represented by
    /// [`ChatSnapshot::loading`].
    pub fn connect(client: Arc<dyn ChatClientHandle>) -> Self {
        let chat_id = client.chat_id().to_string();
        let initial = client
            .current_state()
            .unwrap_or_else(|| Arc::new(ChatSnapshot::loading()));
        let latest = Arc::new(ArcSwap::new(initial));
        let listeners = Arc::new(ListenerTable::new());

        let relay_latest = Arc::downgrade(&latest);
        let relay_listeners = Arc::downgrade(&listeners);
        let upstream = client.on_state_change(Arc::new(move |snapshot: &Arc<ChatSnapshot>| {
            let (Some(latest), Some(listeners)) = (relay_latest.upgrade(), relay_listeners.upgrade())
            else {
                return;
            };
            latest.store(snapshot.clone());
            listeners.notify(snapshot.clone());
        }));

        // Anything emitted between the seed read and the registration above
        // is picked up here; the client's own state is authoritative.
        if let Some(current) = client.current_state() {
            if !Arc::ptr_eq(&current, &latest.load_full()) {
                latest.store(current);
            }
        }

        debug!(chat_id, listener = upstream.as_u64(), "bridge connected to chat client");

        Self {
            chat_id,
            client,
            latest,
            listeners,
            upstream: Mutex::new(Some(upstream)),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Latest known snapshot. Never blocks.
    pub fn current_state(&self) -> Arc<ChatSnapshot> {
        self.latest.load_full()
    }

    /// Intent handle of the latest snapshot.
    pub fn intents(&self) -> ChatIntents {
        self.latest.load().intents.clone()
    }

    /// Register `listener` for every snapshot emitted from now on.
    pub fn subscribe(&self, listener: StateListener) -> ListenerId {
        let id = self.listeners.insert(listener);
        debug!(chat_id = %self.chat_id, listener = id.as_u64(), "bridge listener subscribed");
        id
    }

    /// Like [`ViewStateBridge::subscribe`], released when the guard drops.
    pub fn subscribe_scoped(&self, listener: StateListener) -> Subscription {
        let id = self.subscribe(listener);
        Subscription::new(&self.listeners, id)
    }

    /// Remove a listener. Unknown or already removed ids are ignored.
    ///
    /// Once this returns the listener is not called again.
    pub fn unsubscribe(&self, id: ListenerId) {
        if self.listeners.remove(id) {
            debug!(chat_id = %self.chat_id, listener = id.as_u64(), "bridge listener unsubscribed");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.upstream).is_some()
    }

    /// Release the registration on the chat client.
    ///
    /// Runs at most once; later calls and the implicit call on drop are
    /// no-ops. The last received snapshot stays readable.
    pub fn disconnect(&self) {
        let upstream = lock(&self.upstream).take();
        if let Some(id) = upstream {
            self.client.off_state_change(id);
            debug!(chat_id = %self.chat_id, listener = id.as_u64(), "bridge disconnected from chat client");
        }
    }
}

impl Drop for ViewStateBridge {
    fn drop(&mut self) {
        self.disconnect();
    }
}
