//! Interface of the external chat client, plus an in-memory implementation.
//!
//! The chat client owns the authoritative state of one chat and emits a new
//! snapshot on every change. Everything the surface needs from it is the
//! [`ChatClientHandle`] trait; [`ChatClientProvider`] hands out one handle per
//! chat id.

pub mod local;
pub mod queue;

use std::sync::Arc;

use crate::bridge::{ListenerId, StateListener};
use crate::entities::ChatSnapshot;

pub use local::{LocalChatClient, LocalChatRegistry};
pub use queue::{command_channel, run_command_loop, CommandReceiver, QueuedCommands};

/// Handle to the state of one chat.
pub trait ChatClientHandle: Send + Sync {
    fn chat_id(&self) -> &str;

    /// Latest snapshot, or `None` before the client produced one.
    fn current_state(&self) -> Option<Arc<ChatSnapshot>>;

    /// Register for state changes.
    fn on_state_change(&self, listener: StateListener) -> ListenerId;

    /// Remove a registration. Returns `false` if it was not registered.
    fn off_state_change(&self, id: ListenerId) -> bool;
}

/// Source of chat client handles, keyed by chat id.
pub trait ChatClientProvider: Send + Sync {
    fn client_for(&self, chat_id: &str) -> Arc<dyn ChatClientHandle>;
}
