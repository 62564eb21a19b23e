//! # Switchboard Chats Crate
//!
//! This crate provides the chat surface of Switchboard: the view-state bridge
//! between a push-based chat client and a render loop, the content filter
//! applied to every rendered message, and the render model built from both.
//!
//! ## Architecture
//!
//! - **Entities**: Snapshot, chat metadata, participants and thread entries
//! - **Client**: Chat client interface plus an in-memory reference client
//! - **Bridge**: Latest-snapshot holder with ordered listener fan-out
//! - **Surface**: Lifecycle binding and render model
//! - **Types**: Errors, commands and the intent handle
//! - **Utils**: Content sanitizer and validation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchboard_chats::{ChatSurfaceBinding, ContentSanitizer, LocalChatRegistry};
//!
//! let registry = Arc::new(LocalChatRegistry::new(config.thread.clone()));
//! let sanitizer = ContentSanitizer::from_config(&config.sanitizer)?;
//!
//! let binding = ChatSurfaceBinding::new(registry.clone());
//! binding.activate("19:general");
//! let view = binding.render(&sanitizer);
//! ```

pub mod bridge;
pub mod client;
pub mod entities;
pub mod surface;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use bridge::{ListenerId, ListenerTable, StateListener, Subscription, ViewStateBridge};
pub use client::{
    command_channel, run_command_loop, ChatClientHandle, ChatClientProvider, CommandReceiver,
    LocalChatClient, LocalChatRegistry, QueuedCommands,
};
pub use entities::{
    ActiveErrorMessage, ChatInfo, ChatMessage, ChatSnapshot, ChatStatus, ChatType, ContentType,
    CustomMessage, ErrorType, MessageEntity, MessageStatus, Participant, SystemEvent,
    SystemMessage,
};
pub use surface::{render_surface, ChatSurfaceBinding, ChatView, RedrawHook, SurfaceView};
pub use types::{ChatCommand, ChatCommandSink, ChatError, ChatIntents, ChatResult};
pub use utils::{ContentSanitizer, Validator, Verdict};
