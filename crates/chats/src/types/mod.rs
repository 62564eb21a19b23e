//! Shared types and interfaces for the chat surface.
//!
//! This module contains the error definitions, the command vocabulary and the
//! intent handle that are used across the client, bridge and surface modules.

pub mod errors;
pub mod events;
pub mod intents;

// Re-export common types
pub use errors::{ChatError, ChatResult};
pub use events::ChatCommand;
pub use intents::{ChatCommandSink, ChatIntents};

// Common type aliases
pub type ChatId = String;
pub type MessageId = String;
pub type UserId = String;
