//! Domain entities for the chat surface.
//!
//! This module contains the data the chat client publishes: snapshots, chat
//! metadata, members and thread entries. These are plain values without any
//! subscription or rendering concerns.

pub mod chat;
pub mod member;
pub mod message;
pub mod snapshot;

// Re-export all entity types
pub use chat::{ChatInfo, ChatType};
pub use member::Participant;
pub use message::{
    ChatMessage, ContentType, CustomMessage, MessageEntity, MessageStatus, SystemEvent,
    SystemMessage,
};
pub use snapshot::{ActiveErrorMessage, ChatSnapshot, ChatStatus, ErrorType};
