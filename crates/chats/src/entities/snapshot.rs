use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chat::ChatInfo;
use super::member::Participant;
use super::message::MessageEntity;
use crate::types::{ChatError, ChatIntents};

/// Immutable point-in-time view of one chat.
///
/// Snapshots are produced by the chat client and shared behind an `Arc`.
/// A change always publishes a new `Arc`, so comparing two snapshots with
/// `Arc::ptr_eq` tells whether anything changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    /// Local participant; unset until the session is ready
    pub user_id: Option<String>,
    pub chat: Option<ChatInfo>,
    pub participants: Vec<Participant>,
    /// Oldest first
    pub messages: Vec<MessageEntity>,
    /// Progress or failure; only shown while `messages` is empty
    pub status: ChatStatus,
    pub disable_editing: bool,
    /// How many older messages a "load more" request asks for
    pub number_of_chat_messages_to_reload: u32,
    pub active_error_messages: Vec<ActiveErrorMessage>,
    #[serde(skip)]
    pub intents: ChatIntents,
}

impl ChatSnapshot {
    /// The defined empty state exposed before a client has produced anything.
    pub fn loading() -> Self {
        Self {
            user_id: None,
            chat: None,
            participants: Vec::new(),
            messages: Vec::new(),
            status: ChatStatus::Initial,
            disable_editing: false,
            number_of_chat_messages_to_reload: 0,
            active_error_messages: Vec::new(),
            intents: ChatIntents::detached(),
        }
    }

    /// Whether a render pass should show the interactive chat.
    ///
    /// Requires a ready session and at least one message.
    pub fn is_interactive(&self) -> bool {
        self.user_id.is_some() && !self.messages.is_empty()
    }

    pub fn is_group(&self) -> bool {
        self.chat.as_ref().is_some_and(ChatInfo::is_group)
    }

    pub fn find_message(&self, id: &str) -> Option<&MessageEntity> {
        self.messages.iter().find(|message| message.matches_id(id))
    }

    pub fn find_participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|member| member.user_id == user_id)
    }
}

impl Default for ChatSnapshot {
    fn default() -> Self {
        Self::loading()
    }
}

/// Loading progression of a chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ChatStatus {
    Initial,
    CreatingClient,
    Subscribing,
    LoadingMessages,
    NoMessages,
    Ready,
    ChatNotFound,
    Failed { reason: String },
}

impl ChatStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ChatStatus::ChatNotFound | ChatStatus::Failed { .. })
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatStatus::Initial => f.write_str("initial"),
            ChatStatus::CreatingClient => f.write_str("creating server connections"),
            ChatStatus::Subscribing => f.write_str("subscribing to notifications"),
            ChatStatus::LoadingMessages => f.write_str("loading messages"),
            ChatStatus::NoMessages => f.write_str("no messages"),
            ChatStatus::Ready => f.write_str("ready"),
            ChatStatus::ChatNotFound => f.write_str("chat not found"),
            ChatStatus::Failed { reason } => write!(f, "error: {reason}"),
        }
    }
}

/// Category of a surfaced error, used by the error bar to pick its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    UnableToReachChatService,
    AccessDenied,
    UserNotInChatThread,
    SendMessageGeneric,
    EditMessageGeneric,
    DeleteMessageGeneric,
    RenameChatGeneric,
    ManageMembersGeneric,
    LoadMessagesGeneric,
}

/// A non-fatal error surfaced to the user as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveErrorMessage {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ActiveErrorMessage {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Surface `error`, falling back to `fallback` when the error has no
    /// category of its own.
    pub fn from_error(error: &ChatError, fallback: ErrorType) -> Self {
        Self::new(error.error_type().unwrap_or(fallback), error.to_string())
    }
}
