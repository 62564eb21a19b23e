use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::member::Participant;

/// One entry of a chat thread.
///
/// Only [`MessageEntity::Chat`] carries renderable body text; the other
/// variants describe events and never reach the content filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum MessageEntity {
    Chat(ChatMessage),
    System(SystemMessage),
    Custom(CustomMessage),
}

impl MessageEntity {
    pub fn message_id(&self) -> &str {
        match self {
            MessageEntity::Chat(message) => &message.message_id,
            MessageEntity::System(message) => &message.message_id,
            MessageEntity::Custom(message) => &message.message_id,
        }
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        match self {
            MessageEntity::Chat(message) => message.created_on,
            MessageEntity::System(message) => message.created_on,
            MessageEntity::Custom(message) => message.created_on,
        }
    }

    /// Body text of content-bearing messages.
    pub fn content(&self) -> Option<&str> {
        match self {
            MessageEntity::Chat(message) => Some(&message.content),
            MessageEntity::System(_) | MessageEntity::Custom(_) => None,
        }
    }

    pub fn as_chat(&self) -> Option<&ChatMessage> {
        match self {
            MessageEntity::Chat(message) => Some(message),
            MessageEntity::System(_) | MessageEntity::Custom(_) => None,
        }
    }

    /// Matches either the service id or the id the sender assigned locally.
    pub fn matches_id(&self, id: &str) -> bool {
        if self.message_id() == id {
            return true;
        }
        matches!(
            self,
            MessageEntity::Chat(ChatMessage { client_message_id: Some(client_id), .. })
                if client_id == id
        )
    }

    pub fn event_type_name(&self) -> &'static str {
        match self {
            MessageEntity::Chat(_) => "chat",
            MessageEntity::System(_) => "system",
            MessageEntity::Custom(_) => "custom",
        }
    }
}

impl From<ChatMessage> for MessageEntity {
    fn from(message: ChatMessage) -> Self {
        MessageEntity::Chat(message)
    }
}

impl From<SystemMessage> for MessageEntity {
    fn from(message: SystemMessage) -> Self {
        MessageEntity::System(message)
    }
}

impl From<CustomMessage> for MessageEntity {
    fn from(message: CustomMessage) -> Self {
        MessageEntity::Custom(message)
    }
}

/// A message written by a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Id assigned by the chat service
    pub message_id: String,
    /// Id assigned by the sending client before the service acknowledged it
    pub client_message_id: Option<String>,
    pub sender_id: String,
    pub sender_display_name: Option<String>,
    /// HTML-shaped body text
    pub content: String,
    pub content_type: ContentType,
    pub created_on: DateTime<Utc>,
    pub edited_on: Option<DateTime<Utc>>,
    /// Whether the local participant sent this message
    pub mine: bool,
    pub status: MessageStatus,
}

impl ChatMessage {
    /// Create a message authored by `sender_id` with a fresh service id.
    pub fn new(sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            client_message_id: None,
            sender_id: sender_id.into(),
            sender_display_name: None,
            content: content.into(),
            content_type: ContentType::Html,
            created_on: Utc::now(),
            edited_on: None,
            mine: false,
            status: MessageStatus::Delivered,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.sender_display_name = Some(name.into());
        self
    }

    pub fn with_created_on(mut self, created_on: DateTime<Utc>) -> Self {
        self.created_on = created_on;
        self
    }

    pub fn is_edited(&self) -> bool {
        self.edited_on.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    Text,
    Html,
    RichTextHtml,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Delivered,
    Seen,
    Failed,
}

/// A membership or metadata event rendered inline in the thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub message_id: String,
    pub created_on: DateTime<Utc>,
    pub event: SystemEvent,
}

impl SystemMessage {
    pub fn new(event: SystemEvent) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            created_on: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "systemMessageType", rename_all = "camelCase")]
pub enum SystemEvent {
    ParticipantAdded { participants: Vec<Participant> },
    ParticipantRemoved { participants: Vec<Participant> },
    TopicUpdated { topic: String },
}

/// Application-defined thread entry, rendered by a custom renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessage {
    pub message_id: String,
    pub created_on: DateTime<Utc>,
    pub custom_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}
