//! Error types for the chat surface.

use thiserror::Error;

use crate::entities::ErrorType;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat surface.
///
/// These never cross the bridge boundary; the chat client turns them into
/// entries of `active_error_messages` instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChatError {
    #[error("Chat session is not ready")]
    SessionNotReady,

    #[error("Chat not found: {id}")]
    ChatNotFound { id: String },

    #[error("Message not found: {id}")]
    MessageNotFound { id: String },

    #[error("Member not found: {id}")]
    MemberNotFound { id: String },

    #[error("Editing is disabled for this chat")]
    EditingDisabled,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Command channel closed")]
    CommandChannelClosed,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ChatError {
    /// Create a not found error for chats
    pub fn chat_not_found(id: impl Into<String>) -> Self {
        Self::ChatNotFound { id: id.into() }
    }

    /// Create a not found error for messages
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::MessageNotFound { id: id.into() }
    }

    /// Create a not found error for members
    pub fn member_not_found(id: impl Into<String>) -> Self {
        Self::MemberNotFound { id: id.into() }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Error bar category implied by the error itself, if any.
    ///
    /// Errors without a category of their own take the category of the
    /// command that produced them.
    pub fn error_type(&self) -> Option<ErrorType> {
        match self {
            ChatError::SessionNotReady | ChatError::CommandChannelClosed => {
                Some(ErrorType::UnableToReachChatService)
            }
            ChatError::ChatNotFound { .. } => Some(ErrorType::UserNotInChatThread),
            ChatError::EditingDisabled => Some(ErrorType::EditMessageGeneric),
            ChatError::MessageNotFound { .. }
            | ChatError::MemberNotFound { .. }
            | ChatError::Validation { .. }
            | ChatError::Configuration { .. }
            | ChatError::Internal { .. } => None,
        }
    }
}
