//! Validation utilities.

use crate::types::ChatError;

/// Longest message body the chat service accepts.
pub const MAX_MESSAGE_LENGTH: usize = 28_000;

/// Longest chat topic the chat service accepts.
pub const MAX_TOPIC_LENGTH: usize = 250;

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate message content
    pub fn message_content(content: &str) -> Result<(), ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::validation("Message content cannot be empty"));
        }

        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::validation(format!(
                "Message content too long (max {MAX_MESSAGE_LENGTH} characters)"
            )));
        }

        Ok(())
    }

    /// Validate chat topic
    pub fn chat_topic(topic: &str) -> Result<(), ChatError> {
        if topic.trim().is_empty() {
            return Err(ChatError::validation("Chat topic cannot be empty"));
        }

        if topic.chars().count() > MAX_TOPIC_LENGTH {
            return Err(ChatError::validation(format!(
                "Chat topic too long (max {MAX_TOPIC_LENGTH} characters)"
            )));
        }

        Ok(())
    }

    /// Validate a single user id
    pub fn user_id(user_id: &str) -> Result<(), ChatError> {
        if user_id.trim().is_empty() {
            return Err(ChatError::validation("User id cannot be empty"));
        }

        if user_id.chars().any(char::is_whitespace) {
            return Err(ChatError::validation(format!(
                "User id contains whitespace: {user_id:?}"
            )));
        }

        Ok(())
    }

    /// Validate a list of user ids to add to a chat
    pub fn member_ids(user_ids: &[String]) -> Result<(), ChatError> {
        if user_ids.is_empty() {
            return Err(ChatError::validation("At least one member is required"));
        }

        for user_id in user_ids {
            Self::user_id(user_id)?;
        }

        Ok(())
    }
}
