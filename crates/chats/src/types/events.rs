//! Mutating intents issued by the render layer.

use serde::{Deserialize, Serialize};

use crate::entities::ErrorType;

/// A request to change chat state.
///
/// Commands are fire-and-forget: the outcome shows up in a later snapshot,
/// either as changed state or as an entry in `active_error_messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatCommand {
    /// Post a new message as the local participant
    SendMessage { content: String },

    /// Remove a message; `message_id` may also be a client message id
    DeleteMessage { message_id: String },

    /// Replace the content of an existing message
    UpdateMessage { message_id: String, content: String },

    /// Change the chat topic
    RenameChat { topic: String },

    /// Add members to a group chat
    AddChatMembers { user_ids: Vec<String> },

    /// Remove a member from a group chat
    RemoveChatMember { user_id: String },

    /// Reveal up to `count` older messages
    LoadPreviousChatMessages { count: u32 },
}

impl ChatCommand {
    /// Get command type name for logging
    pub fn command_type_name(&self) -> &'static str {
        match self {
            ChatCommand::SendMessage { .. } => "send_message",
            ChatCommand::DeleteMessage { .. } => "delete_message",
            ChatCommand::UpdateMessage { .. } => "update_message",
            ChatCommand::RenameChat { .. } => "rename_chat",
            ChatCommand::AddChatMembers { .. } => "add_chat_members",
            ChatCommand::RemoveChatMember { .. } => "remove_chat_member",
            ChatCommand::LoadPreviousChatMessages { .. } => "load_previous_chat_messages",
        }
    }

    /// Error bar category used when this command fails.
    pub fn failure_type(&self) -> ErrorType {
        match self {
            ChatCommand::SendMessage { .. } => ErrorType::SendMessageGeneric,
            ChatCommand::DeleteMessage { .. } => ErrorType::DeleteMessageGeneric,
            ChatCommand::UpdateMessage { .. } => ErrorType::EditMessageGeneric,
            ChatCommand::RenameChat { .. } => ErrorType::RenameChatGeneric,
            ChatCommand::AddChatMembers { .. } | ChatCommand::RemoveChatMember { .. } => {
                ErrorType::ManageMembersGeneric
            }
            ChatCommand::LoadPreviousChatMessages { .. } => ErrorType::LoadMessagesGeneric,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization_shape() {
        let command = ChatCommand::UpdateMessage {
            message_id: "m1".to_string(),
            content: "fixed".to_string(),
        };
        let json = serde_json::to_value(&command).expect("serialize command");
        assert_eq!(json["type"], "update_message");
        assert_eq!(json["data"]["message_id"], "m1");
    }

    #[test]
    fn test_failure_type() {
        let command = ChatCommand::RemoveChatMember {
            user_id: "bob".to_string(),
        };
        assert_eq!(command.failure_type(), ErrorType::ManageMembersGeneric);
        assert_eq!(command.command_type_name(), "remove_chat_member");
    }
}
