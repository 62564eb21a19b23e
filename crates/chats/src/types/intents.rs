//! Callback references handed to the render layer with every snapshot.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::events::ChatCommand;

/// Receiver of chat commands, implemented by chat clients.
pub trait ChatCommandSink: Send + Sync {
    /// Accept a command. Must not block and must not fail; problems are
    /// reported through a later snapshot.
    fn dispatch(&self, command: ChatCommand);
}

/// Cloneable handle the renderer uses to express intents.
///
/// A detached handle (the one in the empty loading snapshot) drops every
/// command.
#[derive(Clone, Default)]
pub struct ChatIntents {
    sink: Option<Arc<dyn ChatCommandSink>>,
}

impl ChatIntents {
    pub fn new(sink: Arc<dyn ChatCommandSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn detached() -> Self {
        Self { sink: None }
    }

    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    pub fn dispatch(&self, command: ChatCommand) {
        match &self.sink {
            Some(sink) => sink.dispatch(command),
            None => debug!(
                command = command.command_type_name(),
                "dropping command issued before the chat client was ready"
            ),
        }
    }

    pub fn send_message(&self, content: impl Into<String>) {
        self.dispatch(ChatCommand::SendMessage {
            content: content.into(),
        });
    }

    pub fn delete_message(&self, message_id: impl Into<String>) {
        self.dispatch(ChatCommand::DeleteMessage {
            message_id: message_id.into(),
        });
    }

    pub fn update_message(&self, message_id: impl Into<String>, content: impl Into<String>) {
        self.dispatch(ChatCommand::UpdateMessage {
            message_id: message_id.into(),
            content: content.into(),
        });
    }

    pub fn rename_chat(&self, topic: impl Into<String>) {
        self.dispatch(ChatCommand::RenameChat {
            topic: topic.into(),
        });
    }

    pub fn add_chat_members<I, S>(&self, user_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch(ChatCommand::AddChatMembers {
            user_ids: user_ids.into_iter().map(Into::into).collect(),
        });
    }

    pub fn remove_chat_member(&self, user_id: impl Into<String>) {
        self.dispatch(ChatCommand::RemoveChatMember {
            user_id: user_id.into(),
        });
    }

    pub fn load_previous_chat_messages(&self, count: u32) {
        self.dispatch(ChatCommand::LoadPreviousChatMessages { count });
    }
}

impl fmt::Debug for ChatIntents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatIntents")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        commands: Mutex<Vec<ChatCommand>>,
    }

    impl ChatCommandSink for RecordingSink {
        fn dispatch(&self, command: ChatCommand) {
            self.commands.lock().unwrap().push(command);
        }
    }

    #[test]
    fn test_intents_forward_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let intents = ChatIntents::new(sink.clone());

        intents.send_message("hello");
        intents.add_chat_members(["bob", "carol"]);
        intents.load_previous_chat_messages(5);

        let commands = sink.commands.lock().unwrap();
        assert_eq!(
            *commands,
            vec![
                ChatCommand::SendMessage {
                    content: "hello".to_string()
                },
                ChatCommand::AddChatMembers {
                    user_ids: vec!["bob".to_string(), "carol".to_string()]
                },
                ChatCommand::LoadPreviousChatMessages { count: 5 },
            ]
        );
    }

    #[test]
    fn test_detached_intents_drop_commands() {
        let intents = ChatIntents::detached();
        assert!(!intents.is_attached());
        intents.send_message("nobody listens");
        assert_eq!(format!("{intents:?}"), "ChatIntents { attached: false }");
    }
}
