//! Asynchronous command path.
//!
//! Intents stay fire-and-forget: [`QueuedCommands`] only pushes onto a tokio
//! channel, and [`run_command_loop`] applies each command to the client, whose
//! next snapshot carries the outcome.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::local::LocalChatClient;
use super::ChatClientHandle;
use crate::types::{ChatCommand, ChatCommandSink, ChatError};

/// Receiving half of a command channel.
pub type CommandReceiver = mpsc::UnboundedReceiver<ChatCommand>;

/// Command sink that forwards onto a channel.
#[derive(Debug, Clone)]
pub struct QueuedCommands {
    sender: mpsc::UnboundedSender<ChatCommand>,
}

impl QueuedCommands {
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl ChatCommandSink for QueuedCommands {
    fn dispatch(&self, command: ChatCommand) {
        let name = command.command_type_name();
        if self.sender.send(command).is_err() {
            warn!(command = name, error = %ChatError::CommandChannelClosed, "command dropped");
        }
    }
}

/// Create a connected sink/receiver pair.
pub fn command_channel() -> (QueuedCommands, CommandReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (QueuedCommands { sender }, receiver)
}

/// Apply queued commands to `client` until it is released.
///
/// The loop only keeps a weak reference. It ends when every sender is gone,
/// which happens once the client and the snapshots carrying its intents are
/// dropped, or at the first command that arrives after the client is gone.
pub async fn run_command_loop(client: Arc<LocalChatClient>, mut commands: CommandReceiver) {
    let chat_id = client.chat_id().to_string();
    let target = Arc::downgrade(&client);
    drop(client);

    let mut applied = 0usize;
    while let Some(command) = commands.recv().await {
        let Some(client) = target.upgrade() else {
            debug!(
                chat_id = %chat_id,
                command = command.command_type_name(),
                "chat client released, stopping command loop"
            );
            break;
        };
        client.apply(command);
        applied += 1;
    }
    debug!(chat_id = %chat_id, applied, "command loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatClientHandle;
    use crate::entities::{ChatInfo, ChatType};
    use std::time::Duration;
    use switchboard_config::ThreadConfig;

    async fn finishes(worker: tokio::task::JoinHandle<()>) -> bool {
        tokio::time::timeout(Duration::from_secs(1), worker).await.is_ok()
    }

    #[tokio::test]
    async fn test_queued_commands_are_applied_in_order() {
        let (client, receiver) = LocalChatClient::queued("19:queued", ThreadConfig::default());
        client.establish_session("me");
        client.load_chat(ChatInfo::new("19:queued", ChatType::Group), Vec::new(), Vec::new());

        let intents = client.current_state().unwrap().intents.clone();
        intents.send_message("one");
        intents.send_message("two");

        // Nothing happens until the loop runs.
        assert!(client.current_state().unwrap().messages.is_empty());

        let worker = tokio::spawn(run_command_loop(client.clone(), receiver));

        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if client.current_state().unwrap().messages.len() == 2 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let contents: Vec<_> = client
            .current_state()
            .unwrap()
            .messages
            .iter()
            .filter_map(|message| message.content().map(str::to_string))
            .collect();
        assert_eq!(contents, vec!["one", "two"]);

        drop(intents);
        drop(client);
        assert!(finishes(worker).await);
    }

    #[tokio::test]
    async fn test_loop_ends_when_client_is_released() {
        let (client, receiver) = LocalChatClient::queued("19:released", ThreadConfig::default());
        client.establish_session("me");

        let worker = tokio::spawn(run_command_loop(client.clone(), receiver));
        tokio::task::yield_now().await;
        drop(client);

        assert!(finishes(worker).await);
    }

    #[tokio::test]
    async fn test_loop_ends_on_command_after_client_is_released() {
        let (client, receiver) = LocalChatClient::queued("19:stale", ThreadConfig::default());
        client.establish_session("me");
        let stale = client.current_state().unwrap();

        let worker = tokio::spawn(run_command_loop(client.clone(), receiver));
        drop(client);

        // The stale snapshot still holds a sender.
        stale.intents.send_message("too late");
        assert!(finishes(worker).await);
    }

    #[test]
    fn test_dispatch_after_receiver_dropped_is_absorbed() {
        let (sink, receiver) = command_channel();
        drop(receiver);

        assert!(sink.is_closed());
        sink.dispatch(ChatCommand::SendMessage {
            content: "lost".to_string(),
        });
    }
}
