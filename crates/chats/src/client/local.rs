//! In-memory chat client.
//!
//! [`LocalChatClient`] holds the authoritative state of one chat and publishes
//! a fresh snapshot for every change. Session progress and inbound traffic are
//! driven by its owner (the demo binary, tests); commands arrive through the
//! intents carried by each snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use switchboard_config::ThreadConfig;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::queue::{command_channel, CommandReceiver};
use super::{ChatClientHandle, ChatClientProvider};
use crate::bridge::listeners::lock;
use crate::bridge::{ListenerId, ListenerTable, StateListener};
use crate::entities::{
    ActiveErrorMessage, ChatInfo, ChatMessage, ChatSnapshot, ChatStatus, ErrorType,
    MessageEntity, Participant, SystemEvent, SystemMessage,
};
use crate::types::{ChatCommand, ChatCommandSink, ChatError, ChatIntents, ChatResult};
use crate::utils::Validator;

#[derive(Default)]
struct ClientState {
    current: Option<Arc<ChatSnapshot>>,
    /// Older history not yet shown, oldest first
    backlog: Vec<MessageEntity>,
}

/// Reference chat client keeping everything in memory.
pub struct LocalChatClient {
    chat_id: String,
    thread: ThreadConfig,
    sink: Arc<dyn ChatCommandSink>,
    state: Mutex<ClientState>,
    listeners: ListenerTable,
}

/// Routes intents back to the client without keeping it alive.
struct ClientSink(Weak<LocalChatClient>);

impl ChatCommandSink for ClientSink {
    fn dispatch(&self, command: ChatCommand) {
        match self.0.upgrade() {
            Some(client) => client.apply(command),
            None => debug!(
                command = command.command_type_name(),
                "dropping command for a chat client that no longer exists"
            ),
        }
    }
}

impl LocalChatClient {
    /// Create a client whose intents are applied synchronously.
    pub fn new(chat_id: impl Into<String>, thread: ThreadConfig) -> Arc<Self> {
        let chat_id = chat_id.into();
        Arc::new_cyclic(|client: &Weak<Self>| {
            Self::build(chat_id, thread, Arc::new(ClientSink(client.clone())))
        })
    }

    /// Create a client whose intents go to `sink` instead of the client
    /// itself.
    pub fn with_command_sink(
        chat_id: impl Into<String>,
        thread: ThreadConfig,
        sink: Arc<dyn ChatCommandSink>,
    ) -> Arc<Self> {
        Arc::new(Self::build(chat_id.into(), thread, sink))
    }

    /// Create a client whose intents are queued; drive the receiver with
    /// [`run_command_loop`](super::run_command_loop).
    pub fn queued(chat_id: impl Into<String>, thread: ThreadConfig) -> (Arc<Self>, CommandReceiver) {
        let (sink, receiver) = command_channel();
        (Self::with_command_sink(chat_id, thread, Arc::new(sink)), receiver)
    }

    fn build(chat_id: String, thread: ThreadConfig, sink: Arc<dyn ChatCommandSink>) -> Self {
        Self {
            chat_id,
            thread,
            sink,
            state: Mutex::new(ClientState::default()),
            listeners: ListenerTable::new(),
        }
    }

    pub fn thread_config(&self) -> &ThreadConfig {
        &self.thread
    }

    /// Number of registered state listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of older messages still available to "load more".
    pub fn backlog_len(&self) -> usize {
        lock(&self.state).backlog.len()
    }

    /// Start connecting: `CreatingClient`, then `Subscribing`.
    pub fn begin_session(&self) {
        info!(chat_id = %self.chat_id, "creating chat client");
        self.publish(|draft, _| draft.status = ChatStatus::CreatingClient);
        self.publish(|draft, _| draft.status = ChatStatus::Subscribing);
    }

    /// Mark the session ready for `user_id`.
    pub fn establish_session(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(chat_id = %self.chat_id, user_id, "chat session established");
        self.publish(move |draft, _| draft.user_id = Some(user_id));
    }

    /// Load chat metadata and history.
    ///
    /// Publishes a `LoadingMessages` snapshot with the chat and participants,
    /// then one with the last `page_size` messages of `history`. The rest is
    /// kept for "load more".
    pub fn load_chat(
        &self,
        info: ChatInfo,
        participants: Vec<Participant>,
        mut history: Vec<MessageEntity>,
    ) {
        info!(chat_id = %self.chat_id, messages = history.len(), "loading chat");
        self.publish(move |draft, _| {
            draft.chat = Some(info);
            draft.participants = participants;
            draft.status = ChatStatus::LoadingMessages;
        });

        history.sort_by_key(MessageEntity::created_on);
        let split = history.len().saturating_sub(self.thread.page_size);
        let visible = history.split_off(split);
        self.publish(move |draft, backlog| {
            *backlog = history;
            draft.messages = visible;
            draft.status = if draft.messages.is_empty() {
                ChatStatus::NoMessages
            } else {
                ChatStatus::Ready
            };
        });
    }

    /// The session could not be set up or was lost.
    pub fn fail_session(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(chat_id = %self.chat_id, reason, "chat session failed");
        self.publish(move |draft, _| {
            draft.active_error_messages.push(ActiveErrorMessage::new(
                ErrorType::UnableToReachChatService,
                reason.clone(),
            ));
            draft.status = ChatStatus::Failed { reason };
        });
    }

    /// The local user has no access to this chat.
    pub fn chat_not_found(&self) {
        warn!(chat_id = %self.chat_id, "chat not found");
        let error = ChatError::chat_not_found(self.chat_id.as_str());
        self.publish(move |draft, _| {
            draft.status = ChatStatus::ChatNotFound;
            draft
                .active_error_messages
                .push(ActiveErrorMessage::from_error(&error, ErrorType::UserNotInChatThread));
        });
    }

    /// Message from another participant. Replaces a message with the same id.
    pub fn receive_message(&self, message: MessageEntity) {
        debug!(
            chat_id = %self.chat_id,
            message_id = message.message_id(),
            kind = message.event_type_name(),
            "inbound message"
        );
        self.publish(move |draft, _| {
            let existing = draft
                .messages
                .iter()
                .position(|known| known.message_id() == message.message_id());
            match existing {
                Some(index) => draft.messages[index] = message,
                None => draft.messages.push(message),
            }
            refresh_status(draft);
        });
    }

    pub fn participant_joined(&self, participant: Participant) {
        debug!(chat_id = %self.chat_id, user_id = %participant.user_id, "participant joined");
        self.publish(move |draft, _| {
            let known = draft
                .participants
                .iter()
                .position(|member| member.user_id == participant.user_id);
            match known {
                Some(index) => draft.participants[index] = participant,
                None => {
                    draft.participants.push(participant.clone());
                    draft.messages.push(
                        SystemMessage::new(SystemEvent::ParticipantAdded {
                            participants: vec![participant],
                        })
                        .into(),
                    );
                    refresh_status(draft);
                }
            }
        });
    }

    pub fn participant_left(&self, user_id: &str) {
        debug!(chat_id = %self.chat_id, user_id, "participant left");
        self.publish(|draft, _| {
            if let Some(index) = draft
                .participants
                .iter()
                .position(|member| member.user_id == user_id)
            {
                let removed = draft.participants.remove(index);
                draft.messages.push(
                    SystemMessage::new(SystemEvent::ParticipantRemoved {
                        participants: vec![removed],
                    })
                    .into(),
                );
                refresh_status(draft);
            }
        });
    }

    pub fn set_disable_editing(&self, disable_editing: bool) {
        self.publish(move |draft, _| draft.disable_editing = disable_editing);
    }

    /// Dismiss everything shown in the error bar.
    pub fn clear_errors(&self) {
        self.publish(|draft, _| draft.active_error_messages.clear());
    }

    /// Apply one command. Rejections end up in `active_error_messages`.
    pub fn apply(&self, command: ChatCommand) {
        let name = command.command_type_name();
        let fallback = command.failure_type();
        self.publish(|draft, backlog| match self.execute(draft, backlog, command) {
            Ok(()) => debug!(chat_id = %self.chat_id, command = name, "command applied"),
            Err(error) => {
                warn!(chat_id = %self.chat_id, command = name, %error, "command rejected");
                draft
                    .active_error_messages
                    .push(ActiveErrorMessage::from_error(&error, fallback));
            }
        });
    }

    /// Every branch validates before touching `draft`.
    fn execute(
        &self,
        draft: &mut ChatSnapshot,
        backlog: &mut Vec<MessageEntity>,
        command: ChatCommand,
    ) -> ChatResult<()> {
        let user_id = draft.user_id.clone().ok_or(ChatError::SessionNotReady)?;

        match command {
            ChatCommand::SendMessage { content } => {
                Validator::message_content(&content)?;
                let mut message = ChatMessage::new(user_id.as_str(), content);
                message.client_message_id = Some(Uuid::new_v4().to_string());
                message.sender_display_name = draft
                    .find_participant(&user_id)
                    .and_then(|member| member.display_name.clone());
                message.mine = true;
                draft.messages.push(message.into());
            }
            ChatCommand::DeleteMessage { message_id } => {
                let index = own_message_index(draft, &user_id, &message_id)?;
                draft.messages.remove(index);
            }
            ChatCommand::UpdateMessage {
                message_id,
                content,
            } => {
                if draft.disable_editing {
                    return Err(ChatError::EditingDisabled);
                }
                Validator::message_content(&content)?;
                let index = own_message_index(draft, &user_id, &message_id)?;
                if let MessageEntity::Chat(message) = &mut draft.messages[index] {
                    message.content = content;
                    message.edited_on = Some(Utc::now());
                }
            }
            ChatCommand::RenameChat { topic } => {
                Validator::chat_topic(&topic)?;
                let topic = topic.trim().to_string();
                let chat = draft
                    .chat
                    .as_mut()
                    .ok_or_else(|| ChatError::chat_not_found(self.chat_id.as_str()))?;
                chat.topic = Some(topic.clone());
                draft
                    .messages
                    .push(SystemMessage::new(SystemEvent::TopicUpdated { topic }).into());
            }
            ChatCommand::AddChatMembers { user_ids } => {
                Validator::member_ids(&user_ids)?;
                if !draft.is_group() {
                    return Err(ChatError::validation(
                        "Members can only be added to group chats",
                    ));
                }
                let mut added: Vec<Participant> = Vec::new();
                for id in user_ids {
                    let known = draft.find_participant(&id).is_some()
                        || added.iter().any(|member| member.user_id == id);
                    if !known {
                        added.push(Participant::new(id));
                    }
                }
                if !added.is_empty() {
                    draft.participants.extend(added.iter().cloned());
                    draft.messages.push(
                        SystemMessage::new(SystemEvent::ParticipantAdded {
                            participants: added,
                        })
                        .into(),
                    );
                }
            }
            ChatCommand::RemoveChatMember { user_id: member } => {
                if !draft.is_group() {
                    return Err(ChatError::validation(
                        "Members can only be removed from group chats",
                    ));
                }
                let index = draft
                    .participants
                    .iter()
                    .position(|known| known.user_id == member)
                    .ok_or_else(|| ChatError::member_not_found(member.as_str()))?;
                let removed = draft.participants.remove(index);
                draft.messages.push(
                    SystemMessage::new(SystemEvent::ParticipantRemoved {
                        participants: vec![removed],
                    })
                    .into(),
                );
            }
            ChatCommand::LoadPreviousChatMessages { count } => {
                let count = if count == 0 {
                    draft.number_of_chat_messages_to_reload
                } else {
                    count
                };
                let count = count as usize;
                let older = backlog.split_off(backlog.len().saturating_sub(count));
                debug!(chat_id = %self.chat_id, loaded = older.len(), remaining = backlog.len(), "loaded previous messages");
                draft.messages.splice(0..0, older);
            }
        }

        refresh_status(draft);
        Ok(())
    }

    /// Copy the current snapshot, let `mutate` change the copy and publish it.
    ///
    /// The snapshot is queued while the state lock is held, so concurrent
    /// producers deliver in the order they published.
    fn publish<F>(&self, mutate: F)
    where
        F: FnOnce(&mut ChatSnapshot, &mut Vec<MessageEntity>),
    {
        {
            let mut state = lock(&self.state);
            let ClientState { current, backlog } = &mut *state;
            let mut draft = match current {
                Some(snapshot) => (**snapshot).clone(),
                None => self.blank(),
            };
            mutate(&mut draft, backlog);

            let snapshot = Arc::new(draft);
            *current = Some(snapshot.clone());
            self.listeners.enqueue(snapshot);
        }
        self.listeners.deliver_pending();
    }

    fn blank(&self) -> ChatSnapshot {
        ChatSnapshot {
            disable_editing: self.thread.disable_editing,
            number_of_chat_messages_to_reload: self.thread.messages_to_reload,
            intents: ChatIntents::new(self.sink.clone()),
            ..ChatSnapshot::loading()
        }
    }
}

impl ChatCommandSink for LocalChatClient {
    fn dispatch(&self, command: ChatCommand) {
        self.apply(command);
    }
}

impl ChatClientHandle for LocalChatClient {
    fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn current_state(&self) -> Option<Arc<ChatSnapshot>> {
        lock(&self.state).current.clone()
    }

    fn on_state_change(&self, listener: StateListener) -> ListenerId {
        self.listeners.insert(listener)
    }

    fn off_state_change(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

/// Position of a chat message the local user may change.
fn own_message_index(draft: &ChatSnapshot, user_id: &str, message_id: &str) -> ChatResult<usize> {
    let index = draft
        .messages
        .iter()
        .position(|message| message.matches_id(message_id))
        .ok_or_else(|| ChatError::message_not_found(message_id))?;

    match draft.messages[index].as_chat() {
        Some(message) if message.mine || message.sender_id == user_id => Ok(index),
        Some(_) => Err(ChatError::validation(
            "Only your own messages can be changed",
        )),
        None => Err(ChatError::validation("System messages cannot be changed")),
    }
}

fn refresh_status(draft: &mut ChatSnapshot) {
    match draft.status {
        ChatStatus::NoMessages if !draft.messages.is_empty() => draft.status = ChatStatus::Ready,
        ChatStatus::Ready if draft.messages.is_empty() => draft.status = ChatStatus::NoMessages,
        _ => {}
    }
}

/// Provider handing out one [`LocalChatClient`] per chat id.
pub struct LocalChatRegistry {
    thread: ThreadConfig,
    clients: Mutex<HashMap<String, Arc<LocalChatClient>>>,
}

impl LocalChatRegistry {
    /// Create a new registry; clients are created on first request
    pub fn new(thread: ThreadConfig) -> Self {
        Self {
            thread,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Typed access to the client for `chat_id`, creating it if needed.
    pub fn local_client(&self, chat_id: &str) -> Arc<LocalChatClient> {
        lock(&self.clients)
            .entry(chat_id.to_string())
            .or_insert_with(|| {
                debug!(chat_id, "creating local chat client");
                LocalChatClient::new(chat_id, self.thread.clone())
            })
            .clone()
    }

    pub fn get(&self, chat_id: &str) -> Option<Arc<LocalChatClient>> {
        lock(&self.clients).get(chat_id).cloned()
    }

    /// Known chat ids, sorted.
    pub fn chat_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.clients).keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        lock(&self.clients).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.clients).is_empty()
    }
}

impl ChatClientProvider for LocalChatRegistry {
    fn client_for(&self, chat_id: &str) -> Arc<dyn ChatClientHandle> {
        self.local_client(chat_id)
    }
}
