//! Render model of the chat surface.
//!
//! [`render_surface`] turns one snapshot into what a renderer paints. It never
//! builds or changes a snapshot; every message goes through the content
//! filter on the way.

use std::borrow::Cow;

use serde::Serialize;

use crate::entities::{ActiveErrorMessage, ChatSnapshot, ChatStatus, MessageEntity, Participant};
use crate::types::ChatIntents;
use crate::utils::ContentSanitizer;

/// Everything a render pass needs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum SurfaceView {
    /// Session not ready or no messages yet: status text plus a spinner.
    Loading { status: ChatStatus },
    Chat(ChatView),
}

impl SurfaceView {
    pub fn is_loading(&self) -> bool {
        matches!(self, SurfaceView::Loading { .. })
    }

    pub fn as_chat(&self) -> Option<&ChatView> {
        match self {
            SurfaceView::Chat(view) => Some(view),
            SurfaceView::Loading { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub header: HeaderView,
    /// Only for group chats with known participants
    pub members: Option<MembersPanel>,
    pub thread: ThreadView,
    pub send_box_enabled: bool,
    /// Error bar entries
    pub errors: Vec<ActiveErrorMessage>,
    #[serde(skip)]
    pub intents: ChatIntents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    pub title: String,
    pub current_user_id: String,
    pub rename_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersPanel {
    pub current_user_id: String,
    pub members: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    pub user_id: String,
    pub messages: Vec<RenderedMessage>,
    pub show_message_date: bool,
    pub disable_editing: bool,
    pub number_of_chat_messages_to_reload: u32,
    pub avatar: AvatarOptions,
}

/// A message as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMessage {
    pub entity: MessageEntity,
    /// Body was replaced by the unsupported-content placeholder
    pub unsupported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarOptions {
    pub size: AvatarSize,
    pub person_card: PersonCardInteraction,
}

impl Default for AvatarOptions {
    fn default() -> Self {
        Self {
            size: AvatarSize::Small,
            person_card: PersonCardInteraction::Click,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AvatarSize {
    Small,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonCardInteraction {
    None,
    Hover,
    Click,
}

/// Build the view for `snapshot`.
///
/// The surface stays in its loading state while the session has no user or
/// the thread is empty, whatever else the snapshot holds.
pub fn render_surface(snapshot: &ChatSnapshot, sanitizer: &ContentSanitizer) -> SurfaceView {
    let user_id = match snapshot.user_id.as_deref() {
        Some(user_id) if !snapshot.messages.is_empty() => user_id,
        _ => {
            return SurfaceView::Loading {
                status: snapshot.status.clone(),
            }
        }
    };

    let title = snapshot
        .chat
        .as_ref()
        .map(|chat| chat.display_title(&snapshot.participants, user_id))
        .unwrap_or_else(|| "Chat".to_string());

    let members = (!snapshot.participants.is_empty() && snapshot.is_group()).then(|| MembersPanel {
        current_user_id: user_id.to_string(),
        members: snapshot.participants.clone(),
    });

    let messages = snapshot
        .messages
        .iter()
        .map(|message| {
            let rendered = sanitizer.sanitize(message);
            RenderedMessage {
                unsupported: matches!(rendered, Cow::Owned(_)),
                entity: rendered.into_owned(),
            }
        })
        .collect();

    SurfaceView::Chat(ChatView {
        header: HeaderView {
            title,
            current_user_id: user_id.to_string(),
            rename_enabled: true,
        },
        members,
        thread: ThreadView {
            user_id: user_id.to_string(),
            messages,
            show_message_date: true,
            disable_editing: snapshot.disable_editing,
            number_of_chat_messages_to_reload: snapshot.number_of_chat_messages_to_reload,
            avatar: AvatarOptions::default(),
        },
        send_box_enabled: true,
        errors: snapshot.active_error_messages.clone(),
        intents: snapshot.intents.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ChatInfo, ChatMessage, ChatType, ErrorType};
    use switchboard_config::{DEFAULT_ALLOWED_CLOSING_TAGS, DEFAULT_UNSUPPORTED_PLACEHOLDER};

    fn sanitizer() -> ContentSanitizer {
        ContentSanitizer::new(DEFAULT_ALLOWED_CLOSING_TAGS, DEFAULT_UNSUPPORTED_PLACEHOLDER)
            .unwrap()
    }

    fn ready(chat_type: ChatType) -> ChatSnapshot {
        ChatSnapshot {
            user_id: Some("me".to_string()),
            chat: Some(ChatInfo::new("19:view", chat_type)),
            participants: vec![
                Participant::new("me").with_display_name("Me"),
                Participant::new("bob").with_display_name("Bob"),
            ],
            messages: vec![ChatMessage::new("bob", "<p>hi</p>").into()],
            status: ChatStatus::Ready,
            number_of_chat_messages_to_reload: 5,
            ..ChatSnapshot::loading()
        }
    }

    #[test]
    fn test_loading_until_user_and_messages() {
        let sanitizer = sanitizer();

        let mut snapshot = ready(ChatType::Group);
        snapshot.user_id = None;
        snapshot.status = ChatStatus::Subscribing;
        match render_surface(&snapshot, &sanitizer) {
            SurfaceView::Loading { status } => assert_eq!(status, ChatStatus::Subscribing),
            SurfaceView::Chat(_) => panic!("surface rendered without a user"),
        }

        let mut snapshot = ready(ChatType::Group);
        snapshot.messages.clear();
        snapshot
            .active_error_messages
            .push(ActiveErrorMessage::new(ErrorType::AccessDenied, "denied"));
        assert!(render_surface(&snapshot, &sanitizer).is_loading());
    }

    #[test]
    fn test_chat_view_fields() {
        let snapshot = ready(ChatType::Group);
        let view = render_surface(&snapshot, &sanitizer());
        let chat = view.as_chat().unwrap();

        assert_eq!(chat.header.title, "Bob");
        assert_eq!(chat.header.current_user_id, "me");
        assert!(chat.send_box_enabled);
        assert!(chat.thread.show_message_date);
        assert_eq!(chat.thread.number_of_chat_messages_to_reload, 5);
        assert_eq!(chat.thread.avatar, AvatarOptions::default());
        assert_eq!(chat.members.as_ref().unwrap().members.len(), 2);
    }

    #[test]
    fn test_members_panel_only_for_group_chats() {
        let sanitizer = sanitizer();
        let one_on_one = render_surface(&ready(ChatType::OneOnOne), &sanitizer);
        assert!(one_on_one.as_chat().unwrap().members.is_none());

        let mut no_members = ready(ChatType::Group);
        no_members.participants.clear();
        let view = render_surface(&no_members, &sanitizer);
        assert!(view.as_chat().unwrap().members.is_none());
        assert_eq!(view.as_chat().unwrap().header.title, "Chat");
    }

    #[test]
    fn test_unsupported_messages_are_replaced_in_view_only() {
        let mut snapshot = ready(ChatType::Group);
        snapshot
            .messages
            .push(ChatMessage::new("bob", "<evil>x</evil>").into());

        let view = render_surface(&snapshot, &sanitizer());
        let thread = &view.as_chat().unwrap().thread;

        assert!(!thread.messages[0].unsupported);
        assert!(thread.messages[1].unsupported);
        assert_eq!(
            thread.messages[1].entity.content(),
            Some(DEFAULT_UNSUPPORTED_PLACEHOLDER)
        );
        assert_eq!(snapshot.messages[1].content(), Some("<evil>x</evil>"));
    }

    #[test]
    fn test_view_serializes_with_tag() {
        let json = serde_json::to_value(render_surface(&ChatSnapshot::loading(), &sanitizer()))
            .unwrap();
        assert_eq!(json["view"], "loading");
        assert_eq!(json["status"]["state"], "initial");
    }
}
