//! Plain-text painter for [`SurfaceView`].

use std::fmt::Write as _;

use switchboard_chats::surface::{ChatView, RenderedMessage};
use switchboard_chats::{MessageEntity, Participant, SurfaceView, SystemEvent};

/// Characters of a message id shown in the thread; enough to address it.
pub const SHORT_ID_LEN: usize = 8;

pub fn paint(view: &SurfaceView) -> String {
    match view {
        SurfaceView::Loading { status } => format!("[{status}] ...\n"),
        SurfaceView::Chat(chat) => paint_chat(chat),
    }
}

fn paint_chat(chat: &ChatView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==  (signed in as {})", chat.header.title, chat.header.current_user_id);

    if let Some(panel) = &chat.members {
        let names: Vec<&str> = panel.members.iter().map(Participant::label).collect();
        let _ = writeln!(out, "members: {}", names.join(", "));
    }

    let thread = &chat.thread;
    for message in &thread.messages {
        let _ = writeln!(out, "{}", paint_message(message, thread.show_message_date));
    }
    if thread.disable_editing {
        let _ = writeln!(out, "(editing disabled)");
    }

    for error in &chat.errors {
        let _ = writeln!(out, "! {:?}: {}", error.error_type, error.message);
    }
    out
}

fn paint_message(rendered: &RenderedMessage, show_date: bool) -> String {
    let entity = &rendered.entity;
    let stamp = if show_date {
        entity.created_on().format("%H:%M").to_string()
    } else {
        String::new()
    };

    match entity {
        MessageEntity::Chat(message) => {
            let sender = message
                .sender_display_name
                .as_deref()
                .unwrap_or(&message.sender_id);
            let mut line = format!("{stamp} {} {sender}: {}", short_id(entity), message.content);
            if message.is_edited() {
                line.push_str(" (edited)");
            }
            if rendered.unsupported {
                line.push_str(" [filtered]");
            }
            line
        }
        MessageEntity::System(system) => {
            let text = match &system.event {
                SystemEvent::ParticipantAdded { participants } => {
                    format!("{} joined", labels(participants))
                }
                SystemEvent::ParticipantRemoved { participants } => {
                    format!("{} left", labels(participants))
                }
                SystemEvent::TopicUpdated { topic } => format!("topic set to \"{topic}\""),
            };
            format!("{stamp} * {text}")
        }
        MessageEntity::Custom(custom) => format!("{stamp} <{}>", custom.custom_type),
    }
}

fn labels(participants: &[Participant]) -> String {
    participants
        .iter()
        .map(Participant::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn short_id(entity: &MessageEntity) -> &str {
    let id = entity.message_id();
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}
