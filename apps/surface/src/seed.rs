//! Sample chats for the terminal surface.

use chrono::{Duration, Utc};
use switchboard_chats::{
    ChatClientHandle, ChatInfo, ChatMessage, ChatType, LocalChatClient, MessageEntity,
    Participant,
};
use switchboard_config::SessionConfig;
use tracing::info;

pub const GENERAL: &str = "19:general";
pub const DIRECT: &str = "19:direct-bob";

/// Known chat ids, for `/help` and the demo.
pub const CHAT_IDS: &[&str] = &[GENERAL, DIRECT];

/// Bring `client` to a loaded session the first time it is opened.
///
/// Unknown chat ids end in the "chat not found" state.
pub fn ensure_loaded(client: &LocalChatClient, chat_id: &str, session: &SessionConfig) {
    if client.current_state().is_some() {
        return;
    }

    client.begin_session();
    client.establish_session(session.user_id.as_str());

    let me = Participant::new(session.user_id.as_str())
        .with_display_name(session.display_name.as_str());
    let bob = Participant::new("bob").with_display_name("Bob Jones");
    let carol = Participant::new("carol").with_display_name("Carol Smith");

    match chat_id {
        GENERAL => client.load_chat(
            ChatInfo::new(GENERAL, ChatType::Group).with_topic("General"),
            vec![me, bob, carol],
            general_history(),
        ),
        DIRECT => client.load_chat(
            ChatInfo::new(DIRECT, ChatType::OneOnOne),
            vec![me, bob],
            vec![message("bob", "Bob Jones", "<p>Got a minute?</p>", 3)],
        ),
        _ => {
            info!(chat_id, "no sample data for chat");
            client.chat_not_found();
        }
    }
}

fn general_history() -> Vec<MessageEntity> {
    let lines = [
        ("carol", "Carol Smith", "<p>Morning all</p>"),
        ("bob", "Bob Jones", "<p>Release notes are <a href=\"https://example.com/notes\">here</a></p>"),
        ("carol", "Carol Smith", "<table><tr><td>build</td><td>green</td></tr></table>"),
        ("bob", "Bob Jones", "<p>Shipping at noon</p>"),
        ("carol", "Carol Smith", "<p>Let me know when it is out</p>"),
        ("bob", "Bob Jones", "<p>Will do</p>"),
    ];
    let count = lines.len() as i64;
    lines
        .into_iter()
        .enumerate()
        .map(|(index, (sender, name, content))| message(sender, name, content, count - index as i64))
        .collect()
}

fn message(sender: &str, name: &str, content: &str, minutes_ago: i64) -> MessageEntity {
    ChatMessage::new(sender, content)
        .with_display_name(name)
        .with_created_on(Utc::now() - Duration::minutes(minutes_ago))
        .into()
}

/// Inbound message used by the demo and the console feed.
pub fn inbound(sender: &str, name: &str, content: impl Into<String>) -> MessageEntity {
    ChatMessage::new(sender, content).with_display_name(name).into()
}
