use serde::{Deserialize, Serialize};

use super::member::Participant;

/// Chat metadata carried by every snapshot once the chat has loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    /// Service identifier of the chat
    pub id: String,
    /// Topic set by the members; one-on-one chats usually have none
    pub topic: Option<String>,
    pub chat_type: ChatType,
}

/// Chat type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChatType {
    OneOnOne,
    Group,
}

impl From<&str> for ChatType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "group" => ChatType::Group,
            _ => ChatType::OneOnOne,
        }
    }
}

impl From<ChatType> for String {
    fn from(chat_type: ChatType) -> Self {
        match chat_type {
            ChatType::OneOnOne => "oneOnOne".to_string(),
            ChatType::Group => "group".to_string(),
        }
    }
}

impl ChatInfo {
    pub fn new(id: impl Into<String>, chat_type: ChatType) -> Self {
        Self {
            id: id.into(),
            topic: None,
            chat_type,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Check if this is a group chat
    pub fn is_group(&self) -> bool {
        matches!(self.chat_type, ChatType::Group)
    }

    /// Title for the chat header.
    ///
    /// Uses the topic when one is set, otherwise the names of everyone except
    /// the local participant.
    pub fn display_title(&self, participants: &[Participant], current_user_id: &str) -> String {
        if let Some(topic) = self.topic.as_deref().map(str::trim) {
            if !topic.is_empty() {
                return topic.to_string();
            }
        }

        let others: Vec<&str> = participants
            .iter()
            .filter(|member| member.user_id != current_user_id)
            .map(Participant::label)
            .collect();

        if others.is_empty() {
            "Chat".to_string()
        } else {
            others.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> Vec<Participant> {
        vec![
            Participant::new("me").with_display_name("Me"),
            Participant::new("bob").with_display_name("Bob"),
            Participant::new("carol"),
        ]
    }

    #[test]
    fn test_chat_type_conversion() {
        assert_eq!(ChatType::from("group"), ChatType::Group);
        assert_eq!(ChatType::from("GROUP"), ChatType::Group);
        assert_eq!(ChatType::from("oneOnOne"), ChatType::OneOnOne);
        assert_eq!(ChatType::from("meeting"), ChatType::OneOnOne);

        assert_eq!(String::from(ChatType::Group), "group");
        assert_eq!(String::from(ChatType::OneOnOne), "oneOnOne");
    }

    #[test]
    fn test_display_title_prefers_topic() {
        let chat = ChatInfo::new("19:abc", ChatType::Group).with_topic("Launch");
        assert_eq!(chat.display_title(&members(), "me"), "Launch");
    }

    #[test]
    fn test_display_title_lists_other_members() {
        let chat = ChatInfo::new("19:abc", ChatType::Group).with_topic("   ");
        assert_eq!(chat.display_title(&members(), "me"), "Bob, carol");
    }

    #[test]
    fn test_display_title_fallback() {
        let chat = ChatInfo::new("19:abc", ChatType::OneOnOne);
        assert_eq!(chat.display_title(&[], "me"), "Chat");
        assert!(!chat.is_group());
    }
}
