use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A member of a chat as reported by the chat service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub display_name: Option<String>,
    /// Start of the history visible to this member, if restricted
    pub share_history_since: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            share_history_since: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Name to show for this member, falling back to the raw user id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_prefers_display_name() {
        let member = Participant::new("8:orgid:1").with_display_name("Alice");
        assert_eq!(member.label(), "Alice");
    }

    #[test]
    fn test_label_falls_back_to_user_id() {
        let member = Participant::new("8:orgid:1");
        assert_eq!(member.label(), "8:orgid:1");

        let blank = Participant::new("8:orgid:2").with_display_name("  ");
        assert_eq!(blank.label(), "8:orgid:2");
    }
}
