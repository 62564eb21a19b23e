//! Content filter for message bodies.
//!
//! Chat bodies are HTML-shaped. Closing tags carry no attributes, so they are
//! what the filter matches on: a body containing a closing tag whose name is
//! not allow-listed is replaced by a placeholder before it is rendered.
//!
//! A closing tag's name is everything after `</` up to the first whitespace,
//! `/` or `>`, whatever characters it uses. Trailing junk such as
//! `</script x>` or `</script/>` does not hide it.

use std::borrow::Cow;
use std::collections::BTreeSet;

use regex::Regex;
use switchboard_config::SanitizerConfig;
use tracing::warn;

use crate::entities::{ContentType, MessageEntity};
use crate::types::{ChatError, ChatResult};

const CLOSING_TAG_PATTERN: &str = r"</\s*([^\s/>]+)[^>]*>";

/// Outcome of [`ContentSanitizer::classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<'a> {
    Safe,
    Unsafe {
        original: &'a MessageEntity,
        /// First closing tag outside the allow-list, lowercased
        tag: String,
    },
}

impl Verdict<'_> {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }
}

/// Allow-list based filter for chat message bodies.
///
/// Pure and deterministic. The placeholder is checked on construction, so
/// sanitizing already sanitized content never flags it again.
#[derive(Debug, Clone)]
pub struct ContentSanitizer {
    allowed: BTreeSet<String>,
    placeholder: String,
    closing_tag: Regex,
}

impl ContentSanitizer {
    /// Build a sanitizer from an allow-list of closing tag names.
    ///
    /// Tag names are compared case-insensitively. Fails when the placeholder
    /// is empty or would itself be flagged.
    pub fn new<I, S>(allowed: I, placeholder: impl Into<String>) -> ChatResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let closing_tag = Regex::new(CLOSING_TAG_PATTERN)
            .map_err(|error| ChatError::internal(format!("closing tag pattern: {error}")))?;
        let allowed = allowed
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        let sanitizer = Self {
            allowed,
            placeholder: placeholder.into(),
            closing_tag,
        };

        if sanitizer.placeholder.trim().is_empty() {
            return Err(ChatError::configuration("placeholder cannot be empty"));
        }
        if let Some(tag) = sanitizer.unsupported_tag(&sanitizer.placeholder) {
            return Err(ChatError::configuration(format!(
                "placeholder uses closing tag </{tag}> which is not in the allow-list"
            )));
        }

        Ok(sanitizer)
    }

    pub fn from_config(config: &SanitizerConfig) -> ChatResult<Self> {
        Self::new(&config.allowed_closing_tags, config.placeholder.as_str())
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn allowed_tags(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    pub fn allows(&self, tag: &str) -> bool {
        self.allowed.contains(&tag.to_lowercase())
    }

    /// First closing tag in `content` that is not allow-listed.
    pub fn unsupported_tag(&self, content: &str) -> Option<String> {
        self.closing_tag
            .captures_iter(content)
            .filter_map(|captures| captures.get(1))
            .map(|name| name.as_str().to_lowercase())
            .find(|name| !self.allowed.contains(name))
    }

    pub fn is_supported(&self, content: &str) -> bool {
        self.unsupported_tag(content).is_none()
    }

    /// Classify one message. Only chat messages are inspected.
    pub fn classify<'a>(&self, message: &'a MessageEntity) -> Verdict<'a> {
        let Some(content) = message.content() else {
            return Verdict::Safe;
        };
        match self.unsupported_tag(content) {
            Some(tag) => Verdict::Unsafe {
                original: message,
                tag,
            },
            None => Verdict::Safe,
        }
    }

    /// Value to hand to the renderer for `message`.
    ///
    /// Safe messages are borrowed as they are. Unsafe ones are copied with
    /// the body replaced by the placeholder; `message` itself is untouched.
    pub fn sanitize<'a>(&self, message: &'a MessageEntity) -> Cow<'a, MessageEntity> {
        match self.classify(message) {
            Verdict::Safe => Cow::Borrowed(message),
            Verdict::Unsafe { original, tag } => {
                warn!(
                    message_id = original.message_id(),
                    tag, "replacing unsupported message content"
                );
                let mut replacement = original.clone();
                if let MessageEntity::Chat(chat) = &mut replacement {
                    chat.content = self.placeholder.clone();
                    chat.content_type = ContentType::Html;
                }
                Cow::Owned(replacement)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ChatMessage, SystemEvent, SystemMessage};
    use switchboard_config::{DEFAULT_ALLOWED_CLOSING_TAGS, DEFAULT_UNSUPPORTED_PLACEHOLDER};

    fn sanitizer() -> ContentSanitizer {
        ContentSanitizer::new(DEFAULT_ALLOWED_CLOSING_TAGS, DEFAULT_UNSUPPORTED_PLACEHOLDER)
            .unwrap()
    }

    fn chat(content: &str) -> MessageEntity {
        ChatMessage::new("bob", content).into()
    }

    #[test]
    fn test_allow_listed_tags_are_safe() {
        let sanitizer = sanitizer();
        for content in [
            "plain text",
            r#"<a href="https://example.com">link</a>"#,
            "<table><tr><td>1</td></tr></table>",
            "<p>hi</p><br/>",
            "<P>shouting</P>",
            "<b>bold</ b >",
        ] {
            assert!(sanitizer.classify(&chat(content)).is_safe(), "{content}");
        }
    }

    #[test]
    fn test_unknown_closing_tags_are_unsafe() {
        let sanitizer = sanitizer();
        let message = chat("<p>hi</p><evil>x</evil>");

        match sanitizer.classify(&message) {
            Verdict::Unsafe { original, tag } => {
                assert_eq!(tag, "evil");
                assert!(std::ptr::eq(original, &message));
            }
            Verdict::Safe => panic!("expected unsafe verdict"),
        }

        assert!(!sanitizer.is_supported("<script>alert(1)</SCRIPT>"));
        assert_eq!(sanitizer.unsupported_tag("</at>").as_deref(), Some("at"));
        assert_eq!(
            sanitizer.unsupported_tag("<attachment id=1></attachment>").as_deref(),
            Some("attachment")
        );
    }

    #[test]
    fn test_closing_tags_with_odd_names_or_trailers_are_unsafe() {
        let sanitizer = sanitizer();
        for (content, tag) in [
            ("<script>x</script x>", "script"),
            ("<script>x</script/>", "script"),
            ("<script>x</script\n>", "script"),
            ("<my_tag>x</my_tag>", "my_tag"),
            ("<x.y>z</x.y>", "x.y"),
            ("<évil>x</évil>", "évil"),
            ("<ÉVIL>x</ÉVIL>", "évil"),
        ] {
            assert_eq!(sanitizer.unsupported_tag(content).as_deref(), Some(tag), "{content}");
        }

        // Trailers do not change the name of an allowed tag either.
        assert!(sanitizer.is_supported("<p>ok</p class=x>"));
    }

    #[test]
    fn test_opening_tags_are_not_inspected() {
        let sanitizer = sanitizer();
        assert!(sanitizer.is_supported("<img src=x onerror=alert(1)>"));
        assert!(sanitizer.is_supported("<custom-element attr=1>"));
    }

    #[test]
    fn test_sanitize_replaces_content_copy_on_write() {
        let sanitizer = sanitizer();
        let message = chat("<p>hi</p><evil>x</evil>");

        let rendered = sanitizer.sanitize(&message);
        assert!(matches!(rendered, Cow::Owned(_)));
        assert_eq!(rendered.content(), Some(DEFAULT_UNSUPPORTED_PLACEHOLDER));
        assert_eq!(rendered.message_id(), message.message_id());
        assert_eq!(message.content(), Some("<p>hi</p><evil>x</evil>"));
    }

    #[test]
    fn test_sanitize_borrows_safe_messages() {
        let sanitizer = sanitizer();
        let message = chat("<p>hi</p>");
        let rendered = sanitizer.sanitize(&message);

        match rendered {
            Cow::Borrowed(borrowed) => assert!(std::ptr::eq(borrowed, &message)),
            Cow::Owned(_) => panic!("safe message was copied"),
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let sanitizer = sanitizer();
        let message = chat("</script>");

        let once = sanitizer.sanitize(&message).into_owned();
        let twice = sanitizer.sanitize(&once).into_owned();
        assert_eq!(once, twice);
        assert!(sanitizer.classify(&once).is_safe());
    }

    #[test]
    fn test_non_chat_messages_pass_through() {
        let sanitizer = sanitizer();
        let message: MessageEntity = SystemMessage::new(SystemEvent::TopicUpdated {
            topic: "</evil>".to_string(),
        })
        .into();

        assert!(sanitizer.classify(&message).is_safe());
        assert!(matches!(sanitizer.sanitize(&message), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rejects_placeholder_that_would_be_flagged() {
        let error = ContentSanitizer::new(["p"], "<div>unsupported</div>").unwrap_err();
        assert!(matches!(error, ChatError::Configuration { .. }));

        assert!(ContentSanitizer::new(["p"], "  ").is_err());
        assert!(ContentSanitizer::new(["p"], "unsupported content").is_ok());
    }

    #[test]
    fn test_from_config_normalises_tags() {
        let config = SanitizerConfig {
            allowed_closing_tags: vec![" DIV ".to_string(), "".to_string(), "Evil".to_string()],
            placeholder: "<div>gone</div>".to_string(),
        };
        let sanitizer = ContentSanitizer::from_config(&config).unwrap();

        assert!(sanitizer.allows("evil"));
        assert!(sanitizer.allows("EVIL"));
        assert_eq!(sanitizer.allowed_tags().collect::<Vec<_>>(), vec!["div", "evil"]);
        assert!(sanitizer.is_supported("<evil>x</evil>"));
    }
}
