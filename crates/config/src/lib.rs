use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "switchboard.toml",
    "config/switchboard.toml",
    "crates/config/switchboard.toml",
    "../switchboard.toml",
    "../config/switchboard.toml",
    "../crates/config/switchboard.toml",
];

/// Closing tags the surface renderer knows how to paint.
pub const DEFAULT_ALLOWED_CLOSING_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "code",
    "div",
    "em",
    "i",
    "li",
    "ol",
    "p",
    "pre",
    "s",
    "span",
    "strong",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "u",
    "ul",
];

pub const DEFAULT_UNSUPPORTED_PLACEHOLDER: &str =
    r#"<div class="unsupported-content">This message contains content that is not supported.</div>"#;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
    #[serde(default)]
    pub thread: ThreadConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Settings for the unsupported-content filter applied to every rendered message.
///
/// ```
/// use switchboard_config::SanitizerConfig;
///
/// let sanitizer = SanitizerConfig::default();
/// assert!(sanitizer.allowed_closing_tags.contains(&"a".to_string()));
/// assert!(!sanitizer.allowed_closing_tags.contains(&"script".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    #[serde(default = "SanitizerConfig::default_allowed_closing_tags")]
    pub allowed_closing_tags: Vec<String>,
    #[serde(default = "SanitizerConfig::default_placeholder")]
    pub placeholder: String,
}

impl SanitizerConfig {
    fn default_allowed_closing_tags() -> Vec<String> {
        DEFAULT_ALLOWED_CLOSING_TAGS
            .iter()
            .map(|tag| tag.to_string())
            .collect()
    }

    fn default_placeholder() -> String {
        DEFAULT_UNSUPPORTED_PLACEHOLDER.to_string()
    }
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            allowed_closing_tags: Self::default_allowed_closing_tags(),
            placeholder: Self::default_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadConfig {
    /// How many older messages a single "load more" request reveals.
    #[serde(default = "ThreadConfig::default_messages_to_reload")]
    pub messages_to_reload: u32,
    /// How many of the most recent messages are visible once a chat loads.
    #[serde(default = "ThreadConfig::default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub disable_editing: bool,
}

impl ThreadConfig {
    const fn default_messages_to_reload() -> u32 {
        5
    }

    const fn default_page_size() -> usize {
        20
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            messages_to_reload: Self::default_messages_to_reload(),
            page_size: Self::default_page_size(),
            disable_editing: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_user_id")]
    pub user_id: String,
    #[serde(default = "SessionConfig::default_display_name")]
    pub display_name: String,
}

impl SessionConfig {
    fn default_user_id() -> String {
        "local-user".to_string()
    }

    fn default_display_name() -> String {
        "You".to_string()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: Self::default_user_id(),
            display_name: Self::default_display_name(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use switchboard_config::load;
///
/// std::env::remove_var("SWITCHBOARD_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.sanitizer.placeholder.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let messages_to_reload = i64::from(defaults.thread.messages_to_reload);
    let page_size = i64::try_from(defaults.thread.page_size).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default(
            "sanitizer.allowed_closing_tags",
            defaults.sanitizer.allowed_closing_tags.clone(),
        )?
        .set_default("sanitizer.placeholder", defaults.sanitizer.placeholder.clone())?
        .set_default("thread.messages_to_reload", messages_to_reload)?
        .set_default("thread.page_size", page_size)?
        .set_default("thread.disable_editing", defaults.thread.disable_editing)?
        .set_default("session.user_id", defaults.session.user_id.clone())?
        .set_default("session.display_name", defaults.session.display_name.clone())?;

    let environment_overrides = config::Environment::with_prefix("SWITCHBOARD")
        .separator("__")
        .try_parsing(true)
        .list_separator(" ")
        .with_list_parse_key("sanitizer.allowed_closing_tags");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("SWITCHBOARD_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via SWITCHBOARD_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    for tag in &mut config.sanitizer.allowed_closing_tags {
        *tag = tag.trim().to_ascii_lowercase();
    }
    config.sanitizer.allowed_closing_tags.retain(|tag| !tag.is_empty());

    if config.thread.page_size == 0 {
        config.thread.page_size = ThreadConfig::default_page_size();
    }

    debug!(?config, "loaded chat surface configuration");
    Ok(config)
}
