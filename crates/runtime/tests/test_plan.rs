use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use switchboard_chats::{ChatClientHandle, ChatInfo, ChatMessage, ChatSnapshot, ChatType};
use switchboard_config::AppConfig;
use switchboard_runtime::SurfaceServices;

#[test]
fn initialise_builds_sanitizer_and_registry_from_defaults() -> Result<()> {
    let config = AppConfig::default();
    let services = SurfaceServices::initialise(&config)?;

    assert_eq!(services.sanitizer.placeholder(), config.sanitizer.placeholder);
    assert!(services.sanitizer.allows("table"));
    assert!(services.registry.is_empty());
    assert_eq!(services.session.user_id, config.session.user_id);
    Ok(())
}

#[test]
fn initialise_rejects_placeholder_outside_allow_list() {
    let mut config = AppConfig::default();
    config.sanitizer.allowed_closing_tags = vec!["p".to_string()];
    config.sanitizer.placeholder = "<span>unsupported</span>".to_string();

    let error = SurfaceServices::initialise(&config)
        .err()
        .expect("placeholder should be rejected");
    assert!(format!("{error:#}").contains("invalid sanitizer configuration"));
}

#[test]
fn registry_uses_thread_configuration() -> Result<()> {
    let mut config = AppConfig::default();
    config.thread.page_size = 1;
    config.thread.messages_to_reload = 7;
    config.thread.disable_editing = true;
    let services = SurfaceServices::initialise(&config)?;

    let client = services.registry.local_client("19:runtime");
    client.establish_session("me");
    client.load_chat(
        ChatInfo::new("19:runtime", ChatType::Group),
        Vec::new(),
        vec![
            ChatMessage::new("bob", "older").into(),
            ChatMessage::new("bob", "newest").into(),
        ],
    );

    let snapshot = client.current_state().expect("client has state");
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.number_of_chat_messages_to_reload, 7);
    assert!(snapshot.disable_editing);
    assert_eq!(client.backlog_len(), 1);
    Ok(())
}

#[test]
fn binding_redraws_through_hook() -> Result<()> {
    let services = SurfaceServices::initialise(&AppConfig::default())?;
    let redraws = Arc::new(AtomicUsize::new(0));
    let counter = redraws.clone();
    let binding = services.binding(Some(Arc::new(move |_snapshot: &Arc<ChatSnapshot>| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    binding.activate("19:hook");
    services.registry.local_client("19:hook").begin_session();

    assert_eq!(redraws.load(Ordering::SeqCst), 3);
    assert!(binding.render(&services.sanitizer).is_loading());
    Ok(())
}
