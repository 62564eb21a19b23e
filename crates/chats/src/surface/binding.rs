//! Lifecycle glue between a mounted surface and the bridge.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tracing::{debug, info};

use super::view::{render_surface, SurfaceView};
use crate::bridge::listeners::lock;
use crate::bridge::{ListenerId, ViewStateBridge};
use crate::client::ChatClientProvider;
use crate::entities::ChatSnapshot;
use crate::types::ChatIntents;
use crate::utils::ContentSanitizer;

/// Called after the render state was replaced.
pub type RedrawHook = Arc<dyn Fn(&Arc<ChatSnapshot>) + Send + Sync>;

struct ActiveBinding {
    chat_id: String,
    bridge: ViewStateBridge,
    listener: ListenerId,
    live: Arc<AtomicBool>,
}

/// Keeps one surface subscribed to the chat it currently shows.
///
/// At most one subscription is live per binding. Switching chats tears the
/// old one down before the new one is set up, and dropping the binding
/// tears down whatever is active.
pub struct ChatSurfaceBinding {
    provider: Arc<dyn ChatClientProvider>,
    redraw: Option<RedrawHook>,
    render_state: Arc<ArcSwap<ChatSnapshot>>,
    active: Mutex<Option<ActiveBinding>>,
}

impl ChatSurfaceBinding {
    pub fn new(provider: Arc<dyn ChatClientProvider>) -> Self {
        Self {
            provider,
            redraw: None,
            render_state: Arc::new(ArcSwap::from_pointee(ChatSnapshot::loading())),
            active: Mutex::new(None),
        }
    }

    pub fn with_redraw(mut self, redraw: RedrawHook) -> Self {
        self.redraw = Some(redraw);
        self
    }

    /// Show `chat_id`. Activating the chat that is already shown does nothing.
    pub fn activate(&self, chat_id: &str) {
        let previous = {
            let mut active = lock(&self.active);
            if active.as_ref().is_some_and(|binding| binding.chat_id == chat_id) {
                return;
            }
            active.take()
        };
        // Released without holding `active`: removal may wait for a callback
        // running on the emitting thread.
        if let Some(previous) = previous {
            release(previous);
        }

        let bridge = ViewStateBridge::connect(self.provider.client_for(chat_id));
        let seeded = bridge.current_state();
        self.render_state.store(seeded.clone());

        let live = Arc::new(AtomicBool::new(true));
        let listener = bridge.subscribe(self.on_snapshot(live.clone()));
        let replaced = lock(&self.active).replace(ActiveBinding {
            chat_id: chat_id.to_string(),
            bridge,
            listener,
            live,
        });
        if let Some(replaced) = replaced {
            release(replaced);
        }

        info!(chat_id, status = %seeded.status, "chat surface activated");
        if let Some(redraw) = &self.redraw {
            redraw(&seeded);
        }
    }

    /// Tear down the active subscription, if any. Safe to call repeatedly.
    pub fn deactivate(&self) {
        let previous = lock(&self.active).take();
        if let Some(previous) = previous {
            release(previous);
        }
    }

    pub fn active_chat_id(&self) -> Option<String> {
        lock(&self.active)
            .as_ref()
            .map(|binding| binding.chat_id.clone())
    }

    pub fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Snapshot the next render pass works from.
    pub fn current_state(&self) -> Arc<ChatSnapshot> {
        self.render_state.load_full()
    }

    pub fn intents(&self) -> ChatIntents {
        self.render_state.load().intents.clone()
    }

    pub fn render(&self, sanitizer: &ContentSanitizer) -> SurfaceView {
        render_surface(&self.render_state.load(), sanitizer)
    }

    fn on_snapshot(&self, live: Arc<AtomicBool>) -> Arc<dyn Fn(&Arc<ChatSnapshot>) + Send + Sync> {
        let render_state = self.render_state.clone();
        let redraw = self.redraw.clone();
        Arc::new(move |snapshot: &Arc<ChatSnapshot>| {
            if !live.load(Ordering::Acquire) {
                return;
            }
            render_state.store(snapshot.clone());
            if let Some(redraw) = &redraw {
                redraw(snapshot);
            }
        })
    }
}

/// Clear the live flag first so a snapshot queued behind the current one is
/// ignored; unsubscribing then waits out a call already running elsewhere.
fn release(binding: ActiveBinding) {
    binding.live.store(false, Ordering::Release);
    binding.bridge.unsubscribe(binding.listener);
    binding.bridge.disconnect();
    debug!(chat_id = %binding.chat_id, "chat surface deactivated");
}

impl Drop for ChatSurfaceBinding {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl fmt::Debug for ChatSurfaceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSurfaceBinding")
            .field("active_chat_id", &self.active_chat_id())
            .field("redraw", &self.redraw.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChatClientHandle, LocalChatClient, LocalChatRegistry};
    use crate::entities::{ChatInfo, ChatMessage, ChatStatus, ChatType};
    use std::sync::atomic::AtomicUsize;
    use switchboard_config::ThreadConfig;

    fn registry() -> Arc<LocalChatRegistry> {
        Arc::new(LocalChatRegistry::new(ThreadConfig::default()))
    }

    fn ready(client: &LocalChatClient) {
        client.establish_session("me");
        client.load_chat(
            ChatInfo::new(client.chat_id(), ChatType::Group),
            Vec::new(),
            vec![ChatMessage::new("bob", "hi").into()],
        );
    }

    #[test]
    fn test_activate_seeds_from_existing_state() {
        let registry = registry();
        ready(&registry.local_client("19:a"));

        let binding = ChatSurfaceBinding::new(registry.clone());
        binding.activate("19:a");

        assert_eq!(binding.current_state().status, ChatStatus::Ready);
        let sanitizer = ContentSanitizer::new(["p"], "gone").unwrap();
        assert!(!binding.render(&sanitizer).is_loading());
    }

    #[test]
    fn test_snapshots_replace_render_state_and_redraw() {
        let registry = registry();
        let redraws = Arc::new(AtomicUsize::new(0));
        let counter = redraws.clone();
        let binding = ChatSurfaceBinding::new(registry.clone()).with_redraw(Arc::new(
            move |_snapshot: &Arc<ChatSnapshot>| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));

        binding.activate("19:a");
        assert_eq!(redraws.load(Ordering::SeqCst), 1);
        assert_eq!(binding.current_state().status, ChatStatus::Initial);

        let client = registry.local_client("19:a");
        client.establish_session("me");
        assert_eq!(redraws.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(
            &binding.current_state(),
            &client.current_state().unwrap()
        ));
    }

    #[test]
    fn test_activate_same_chat_is_noop() {
        let registry = registry();
        let binding = ChatSurfaceBinding::new(registry.clone());

        binding.activate("19:a");
        binding.activate("19:a");

        assert_eq!(registry.local_client("19:a").listener_count(), 1);
        assert_eq!(binding.active_chat_id().as_deref(), Some("19:a"));
    }

    #[test]
    fn test_deactivate_is_idempotent_and_stops_updates() {
        let registry = registry();
        let binding = ChatSurfaceBinding::new(registry.clone());
        binding.activate("19:a");
        let before = binding.current_state();

        binding.deactivate();
        binding.deactivate();
        registry.local_client("19:a").establish_session("me");

        assert!(!binding.is_active());
        assert!(Arc::ptr_eq(&before, &binding.current_state()));
        assert_eq!(registry.local_client("19:a").listener_count(), 0);
    }

    #[test]
    fn test_deactivate_from_other_thread_waits_for_running_redraw() {
        let registry = registry();
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let redraws = Arc::new(AtomicUsize::new(0));

        let finished_flag = finished.clone();
        let counter = redraws.clone();
        let binding = ChatSurfaceBinding::new(registry.clone()).with_redraw(Arc::new(
            move |snapshot: &Arc<ChatSnapshot>| {
                counter.fetch_add(1, Ordering::SeqCst);
                if snapshot.user_id.is_some() {
                    let _ = started_tx.send(());
                    std::thread::sleep(std::time::Duration::from_millis(100));
                    finished_flag.store(true, Ordering::SeqCst);
                }
            },
        ));
        binding.activate("19:a");

        let client = registry.local_client("19:a");
        let emitter_client = client.clone();
        let emitter = std::thread::spawn(move || emitter_client.establish_session("me"));

        started_rx.recv().unwrap();
        binding.deactivate();
        assert!(finished.load(Ordering::SeqCst));
        emitter.join().unwrap();

        let seen = redraws.load(Ordering::SeqCst);
        client.set_disable_editing(true);
        assert_eq!(redraws.load(Ordering::SeqCst), seen);
        assert_eq!(client.listener_count(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let registry = registry();
        {
            let binding = ChatSurfaceBinding::new(registry.clone());
            binding.activate("19:a");
            assert_eq!(registry.local_client("19:a").listener_count(), 1);
        }
        assert_eq!(registry.local_client("19:a").listener_count(), 0);
    }
}
