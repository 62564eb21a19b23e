use std::sync::Arc;

use anyhow::{Context, Result};
use switchboard_chats::{ChatSurfaceBinding, ContentSanitizer, LocalChatRegistry, RedrawHook};
use switchboard_config::{AppConfig, SessionConfig};
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Install the global fmt subscriber. `RUST_LOG` overrides the default
    /// `info` filter.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything a surface needs, built once from configuration.
#[derive(Clone)]
pub struct SurfaceServices {
    pub sanitizer: Arc<ContentSanitizer>,
    pub registry: Arc<LocalChatRegistry>,
    pub session: SessionConfig,
}

impl SurfaceServices {
    pub fn initialise(config: &AppConfig) -> Result<Self> {
        let sanitizer = ContentSanitizer::from_config(&config.sanitizer)
            .context("invalid sanitizer configuration")?;
        info!(
            allowed_tags = config.sanitizer.allowed_closing_tags.len(),
            "content sanitizer ready"
        );

        let registry = Arc::new(LocalChatRegistry::new(config.thread.clone()));
        info!(
            page_size = config.thread.page_size,
            messages_to_reload = config.thread.messages_to_reload,
            disable_editing = config.thread.disable_editing,
            "chat registry ready"
        );

        Ok(Self {
            sanitizer: Arc::new(sanitizer),
            registry,
            session: config.session.clone(),
        })
    }

    /// New surface binding over the shared registry.
    pub fn binding(&self, redraw: Option<RedrawHook>) -> ChatSurfaceBinding {
        let binding = ChatSurfaceBinding::new(self.registry.clone());
        match redraw {
            Some(redraw) => binding.with_redraw(redraw),
            None => binding,
        }
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
