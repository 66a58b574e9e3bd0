//! Shared state handed to the router, the HTTP handlers and the IPC server.

use std::sync::Arc;

use retro_core::{create_store, create_summarizer, RetroConfig, Summarizer, ThreadStore};

#[derive(Clone)]
pub struct AppContext {
    pub config: RetroConfig,
    pub store: Arc<dyn ThreadStore>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppContext {
    pub fn new(
        config: RetroConfig,
        store: Arc<dyn ThreadStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            store,
            summarizer,
        }
    }

    /// Build the store and summarizer named by `config`.
    pub async fn from_config(config: RetroConfig) -> anyhow::Result<Self> {
        let store = create_store(&config.store).await?;
        let summarizer: Arc<dyn Summarizer> = Arc::from(create_summarizer(&config.llm));
        tracing::info!(
            store = store.backend_name(),
            llm = summarizer.name(),
            "Application context ready"
        );
        Ok(Self::new(config, store, summarizer))
    }

    /// Requested thread, or the configured default when absent or blank.
    pub fn thread_id(&self, requested: Option<String>) -> String {
        requested
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.config.store.default_thread_id.clone())
    }
}
