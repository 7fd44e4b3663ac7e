use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, LlmConfig};
use crate::llm::{ChatProvider, HttpChatProvider};
use crate::query::QueryInterpreter;
use crate::search::SearchService;
use crate::store::{MemoryStore, PostgrestStore, UserStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm_config: Arc<RwLock<LlmConfig>>,
    pub interpreter: Arc<QueryInterpreter>,
    pub store: Arc<dyn UserStore>,
    pub search: SearchService,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let llm_config = Arc::new(RwLock::new(config.llm.clone()));
        let provider = HttpChatProvider::new(http_client.clone(), llm_config.clone());

        let store: Arc<dyn UserStore> =
            match PostgrestStore::from_config(http_client, &config.store) {
                Some(store) => Arc::new(store),
                None => {
                    tracing::warn!("SUPABASE_URL not set, using the in-memory user store");
                    Arc::new(MemoryStore::new())
                }
            };

        Ok(Self::assemble(config, llm_config, Arc::new(provider), store))
    }

    /// State over a caller-supplied provider and store, with no network setup.
    pub fn with_components(
        config: Config,
        provider: Arc<dyn ChatProvider>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        let llm_config = Arc::new(RwLock::new(config.llm.clone()));
        Self::assemble(config, llm_config, provider, store)
    }

    fn assemble(
        config: Config,
        llm_config: Arc<RwLock<LlmConfig>>,
        provider: Arc<dyn ChatProvider>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        let timeout = Duration::from_secs(config.llm.timeout_secs);
        Self {
            config,
            llm_config,
            interpreter: Arc::new(QueryInterpreter::new(provider, timeout)),
            store,
            search: SearchService::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_without_store_url_uses_memory_store() {
        let state = AppState::new(Config::default()).unwrap();
        assert!(state.store.user_types().await.unwrap().is_empty());
        assert_eq!(state.llm_config.read().provider, "mistral");
        assert_eq!(state.interpreter.timeout(), Duration::from_secs(30));
    }
}
