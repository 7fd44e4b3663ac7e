use serde::{Deserialize, Serialize};

/// Upper bound for the provider call timeout, regardless of what the env asks for.
const MAX_LLM_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Hosted user store configuration
    pub store: StoreConfig,
    /// Search request limits
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "mistral", "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name used for query interpretation
    pub chat_model: String,
    /// API key (not needed for a local ollama)
    pub api_key: Option<String>,
    /// Timeout for a single interpretation call, in seconds
    pub timeout_secs: u64,
}

/// Connection settings for the hosted REST backend holding the user tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. "https://<project>.supabase.co".
    /// If None, the in-memory store is used.
    pub url: Option<String>,
    /// Service key sent as both `apikey` and bearer token.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub results_per_page: usize,
    pub max_query_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mistral".to_string(),
            base_url: "https://api.mistral.ai".to_string(),
            chat_model: "mistral-medium".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_page: 20,
            max_query_length: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("STROKA_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY").or_else(|_| std::env::var("MISTRAL_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = clamp_llm_timeout(v);
            }
        }

        if let Ok(url) = std::env::var("SUPABASE_URL") {
            config.store.url = Some(url.trim_end_matches('/').to_string());
        }
        if let Ok(key) = std::env::var("SUPABASE_KEY") {
            config.store.api_key = Some(key);
        }

        if let Ok(val) = std::env::var("STROKA_RESULTS_PER_PAGE") {
            if let Ok(v) = val.parse() {
                config.search.results_per_page = v;
            }
        }
        if let Ok(val) = std::env::var("STROKA_MAX_QUERY_LENGTH") {
            if let Ok(v) = val.parse() {
                config.search.max_query_length = v;
            }
        }

        config
    }
}

/// Clamp a requested provider timeout to the supported range.
pub fn clamp_llm_timeout(secs: u64) -> u64 {
    secs.clamp(1, MAX_LLM_TIMEOUT_SECS)
}
