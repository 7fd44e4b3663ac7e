use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::config::clamp_llm_timeout;
use crate::models::LlmConfigUpdate;
use crate::state::AppState;

/// Config response with API key redacted
#[derive(Debug, Serialize)]
pub struct LlmConfigResponse {
    pub provider: String,
    pub base_url: String,
    pub chat_model: String,
    pub timeout_secs: u64,
    pub has_api_key: bool,
}

fn redacted(state: &AppState) -> LlmConfigResponse {
    let config = state.llm_config.read();
    LlmConfigResponse {
        provider: config.provider.clone(),
        base_url: config.base_url.clone(),
        chat_model: config.chat_model.clone(),
        timeout_secs: config.timeout_secs,
        has_api_key: config.api_key.is_some(),
    }
}

/// GET /api/config - Get current LLM config (API key redacted)
pub async fn get_config(State(state): State<AppState>) -> Json<LlmConfigResponse> {
    Json(redacted(&state))
}

/// PUT /api/config - Update LLM config
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<LlmConfigUpdate>,
) -> Json<LlmConfigResponse> {
    {
        let mut config = state.llm_config.write();

        if let Some(provider) = update.provider {
            config.provider = provider;
        }
        // base_url is set via LLM_BASE_URL only; changing it at runtime
        // would send the API key to an arbitrary host
        if let Some(chat_model) = update.chat_model {
            config.chat_model = chat_model;
        }
        if let Some(api_key) = update.api_key {
            config.api_key = Some(api_key).filter(|k| !k.is_empty());
        }
        if let Some(secs) = update.timeout_secs {
            config.timeout_secs = clamp_llm_timeout(secs);
            state
                .interpreter
                .set_timeout(Duration::from_secs(config.timeout_secs));
        }

        tracing::info!(
            "LLM config updated: {} ({}), timeout {}s",
            config.provider,
            config.chat_model,
            config.timeout_secs
        );
    }

    Json(redacted(&state))
}
