use tracing_subscriber::EnvFilter;

use stroka::api;
use stroka::config::Config;
use stroka::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {e}");
        }
    }

    let config = Config::from_env();
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if config.llm.api_key.is_none() && config.llm.provider != "ollama" {
        tracing::warn!("No LLM API key set; query interpretation will return empty results");
    }

    let state = AppState::new(config.clone())?;
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
