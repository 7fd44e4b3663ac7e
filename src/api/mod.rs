pub mod analytics;
pub mod config;
pub mod register;
pub mod search;
pub mod users;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::state::AppState;

/// Build the HTTP router over `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        // Query interpretation and full-text search
        .route("/search", get(search::search_get).post(search::search_post))
        .route("/search/results", get(search::results))
        .route("/suggestions", get(search::suggestions))
        .route("/trending", get(search::trending))
        // User directory
        .route("/users/api/search", get(users::search_users))
        .route("/users/api/stats", get(users::stats))
        .route("/users/api/type/{user_type}", get(users::users_by_type))
        .route("/users/api/profile/{id}", get(users::profile))
        .route("/users/api/smart-search", post(users::smart_search))
        // Registration analytics
        .route("/analytics/skills", get(analytics::popular_skills))
        .route("/analytics/topics", get(analytics::popular_topics))
        .route("/analytics/descriptions/{kind}", get(analytics::descriptions))
        .route("/analytics/stats", get(analytics::stats))
        // Registration and runtime config
        .route("/api/register", post(register::register))
        .route(
            "/api/config",
            get(config::get_config).put(config::update_config),
        )
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Map a store failure to a 502 for the client.
pub(crate) fn store_error(e: StoreError) -> (StatusCode, String) {
    tracing::error!("User store request failed: {e}");
    (StatusCode::BAD_GATEWAY, format!("User store error: {e}"))
}
