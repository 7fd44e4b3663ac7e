use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::store_error;
use crate::models::{SmartSearchRequest, SmartSearchResponse, UserRecord, UserType};
use crate::query::build_filters;
use crate::state::AppState;
use crate::store::stats::{filter_by_skills, user_type_statistics};
use crate::store::UserQuery;

#[derive(Debug, Deserialize)]
pub struct UserSearchParams {
    pub q: Option<String>,
    pub faculty: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn users_page(users: Vec<UserRecord>) -> Json<Value> {
    Json(json!({ "count": users.len(), "users": users }))
}

/// GET /users/api/search - List users by name substring, faculty and type
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<UserSearchParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let query = UserQuery {
        name: non_blank(params.q),
        faculty: non_blank(params.faculty),
        purpose: None,
        user_type: non_blank(params.user_type),
        limit: params.limit.unwrap_or(state.config.search.results_per_page),
    };

    let users = state.store.search_users(&query).await.map_err(store_error)?;
    Ok(users_page(users))
}

/// GET /users/api/stats - User count per user type
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, (StatusCode, String)> {
    let types = state.store.user_types().await.map_err(store_error)?;
    let stats = user_type_statistics(types.iter().map(|t| t.as_deref()));

    Ok(Json(json!({
        "total_users": types.len(),
        "user_types": stats,
    })))
}

/// GET /users/api/type/{user_type} - Users of one type with its description
pub async fn users_by_type(
    State(state): State<AppState>,
    Path(user_type): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Some(user_type) = UserType::parse(&user_type) else {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Unknown user type: {user_type}"),
        ));
    };

    let limit = params.limit.unwrap_or(state.config.search.results_per_page);
    let users = state
        .store
        .users_by_type(user_type, limit)
        .await
        .map_err(store_error)?;

    Ok(Json(json!({
        "user_type": user_type,
        "description": user_type.description(),
        "count": users.len(),
        "users": users,
    })))
}

/// GET /users/api/profile/{id} - One user with their purpose details
pub async fn profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let user = state
        .store
        .get_user(id)
        .await
        .map_err(store_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let details = match user.purpose.as_deref() {
        Some(purpose) => state
            .store
            .purpose_details(user.id, purpose)
            .await
            .map_err(store_error)?,
        None => None,
    };

    Ok(Json(json!({ "user": user, "details": details })))
}

/// POST /users/api/smart-search - Free-text query to matching users:
///   1. Interpret the query (empty breakdown on provider failure)
///   2. Build exact-match filters and query the store
///   3. Keep users that entered any of the required skills
pub async fn smart_search(
    State(state): State<AppState>,
    Json(req): Json<SmartSearchRequest>,
) -> Result<Json<SmartSearchResponse>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }
    let max_len = state.config.search.max_query_length;
    if query.chars().count() > max_len {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Query is longer than {max_len} characters"),
        ));
    }

    let parsed = state.interpreter.parse(&query).await;
    let filters = build_filters(&parsed);
    let limit = req.limit.unwrap_or(state.config.search.results_per_page);

    let users = state
        .store
        .advanced_search(None, &filters, limit)
        .await
        .map_err(store_error)?;

    let required: Vec<String> = parsed.required_skills().map(|s| s.name.clone()).collect();
    let users = filter_by_skills(state.store.as_ref(), users, &required)
        .await
        .map_err(store_error)?;

    tracing::info!(
        "Smart search '{query}': {} filter(s), {} required skill(s), {} user(s)",
        filters.pairs().len(),
        required.len(),
        users.len()
    );

    Ok(Json(SmartSearchResponse {
        query,
        count: users.len(),
        parsed,
        filters,
        users,
    }))
}
