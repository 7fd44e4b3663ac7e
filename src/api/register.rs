use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::store_error;
use crate::registration::{self, RegisterError, RegistrationRequest};
use crate::state::AppState;

/// POST /api/register - Create a user from a complete registration payload
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    match registration::register(state.store.as_ref(), &req).await {
        Ok(user_id) => Ok((StatusCode::CREATED, Json(json!({ "user_id": user_id })))),
        Err(RegisterError::Invalid(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(RegisterError::Store(e)) => Err(store_error(e)),
    }
}
