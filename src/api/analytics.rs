use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::store_error;
use crate::models::DescriptionKind;
use crate::state::AppState;
use crate::store::stats::{input_statistics, popular_terms, InputStatistics};

const DEFAULT_TERM_LIMIT: usize = 20;
const DEFAULT_DESCRIPTION_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SkillParams {
    pub context: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

fn term_counts(ranked: Vec<(String, usize)>) -> Vec<TermCount> {
    ranked
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect()
}

/// GET /analytics/skills?context&limit - Most frequently entered skills
pub async fn popular_skills(
    State(state): State<AppState>,
    Query(params): Query<SkillParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let context = params.context.filter(|c| !c.trim().is_empty());
    let inputs = state
        .store
        .skill_inputs(context.as_deref())
        .await
        .map_err(store_error)?;

    let ranked = popular_terms(
        inputs.iter().map(|i| i.skill_name.as_str()),
        params.limit.unwrap_or(DEFAULT_TERM_LIMIT),
    );

    Ok(Json(json!({
        "context": context,
        "skills": term_counts(ranked),
    })))
}

/// GET /analytics/topics?limit - Most frequently entered discussion topics
pub async fn popular_topics(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let topics = state.store.topic_inputs().await.map_err(store_error)?;
    let ranked = popular_terms(&topics, params.limit.unwrap_or(DEFAULT_TERM_LIMIT));
    Ok(Json(json!({ "topics": term_counts(ranked) })))
}

/// GET /analytics/descriptions/{kind}?limit - Recent project or about texts
pub async fn descriptions(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Some(kind) = DescriptionKind::parse(&kind) else {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Unknown description kind: {kind}"),
        ));
    };

    let rows = state
        .store
        .descriptions(kind, params.limit.unwrap_or(DEFAULT_DESCRIPTION_LIMIT))
        .await
        .map_err(store_error)?;

    Ok(Json(json!({
        "kind": kind,
        "count": rows.len(),
        "descriptions": rows,
    })))
}

/// GET /analytics/stats - Volume of collected registration input
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<InputStatistics>, (StatusCode, String)> {
    input_statistics(state.store.as_ref())
        .await
        .map(Json)
        .map_err(store_error)
}
