use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::models::{FilterSet, ParsedQuery, SearchRequest};
use crate::query::build_filters;
use crate::search::{merge_query_tags, SearchResults};
use crate::state::AppState;

const MIN_SUGGESTION_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub q: String,
}

/// POST /search - Interpret a free-text query into structured filters
pub async fn search_post(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    interpret_query(&state, &req.query, &req.tags, req.required_fields).await
}

/// GET /search?q= - Same as POST /search without tags
pub async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    interpret_query(&state, &params.q, &Map::new(), Vec::new()).await
}

async fn interpret_query(
    state: &AppState,
    query: &str,
    tags: &Map<String, Value>,
    required_fields: Vec<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Json(json!({ "results": [], "query": "", "parsed": {} })));
    }

    let max_len = state.config.search.max_query_length;
    if query.chars().count() > max_len {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Query is longer than {max_len} characters"),
        ));
    }

    let parsed = match state.interpreter.interpret(query).await {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Failed to interpret query '{query}': {e}");
            return Ok(Json(json!({
                "query": query,
                "error": e.to_string(),
                "parsed": {},
            })));
        }
    };

    let (parsed, filters) = apply_tags(parsed, tags);
    tracing::info!("Query '{query}' parsed into {} filter(s)", filters.pairs().len());

    Ok(Json(json!({
        "query": query,
        "parsed": parsed,
        "filters": filters,
        "required_fields": required_fields,
        "message": "Запрос успешно обработан",
    })))
}

/// Merge user-picked tags into the parsed query and derive filters from the result.
///
/// Tags that break the query shape are kept in the returned JSON but ignored
/// for filtering.
fn apply_tags(
    parsed: ParsedQuery,
    tags: &Map<String, Value>,
) -> (Value, FilterSet) {
    let base = build_filters(&parsed);
    if tags.is_empty() {
        return (serde_json::to_value(&parsed).unwrap_or_default(), base);
    }

    let merged = merge_query_tags(&parsed, tags);
    let filters = match serde_json::from_value::<ParsedQuery>(merged.clone()) {
        Ok(tagged) => build_filters(&tagged),
        Err(e) => {
            tracing::debug!("Tags do not fit the parsed query shape: {e}");
            base
        }
    };
    (merged, filters)
}

/// GET /search/results?q= - Full-text search result page
pub async fn results(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Json<SearchResults> {
    Json(state.search.search(params.q.trim()))
}

/// GET /suggestions?q= - Completions for a partially typed query
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Json<Vec<String>> {
    let q = params.q.trim();
    if q.chars().count() < MIN_SUGGESTION_CHARS {
        return Json(Vec::new());
    }
    Json(state.search.suggestions(q))
}

/// GET /trending
pub async fn trending(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.search.trending())
}
