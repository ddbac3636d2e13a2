use axum::{Extension, Json, extract::Query, response::Response};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{AppState, cached_json, degraded_json},
    management::Freshness,
    types::{Scope, Suggestions},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub book: Option<String>,
}

/// `GET /api/search?q=<text>[&type=<book>|all]`
pub async fn search(
    Extension(state): Extension<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let scope = Scope::parse_lenient(query.book.as_deref());
    let results = state.search.search(&query.q, scope).await;

    // an empty answer may come from an outage, let the client retry soon
    if results.is_empty() {
        return degraded_json(json!({ "results": results }));
    }
    cached_json(Freshness::CONTENT, json!({ "results": results }))
}

/// `GET /api/search/suggest?q=<text>`
pub async fn suggest(
    Extension(state): Extension<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Suggestions> {
    Json(state.suggester().suggest(&query.q).await)
}
