use std::collections::HashMap;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::Query,
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::{
    api::{
        AppState,
        error::{ApiError, ApiResult},
    },
    management::tags::{invalidate_tags, resolve_manual_tags},
    types::Scope,
    utils::secrets_match,
};

pub const SECRET_HEADER: &str = "x-revalidate-secret";

/// Scope and tags from the request body; anything unreadable means "defaults".
fn parse_request(body: &[u8]) -> (Scope, Vec<String>) {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let scope = Scope::parse_lenient(value.get("scope").and_then(Value::as_str));
    let tags = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    (scope, tags)
}

/// `POST /api/revalidate`
///
/// The secret may come as the `secret` query parameter or the
/// `x-revalidate-secret` header.
pub async fn revalidate(
    Extension(state): Extension<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let Some(secret) = state.settings.revalidate_secret.as_deref() else {
        tracing::error!("manual invalidation requested but no secret is configured");
        return Err(ApiError::Configuration(
            "Server missing REVALIDATE_SECRET".into(),
        ));
    };

    let from_query = params.get("secret").map(String::as_str);
    let from_header = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    let authorized = [from_query, from_header]
        .into_iter()
        .flatten()
        .any(|presented| secrets_match(secret, presented));
    if !authorized {
        tracing::warn!("manual invalidation rejected");
        return Err(ApiError::Unauthorized);
    }

    let (scope, requested) = parse_request(&body);
    let tags = resolve_manual_tags(scope, &requested);
    let purged = invalidate_tags(state.catalog.cache().as_ref(), &tags);
    tracing::info!(?scope, tags = tags.len(), purged, "manual invalidation done");

    Ok(Json(json!({ "revalidated": true, "tags": tags })))
}
