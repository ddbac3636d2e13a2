use axum::{Extension, Json, body::Bytes, http::HeaderMap};
use serde_json::{Value, json};

use crate::{
    api::{
        AppState,
        error::{ApiError, ApiResult},
    },
    github::webhook::{EVENT_HEADER, PushPayload, SIGNATURE_HEADER, verify_signature},
    management::tags::{invalidate_tags, resolve_push_tags},
};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `POST /api/webhooks/github`
pub async fn github_webhook(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let Some(secret) = state.settings.webhook_secret.as_deref() else {
        tracing::error!("webhook received but no webhook secret is configured");
        return Err(ApiError::Configuration(
            "Server missing GITHUB_WEBHOOK_SECRET".into(),
        ));
    };

    let event = header(&headers, EVENT_HEADER);
    if event == Some("ping") {
        return Ok(Json(json!({ "pong": true })));
    }

    let (Some(event), Some(signature)) = (event, header(&headers, SIGNATURE_HEADER)) else {
        tracing::warn!("webhook without event or signature header");
        return Err(ApiError::Unauthorized);
    };
    if event != "push" {
        tracing::debug!(event, "ignoring webhook event");
        return Ok(Json(json!({ "ignored": true, "event": event })));
    }

    if !verify_signature(secret, &body, signature) {
        tracing::warn!("webhook signature mismatch");
        return Err(ApiError::Unauthorized);
    }

    let payload: PushPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid push payload: {}", e)))?;
    let tags = resolve_push_tags(payload.changed_paths());
    let purged = invalidate_tags(state.catalog.cache().as_ref(), &tags);
    tracing::info!(
        repository = payload.repository_name().unwrap_or("-"),
        tags = tags.len(),
        purged,
        "push invalidation done"
    );

    Ok(Json(json!({
        "ok": true,
        "tags": tags,
        "repository": payload.repository_name(),
        "ref": payload.git_ref,
    })))
}
