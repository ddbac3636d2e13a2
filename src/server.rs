use std::{net::SocketAddr, str::FromStr};

use axum::{
    Extension, Router,
    routing::{get, post},
};

use crate::{Error, api, api::AppState, config::Settings, error::Result};

/// Every route of the service, with `state` attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/sitemap.xml", get(api::sitemap))
        .route("/api/songs", get(api::songs))
        .route("/api/titles", get(api::titles))
        .route("/api/song", get(api::song))
        .route("/api/search", get(api::search))
        .route("/api/search/suggest", get(api::suggest))
        .route("/api/revalidate", post(api::revalidate))
        .route("/api/webhooks/github", post(api::github_webhook))
        .layer(Extension(state))
}

pub async fn start_api_server(settings: Settings) -> Result<()> {
    let addr = SocketAddr::from_str(&settings.server_addr).map_err(|e| {
        Error::Configuration(format!(
            "invalid SERVER_ADDRESS '{}': {}",
            settings.server_addr, e
        ))
    })?;

    if settings.store.token.is_none() {
        tracing::error!("GITHUB_TOKEN is missing; content endpoints will degrade");
    }
    if settings.revalidate_secret.is_none() {
        tracing::warn!("REVALIDATE_SECRET is not configured; /api/revalidate is disabled");
    }
    if settings.webhook_secret.is_none() {
        tracing::warn!("GITHUB_WEBHOOK_SECRET is not configured; /api/webhooks/github is disabled");
    }

    let app = router(AppState::new(settings)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
