//! # API Module
//!
//! HTTP endpoints of the hymnal service. Handlers are thin: they parse the
//! request, call into [`crate::management::Catalog`] or [`crate::search`], and
//! pick the response policy.
//!
//! ## Endpoints
//!
//! ### Content (read-only)
//!
//! - [`songs`] - `GET /api/songs[?type=<book>]`
//! - [`titles`] - `GET /api/titles?type=<book>`
//! - [`song`] - `GET /api/song?type=<book>&name=<number>`
//! - [`search`] - `GET /api/search?q=<text>[&type=<book>]`
//! - [`suggest`] - `GET /api/search/suggest?q=<text>`
//! - [`sitemap`] - `GET /sitemap.xml`
//!
//! ### Invalidation
//!
//! - [`revalidate`] - `POST /api/revalidate`, gated by a shared secret
//! - [`github_webhook`] - `POST /api/webhooks/github`, gated by an HMAC signature
//!
//! ### Monitoring
//!
//! - [`health`] - status and version
//!
//! ## Response policy
//!
//! Listings, search and suggestions favor availability: when the backing store
//! fails they answer `200` with an empty result and `Cache-Control: no-store`
//! so the client retries soon. The single-song and invalidation endpoints
//! report failures through [`ApiError`]. Successful content responses carry
//! the freshness window of their cache entry as `Cache-Control`.

mod content;
mod error;
mod health;
mod revalidate;
mod search;
mod sitemap;
mod state;
mod webhook;

use axum::{
    Json,
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub use content::{song, songs, titles};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use health::health;
pub use revalidate::{SECRET_HEADER, revalidate};
pub use search::{search, suggest};
pub use sitemap::sitemap;
pub use state::AppState;
pub use webhook::github_webhook;

use crate::management::{Freshness, NO_STORE};

pub(crate) fn cached_json<T: Serialize>(freshness: Freshness, body: T) -> Response {
    ([(CACHE_CONTROL, freshness.cache_control())], Json(body)).into_response()
}

pub(crate) fn degraded_json<T: Serialize>(body: T) -> Response {
    ([(CACHE_CONTROL, NO_STORE)], Json(body)).into_response()
}
