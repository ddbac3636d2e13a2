use axum::{Extension, extract::Query, response::Response};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{
        AppState, cached_json, degraded_json,
        error::{ApiError, ApiResult},
    },
    management::Freshness,
    types::{Book, Scope},
    utils::{is_song_number, strip_document_extension},
};

#[derive(Debug, Deserialize)]
pub struct BookQuery {
    #[serde(rename = "type")]
    pub book: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SongQuery {
    #[serde(rename = "type")]
    pub book: Option<String>,
    pub name: Option<String>,
}

fn require_book(raw: Option<&str>) -> ApiResult<Book> {
    raw.filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query 'type' is required".into()))?
        .parse::<Book>()
        .map_err(|_| ApiError::BadRequest("Param 'type' must be one of: be, bn, kj".into()))
}

/// `GET /api/songs[?type=<book>]`
pub async fn songs(
    Extension(state): Extension<AppState>,
    Query(query): Query<BookQuery>,
) -> Response {
    let scope = Scope::parse_lenient(query.book.as_deref());

    let mut songs = Vec::new();
    for book in scope.books() {
        match state.catalog.list_songs(book).await {
            Ok(listing) => songs.extend(listing),
            Err(e) => {
                tracing::warn!(book = %book, error = %e, "song listing degraded to empty");
                return degraded_json(json!({ "songs": [] }));
            }
        }
    }
    cached_json(Freshness::LISTING, json!({ "songs": songs }))
}

/// `GET /api/titles?type=<book>`
pub async fn titles(
    Extension(state): Extension<AppState>,
    Query(query): Query<BookQuery>,
) -> ApiResult<Response> {
    let book = require_book(query.book.as_deref())?;

    Ok(match state.catalog.list_titles(book).await {
        Ok(titles) => cached_json(Freshness::TITLES, json!({ "titles": titles })),
        Err(e) => {
            tracing::warn!(book = %book, error = %e, "title listing degraded to empty");
            degraded_json(json!({ "titles": [] }))
        }
    })
}

/// `GET /api/song?type=<book>&name=<number>`
pub async fn song(
    Extension(state): Extension<AppState>,
    Query(query): Query<SongQuery>,
) -> ApiResult<Response> {
    let (Some(raw_book), Some(name)) = (
        query.book.as_deref().filter(|v| !v.is_empty()),
        query.name.as_deref().filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Query 'type' and 'name' are required".into(),
        ));
    };
    let book = require_book(Some(raw_book))?;
    if !is_song_number(strip_document_extension(name).unwrap_or(name)) {
        return Err(ApiError::BadRequest(
            "Param 'name' must be a song number".into(),
        ));
    }

    let doc = state.catalog.get_song(book, name).await?;
    Ok(cached_json(Freshness::SONG, json!({ "data": doc })))
}
