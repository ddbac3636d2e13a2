mod common;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header::CACHE_CONTROL},
};
use common::*;
use httpmock::MockServer;
use hymnsync::{
    api::AppState,
    config::Settings,
    github::webhook::sign,
    server::router,
    types::Book,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    fn cache_control(&self) -> &str {
        self.headers
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Response {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn app_with(settings: Settings) -> (Router, AppState) {
    let state = AppState::with_catalog(catalog_with(settings.store.clone()), settings);
    (router(state.clone()), state)
}

fn app(server: &MockServer) -> (Router, AppState) {
    app_with(settings(server))
}

fn webhook_request(event: Option<&str>, signature: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post("/api/webhooks/github").header("content-type", "application/json");
    if let Some(event) = event {
        builder = builder.header("x-github-event", event);
    }
    if let Some(signature) = signature {
        builder = builder.header("x-hub-signature-256", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);

    let res = get(&app, "/health").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["books"], json!(["be", "bn", "kj"]));
}

#[tokio::test]
async fn test_song_requires_type_and_name() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);

    let res = get(&app, "/api/song?type=be").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["message"].as_str().unwrap().contains("required"));

    let res = get(&app, "/api/song?type=xx&name=1").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["message"].as_str().unwrap().contains("be, bn, kj"));
}

#[tokio::test]
async fn test_song_rejects_names_that_leave_the_book() {
    let server = MockServer::start_async().await;
    let upstream = server
        .mock_async(|when, then| {
            when.path_contains("secret");
            then.status(500).body("private upstream body");
        })
        .await;
    let (app, _) = app(&server);

    for name in ["..%2F..%2F..%2Fsecret", "secret%3Fref%3Dmain", "secret%23x", "%20%20"] {
        let res = get(&app, &format!("/api/song?type=be&name={}", name)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{name}");
        assert_eq!(res.json()["message"], "Param 'name' must be a song number");
        assert!(!String::from_utf8_lossy(&res.body).contains("private"));
    }
    assert_eq!(upstream.hits_async().await, 0);
}

#[tokio::test]
async fn test_song_found_missing_and_failing() {
    let server = MockServer::start_async().await;
    mock_song(&server, "be/57.json", song_doc("BE 57 Debata", &["line"])).await;
    mock_status(&server, "be/58.json", 404).await;
    mock_status(&server, "be/59.json", 500).await;
    let (app, _) = app(&server);

    let res = get(&app, "/api/song?type=BE&name=57").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.cache_control(),
        "public, s-maxage=900, stale-while-revalidate=900"
    );
    let body = res.json();
    assert_eq!(body["data"]["judul"], "BE 57 Debata");
    assert_eq!(body["data"]["bait"][1]["type"], "reff");

    let res = get(&app, "/api/song?type=be&name=58.json").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["message"], "Not Found");

    let res = get(&app, "/api/song?type=be&name=59").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.json()["details"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_song_without_token_is_configuration_error() {
    let server = MockServer::start_async().await;
    let mut settings = settings(&server);
    settings.store.token = None;
    let (app, _) = app_with(settings);

    let res = get(&app, "/api/song?type=be&name=1").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["message"], "GITHUB_TOKEN is missing");
}

#[tokio::test]
async fn test_songs_listing_and_degraded_listing() {
    let server = MockServer::start_async().await;
    mock_listing(&server, Book::Kj, &["3", "1"]).await;
    let (app, _) = app(&server);

    let res = get(&app, "/api/songs?type=kj").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.cache_control(),
        "public, s-maxage=900, stale-while-revalidate=86400"
    );
    let songs = res.json()["songs"].clone();
    assert_eq!(songs.as_array().unwrap().len(), 2);
    assert_eq!(songs[0], json!({ "type": "kj", "name": "3", "path": "kj/3.json" }));

    // be and bn are not mocked: the whole listing degrades
    let res = get(&app, "/api/songs").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.cache_control(), "no-store");
    assert_eq!(res.json(), json!({ "songs": [] }));
}

#[tokio::test]
async fn test_titles_endpoint() {
    let server = MockServer::start_async().await;
    mock_listing(&server, Book::Bn, &["10", "2"]).await;
    mock_song(&server, "bn/10.json", song_doc("BN 10 Sampulu", &["x"])).await;
    mock_song(&server, "bn/2.json", song_doc("BN 2 Dua", &["x"])).await;
    mock_status(&server, "kj", 503).await;
    let (app, _) = app(&server);

    let res = get(&app, "/api/titles").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = get(&app, "/api/titles?type=bn").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json()["titles"],
        json!([
            { "type": "bn", "name": "2", "title": "2 Dua" },
            { "type": "bn", "name": "10", "title": "10 Sampulu" }
        ])
    );

    let res = get(&app, "/api/titles?type=kj").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.cache_control(), "no-store");
    assert_eq!(res.json(), json!({ "titles": [] }));
}

#[tokio::test]
async fn test_search_and_suggest_endpoints() {
    let server = MockServer::start_async().await;
    mock_listing(&server, Book::Be, &["57"]).await;
    mock_listing(&server, Book::Bn, &[]).await;
    mock_listing(&server, Book::Kj, &[]).await;
    mock_song(&server, "be/57.json", song_doc("BE 57 Debata", &["Pujion ma Debata"])).await;
    let (app, _) = app(&server);

    let res = get(&app, "/api/search?q=").await;
    assert_eq!(res.json(), json!({ "results": [] }));

    let res = get(&app, "/api/search?q=pujion&type=be").await;
    let results = res.json()["results"].clone();
    assert_eq!(results[0]["type"], "be");
    assert_eq!(results[0]["name"], "57");
    assert_eq!(results[0]["title"], "57 Debata");
    assert!(results[0]["snippet"].as_str().unwrap().contains("Pujion"));

    let res = get(&app, "/api/search/suggest?q=be%2057").await;
    let body = res.json();
    assert_eq!(body[0], "be 57");
    assert_eq!(body[1][0], "Open BE 57");
    assert_eq!(body[3][0], "/songs/be/57");
}

#[tokio::test]
async fn test_revalidate_requires_configured_secret() {
    let server = MockServer::start_async().await;
    let mut settings = settings(&server);
    settings.revalidate_secret = None;
    let (app, _) = app_with(settings);

    let res = send(
        &app,
        Request::post("/api/revalidate?secret=CHANGE_ME").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["message"], "Server missing REVALIDATE_SECRET");
}

#[tokio::test]
async fn test_revalidate_rejects_wrong_secret() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);

    let res = send(
        &app,
        Request::post("/api/revalidate?secret=nope")
            .header("x-revalidate-secret", "also-wrong")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({ "message": "Unauthorized" }));
}

#[tokio::test]
async fn test_revalidate_defaults_and_purges() {
    let server = MockServer::start_async().await;
    let listing = mock_listing(&server, Book::Be, &["1"]).await;
    let (app, state) = app(&server);

    get(&app, "/api/songs?type=be").await;
    get(&app, "/api/songs?type=be").await;
    assert_eq!(listing.hits_async().await, 1);
    assert!(state.catalog.cache().contains("songs/be"));

    let res = send(
        &app,
        Request::post("/api/revalidate?secret=reval-secret").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["revalidated"], true);
    assert_eq!(body["tags"].as_array().unwrap().len(), 12);
    assert_eq!(body["tags"][0], "songs");
    assert_eq!(body["tags"][3], "songs:kj");
    assert!(!state.catalog.cache().contains("songs/be"));

    get(&app, "/api/songs?type=be").await;
    assert_eq!(listing.hits_async().await, 2);
}

#[tokio::test]
async fn test_revalidate_with_header_secret_and_body() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);

    let res = send(
        &app,
        Request::post("/api/revalidate")
            .header("x-revalidate-secret", "reval-secret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"scope":"bn","tags":["titles"]}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["tags"], json!(["titles", "titles:bn"]));
}

#[tokio::test]
async fn test_webhook_requires_configured_secret() {
    let server = MockServer::start_async().await;
    let mut settings = settings(&server);
    settings.webhook_secret = None;
    let (app, _) = app_with(settings);

    let res = send(&app, webhook_request(Some("ping"), None, "{}")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["message"], "Server missing GITHUB_WEBHOOK_SECRET");
}

#[tokio::test]
async fn test_webhook_ping_and_ignored_events() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);

    let res = send(&app, webhook_request(Some("ping"), None, "{}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "pong": true }));

    let sig = sign("hook-secret", b"{}");
    let res = send(&app, webhook_request(Some("issues"), Some(&sig), "{}")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "ignored": true, "event": "issues" }));
}

#[tokio::test]
async fn test_webhook_rejects_missing_or_bad_signature() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);
    let body = r#"{"commits":[{"added":["be/1.json"]}]}"#;

    let res = send(&app, webhook_request(Some("push"), None, body)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, webhook_request(None, Some(&sign("hook-secret", body.as_bytes())), body)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let mut tampered = sign("hook-secret", body.as_bytes());
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'f' { 'e' } else { 'f' });
    let res = send(&app, webhook_request(Some("push"), Some(&tampered), body)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_rejects_unparsable_payload() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);
    let body = "{ not json";

    let sig = sign("hook-secret", body.as_bytes());
    let res = send(&app, webhook_request(Some("push"), Some(&sig), body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_push_invalidates_touched_books() {
    let server = MockServer::start_async().await;
    mock_listing(&server, Book::Be, &["1"]).await;
    mock_listing(&server, Book::Bn, &["2"]).await;
    mock_song(&server, "be/1.json", song_doc("BE 1 Satu", &["x"])).await;
    let (app, state) = app(&server);

    get(&app, "/api/songs?type=be").await;
    get(&app, "/api/songs?type=bn").await;
    get(&app, "/api/song?type=be&name=1").await;
    assert!(state.catalog.cache().contains("song/be/1"));

    let body = json!({
        "ref": "refs/heads/main",
        "repository": { "full_name": "owner/hymns" },
        "commits": [{ "added": [], "modified": ["be/1.json"], "removed": [] }]
    })
    .to_string();
    let sig = sign("hook-secret", body.as_bytes());
    let res = send(&app, webhook_request(Some("push"), Some(&sig), &body)).await;

    assert_eq!(res.status, StatusCode::OK);
    let out = res.json();
    assert_eq!(out["ok"], true);
    assert_eq!(out["repository"], "owner/hymns");
    assert_eq!(out["ref"], "refs/heads/main");
    assert_eq!(
        out["tags"],
        json!(["songs", "songs:be", "titles", "titles:be", "content", "content:be", "song", "song:be:1"])
    );

    let cache = state.catalog.cache();
    assert!(!cache.contains("songs/be"));
    assert!(!cache.contains("song/be/1"));
    // "songs" was dispatched too, and the bn listing carries it
    assert!(!cache.contains("songs/bn"));
}

#[tokio::test]
async fn test_webhook_push_outside_books_uses_coarse_tags() {
    let server = MockServer::start_async().await;
    let (app, _) = app(&server);

    let body = json!({ "commits": [{ "modified": ["README.md"] }] }).to_string();
    let sig = sign("hook-secret", body.as_bytes());
    let res = send(&app, webhook_request(Some("push"), Some(&sig), &body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["tags"], json!(["songs", "titles", "content"]));
    assert_eq!(res.json()["repository"], Value::Null);
}

#[tokio::test]
async fn test_sitemap_lists_books_and_songs() {
    let server = MockServer::start_async().await;
    mock_listing(&server, Book::Be, &["1", "2"]).await;
    mock_status(&server, "bn", 500).await;
    mock_listing(&server, Book::Kj, &[]).await;
    let (app, _) = app(&server);

    let res = get(&app, "/sitemap.xml").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.headers.get("content-type").unwrap().to_str().unwrap(),
        "application/xml"
    );
    let xml = String::from_utf8(res.body).unwrap();
    assert!(xml.contains("<loc>https://hymns.example/</loc>"));
    assert!(xml.contains("<loc>https://hymns.example/songs/bn</loc>"));
    assert!(xml.contains("<loc>https://hymns.example/songs/be/2</loc>"));
    assert_eq!(xml.matches("<url>").count(), 1 + 3 + 2);
}
